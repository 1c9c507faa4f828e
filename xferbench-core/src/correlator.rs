// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Correlation of sender-side and receiver-side event records.
//!
//! MQTT publisher and subscriber run as separate processes, so each transfer
//! is observed twice and the two observations are joined on
//! `(seq_id, file_name)`. CoAP and HTTP clients observe the full round trip
//! on their own and pass straight through.
//!
//! # End-to-end MQTT latency is an approximation
//!
//! The MQTT end-to-end duration is the subscriber's local receive timestamp
//! minus the publisher's local publish timestamp. The two values come from
//! different monotonic clocks with no offset correction. The result is only
//! meaningful when both processes share a host clock, and it can be negative
//! otherwise. It is reported as-is; clock alignment is not attempted.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::loader::EventStore;
use crate::record::{meta_to_json, EventRecord};
use crate::types::{Protocol, Role, SeqId};

/// Lower bound on a transfer duration in seconds when computing throughput.
pub const THROUGHPUT_EPSILON_S: f64 = 1e-9;

/// Throughput in bits per second for `payload_bytes` moved in `duration_ms`.
pub fn throughput_bps(payload_bytes: u64, duration_ms: f64) -> f64 {
    let seconds = (duration_ms / 1000.0).max(THROUGHPUT_EPSILON_S);
    payload_bytes as f64 * 8.0 / seconds
}

/// Wire bytes per payload byte; undefined for an empty payload.
pub fn overhead_ratio(overhead_bytes: u64, payload_bytes: u64) -> Option<f64> {
    (payload_bytes > 0).then(|| overhead_bytes as f64 / payload_bytes as f64)
}

/// One transfer attempt with its derived end-to-end metrics.
///
/// Sender fields always come from the initiating side. Receiver fields are
/// only populated for joined protocols.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferEvent {
    pub protocol: Protocol,
    /// Role of the initiating side.
    pub role: Role,
    pub file_name: String,
    pub seq_id: SeqId,
    pub iteration: u32,
    pub qos_or_mode: String,
    pub file_size_bytes: u64,
    pub receiver_file_size_bytes: Option<u64>,
    pub t_start_ns: i64,
    pub t_end_ns: i64,
    pub receiver_t_ns: Option<i64>,
    /// Duration as measured locally by the sender.
    pub sender_duration_ms: f64,
    /// End-to-end duration. Cross-clock for MQTT, see the module docs.
    pub duration_ms: f64,
    /// Wire bytes logged by the sender.
    pub bytes_sent_sender_to_receiver: u64,
    pub receiver_bytes: Option<u64>,
    pub overhead_bytes: u64,
    pub throughput_bps: f64,
    pub overhead_ratio: Option<f64>,
    #[serde(serialize_with = "serialize_meta")]
    pub extra_meta: BTreeMap<String, String>,
    #[serde(serialize_with = "serialize_receiver_meta")]
    pub receiver_extra_meta: Option<BTreeMap<String, String>>,
}

impl TransferEvent {
    /// Column names in serialization order.
    pub const COLUMNS: [&'static str; 20] = [
        "protocol",
        "role",
        "file_name",
        "seq_id",
        "iteration",
        "qos_or_mode",
        "file_size_bytes",
        "receiver_file_size_bytes",
        "t_start_ns",
        "t_end_ns",
        "receiver_t_ns",
        "sender_duration_ms",
        "duration_ms",
        "bytes_sent_sender_to_receiver",
        "receiver_bytes",
        "overhead_bytes",
        "throughput_bps",
        "overhead_ratio",
        "extra_meta",
        "receiver_extra_meta",
    ];

    /// Join a publisher record with its subscriber record.
    pub fn joined(sender: &EventRecord, receiver: &EventRecord) -> Self {
        let duration_ms = (receiver.t_start_ns - sender.t_start_ns) as f64 / 1e6;
        let overhead_bytes =
            sender.bytes_sent_sender_to_receiver + receiver.bytes_sent_sender_to_receiver;

        Self {
            protocol: sender.protocol,
            role: sender.role,
            file_name: sender.file_name.clone(),
            seq_id: sender.seq_id.clone(),
            iteration: sender.iteration,
            qos_or_mode: sender.qos_or_mode.clone(),
            file_size_bytes: sender.file_size_bytes,
            receiver_file_size_bytes: Some(receiver.file_size_bytes),
            t_start_ns: sender.t_start_ns,
            t_end_ns: sender.t_end_ns,
            receiver_t_ns: Some(receiver.t_start_ns),
            sender_duration_ms: sender.duration_ms,
            duration_ms,
            bytes_sent_sender_to_receiver: sender.bytes_sent_sender_to_receiver,
            receiver_bytes: Some(receiver.bytes_sent_sender_to_receiver),
            overhead_bytes,
            throughput_bps: throughput_bps(sender.file_size_bytes, duration_ms),
            overhead_ratio: overhead_ratio(overhead_bytes, sender.file_size_bytes),
            extra_meta: sender.extra_meta.clone(),
            receiver_extra_meta: Some(receiver.extra_meta.clone()),
        }
    }

    /// Wrap a client record that already spans the full round trip.
    pub fn passthrough(record: &EventRecord) -> Self {
        let overhead_bytes = record.bytes_sent_sender_to_receiver;

        Self {
            protocol: record.protocol,
            role: record.role,
            file_name: record.file_name.clone(),
            seq_id: record.seq_id.clone(),
            iteration: record.iteration,
            qos_or_mode: record.qos_or_mode.clone(),
            file_size_bytes: record.file_size_bytes,
            receiver_file_size_bytes: None,
            t_start_ns: record.t_start_ns,
            t_end_ns: record.t_end_ns,
            receiver_t_ns: None,
            sender_duration_ms: record.duration_ms,
            duration_ms: record.duration_ms,
            bytes_sent_sender_to_receiver: overhead_bytes,
            receiver_bytes: None,
            overhead_bytes,
            throughput_bps: throughput_bps(record.file_size_bytes, record.duration_ms),
            overhead_ratio: overhead_ratio(overhead_bytes, record.file_size_bytes),
            extra_meta: record.extra_meta.clone(),
            receiver_extra_meta: None,
        }
    }
}

fn serialize_meta<S: Serializer>(meta: &BTreeMap<String, String>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&meta_to_json(meta))
}

fn serialize_receiver_meta<S: Serializer>(
    meta: &Option<BTreeMap<String, String>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    match meta {
        Some(meta) => s.serialize_some(&meta_to_json(meta)),
        None => s.serialize_none(),
    }
}

/// Delivery accounting for one protocol's correlation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    pub sender_records: usize,
    pub receiver_records: usize,
    pub sender_duplicates: usize,
    pub receiver_duplicates: usize,
    pub matched: usize,
    /// Sent but never observed by the receiver.
    pub unmatched_sender: usize,
    /// Received with no corresponding sender record.
    pub orphan_receiver: usize,
}

impl DeliveryStats {
    /// Sent transfers after dropping duplicate sender rows.
    pub fn distinct_senders(&self) -> usize {
        self.sender_records - self.sender_duplicates
    }

    /// Share of distinct sent transfers that were matched.
    pub fn delivery_ratio(&self) -> Option<f64> {
        let sent = self.distinct_senders();
        (sent > 0).then(|| self.matched as f64 / sent as f64)
    }
}

/// Correlated events for one protocol.
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub protocol: Protocol,
    pub events: Vec<TransferEvent>,
    pub delivery: DeliveryStats,
}

/// Stateless correlator over an [`EventStore`] snapshot.
pub struct Correlator;

impl Correlator {
    /// Correlate all records of one protocol.
    pub fn correlate(store: &EventStore, protocol: Protocol) -> Correlation {
        let senders = store.table(protocol, protocol.sender_role());
        let receivers = store.table(protocol, protocol.receiver_role());

        let correlation = if protocol.requires_join() {
            Self::join(protocol, senders, receivers)
        } else {
            Self::passthrough(protocol, senders, receivers)
        };

        debug!(
            protocol = %protocol,
            events = correlation.events.len(),
            unmatched = correlation.delivery.unmatched_sender,
            "Correlated transfers"
        );

        correlation
    }

    /// Inner join on `(seq_id, file_name)`, first record per key wins.
    pub fn join(
        protocol: Protocol,
        senders: &[EventRecord],
        receivers: &[EventRecord],
    ) -> Correlation {
        let mut delivery = DeliveryStats {
            sender_records: senders.len(),
            receiver_records: receivers.len(),
            ..DeliveryStats::default()
        };

        let mut by_key: HashMap<(&SeqId, &str), &EventRecord> =
            HashMap::with_capacity(receivers.len());
        for receiver in receivers {
            if by_key.contains_key(&receiver.join_key()) {
                delivery.receiver_duplicates += 1;
            } else {
                by_key.insert(receiver.join_key(), receiver);
            }
        }

        let mut seen = HashSet::with_capacity(senders.len());
        let mut events = Vec::new();
        for sender in senders {
            let key = sender.join_key();
            if !seen.insert(key) {
                delivery.sender_duplicates += 1;
                continue;
            }

            match by_key.get(&key) {
                Some(receiver) => events.push(TransferEvent::joined(sender, receiver)),
                None => delivery.unmatched_sender += 1,
            }
        }

        delivery.matched = events.len();
        delivery.orphan_receiver = by_key.keys().filter(|k| !seen.contains(*k)).count();

        Correlation {
            protocol,
            events,
            delivery,
        }
    }

    /// Client records as-is; server records only feed the delivery counts.
    pub fn passthrough(
        protocol: Protocol,
        clients: &[EventRecord],
        servers: &[EventRecord],
    ) -> Correlation {
        let events: Vec<TransferEvent> = clients.iter().map(TransferEvent::passthrough).collect();

        Correlation {
            protocol,
            delivery: DeliveryStats {
                sender_records: clients.len(),
                receiver_records: servers.len(),
                matched: events.len(),
                ..DeliveryStats::default()
            },
            events,
        }
    }
}
