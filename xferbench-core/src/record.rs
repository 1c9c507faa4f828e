// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Event record data model.
//!
//! One [`EventRecord`] is one transfer attempt as seen by one role. Records
//! are created once by a producer, appended to that producer's log and never
//! mutated afterwards.
//!
//! Timestamps are local monotonic nanoseconds of the recording process.
//! Two records from different processes must not be subtracted, with the one
//! documented exception in [`crate::correlator`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::RecordError;
use crate::types::{Protocol, Role, SeqId};
use crate::wire;

/// Columns every event log must carry, in canonical order.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "protocol",
    "role",
    "file_name",
    "file_size_bytes",
    "iteration",
    "seq_id",
    "qos_or_mode",
    "t_start_ns",
    "t_end_ns",
    "duration_ms",
    "bytes_sent_sender_to_receiver",
];

/// Name of the optional metadata column written by this crate.
pub const EXTRA_META_COLUMN: &str = "extra_meta";

/// Legacy name of the metadata column, still accepted on input.
pub const EXTRA_META_LEGACY_COLUMN: &str = "extra_meta_json";

/// Metadata key under which MQTT producers store the full topic.
pub const TOPIC_META_KEY: &str = "topic";

/// One normalized observation of a single transfer attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub protocol: Protocol,
    pub role: Role,
    pub file_name: String,
    pub file_size_bytes: u64,
    /// 1-based repetition index, 0 when the recording side cannot know it.
    pub iteration: u32,
    pub seq_id: SeqId,
    pub qos_or_mode: String,
    pub t_start_ns: i64,
    pub t_end_ns: i64,
    pub duration_ms: f64,
    pub bytes_sent_sender_to_receiver: u64,
    #[serde(default)]
    pub extra_meta: BTreeMap<String, String>,
}

impl EventRecord {
    /// Join key used by the correlator.
    pub fn join_key(&self) -> (&SeqId, &str) {
        (&self.seq_id, self.file_name.as_str())
    }

    /// `extra_meta` as the compact JSON object written to logs.
    pub fn extra_meta_json(&self) -> String {
        meta_to_json(&self.extra_meta)
    }
}

/// Encode a metadata map as a compact JSON object.
pub fn meta_to_json(meta: &BTreeMap<String, String>) -> String {
    serde_json::to_string(meta).unwrap_or_else(|_| "{}".to_string())
}

/// Row shape as it appears on disk, before validation.
#[derive(Debug, Deserialize)]
pub(crate) struct RawEventRow {
    protocol: String,
    role: String,
    #[serde(default)]
    file_name: String,
    file_size_bytes: u64,
    iteration: u32,
    #[serde(default)]
    seq_id: String,
    qos_or_mode: String,
    t_start_ns: i64,
    t_end_ns: i64,
    duration_ms: f64,
    bytes_sent_sender_to_receiver: u64,
    #[serde(default, alias = "extra_meta_json")]
    extra_meta: String,
}

impl TryFrom<RawEventRow> for EventRecord {
    type Error = RecordError;

    fn try_from(raw: RawEventRow) -> Result<Self, Self::Error> {
        let protocol: Protocol = raw.protocol.parse()?;
        let role: Role = raw.role.parse()?;
        let extra_meta = parse_extra_meta(&raw.extra_meta)?;

        if !raw.duration_ms.is_finite() {
            return Err(RecordError::InvalidField {
                field: "duration_ms",
                value: raw.duration_ms.to_string(),
                reason: "Duration must be a finite number".to_string(),
            });
        }

        // Subscribers that lost the identifier cells can still be matched
        // through the topic they received on.
        let (file_name, seq_id) = if raw.file_name.is_empty() || raw.seq_id.is_empty() {
            recover_from_topic(protocol, &extra_meta, raw.file_name, raw.seq_id)?
        } else {
            (raw.file_name, SeqId::new(raw.seq_id)?)
        };

        Ok(Self {
            protocol,
            role,
            file_name,
            file_size_bytes: raw.file_size_bytes,
            iteration: raw.iteration,
            seq_id,
            qos_or_mode: raw.qos_or_mode,
            t_start_ns: raw.t_start_ns,
            t_end_ns: raw.t_end_ns,
            duration_ms: raw.duration_ms,
            bytes_sent_sender_to_receiver: raw.bytes_sent_sender_to_receiver,
            extra_meta,
        })
    }
}

fn parse_extra_meta(raw: &str) -> Result<BTreeMap<String, String>, RecordError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(BTreeMap::new());
    }

    serde_json::from_str(raw).map_err(|e| RecordError::InvalidField {
        field: "extra_meta",
        value: raw.to_string(),
        reason: format!("Expected a flat JSON object of strings: {}", e),
    })
}

fn recover_from_topic(
    protocol: Protocol,
    extra_meta: &BTreeMap<String, String>,
    file_name: String,
    seq_id: String,
) -> Result<(String, SeqId), RecordError> {
    let raw_topic = match protocol {
        Protocol::Mqtt => extra_meta.get(TOPIC_META_KEY),
        _ => None,
    };
    let topic = raw_topic.and_then(|t| wire::parse_transfer_topic(t));

    let Some(topic) = topic else {
        let field = if file_name.is_empty() { "file_name" } else { "seq_id" };
        return Err(RecordError::InvalidField {
            field,
            value: String::new(),
            reason: "Field is empty and no transfer topic is available to recover it".to_string(),
        });
    };

    if !topic.is_canonical() {
        debug!(topic = ?raw_topic, "Recovering identifiers from non-canonical topic");
    }

    let file_name = if file_name.is_empty() {
        topic.file_name
    } else {
        file_name
    };
    let seq_id = if seq_id.is_empty() {
        topic.seq_id
    } else {
        SeqId::new(seq_id)?
    };

    Ok((file_name, seq_id))
}
