// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Transport addressing and wire-size helpers shared with the producers.
//!
//! Publishers encode `<prefix>/<file_name>/<seq_id>` into the MQTT topic and
//! subscribers recover the identifier from it. The same module estimates the
//! on-wire size of a PUBLISH packet, which producers log as
//! `bytes_sent_sender_to_receiver`.

use crate::types::SeqId;

/// Addressing recovered from an MQTT transfer topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferTopic {
    pub prefix: String,
    pub file_name: String,
    pub seq_id: SeqId,
}

/// Build the topic a publisher uses for one transfer attempt.
pub fn transfer_topic(prefix: &str, file_name: &str, seq_id: &SeqId) -> String {
    format!("{}/{}/{}", prefix.trim_end_matches('/'), file_name, seq_id)
}

impl TransferTopic {
    /// Whether the topic has the form publishers emit: a non-empty prefix
    /// and a UUID identifier.
    pub fn is_canonical(&self) -> bool {
        !self.prefix.is_empty() && self.seq_id.is_uuid()
    }
}

/// Recover `(prefix, file_name, seq_id)` from a transfer topic.
///
/// The last segment is the identifier and the one before it the file name.
/// Topics with fewer than three segments carry no transfer addressing. The
/// prefix may be empty, as in `/f_100B.bin/A`.
pub fn parse_transfer_topic(topic: &str) -> Option<TransferTopic> {
    let mut parts = topic.rsplitn(3, '/');
    let seq = parts.next()?;
    let file_name = parts.next()?;
    let prefix = parts.next()?;

    if file_name.is_empty() {
        return None;
    }

    Some(TransferTopic {
        prefix: prefix.to_string(),
        file_name: file_name.to_string(),
        seq_id: SeqId::new(seq).ok()?,
    })
}

/// Estimate the MQTT 3.1.1 PUBLISH packet size for one message.
///
/// Fixed header is one control byte plus a 1-4 byte remaining-length varint.
/// Variable header is the length-prefixed topic plus a packet identifier when
/// QoS > 0.
pub fn estimate_mqtt_publish_overhead_bytes(topic: &str, payload_len: u64, qos: u8) -> u64 {
    let packet_id = if qos > 0 { 2 } else { 0 };
    let variable_header = 2 + topic.len() as u64 + packet_id;
    let remaining_len = variable_header + payload_len;

    let rem_len_len = match remaining_len {
        0..=127 => 1,
        128..=16_383 => 2,
        16_384..=2_097_151 => 3,
        _ => 4,
    };

    1 + rem_len_len + variable_header + payload_len
}
