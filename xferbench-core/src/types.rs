// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Newtype wrappers and closed enums for event log fields.
//!
//! Every value read from a log is validated once, at the edge, so the
//! correlator and aggregator never deal with stringly-typed columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordError;

/// Transport protocol under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Mqtt,
    Coap,
    Http,
}

impl Protocol {
    /// All protocols, in report order.
    pub const ALL: [Protocol; 3] = [Protocol::Mqtt, Protocol::Coap, Protocol::Http];

    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Mqtt => "mqtt",
            Protocol::Coap => "coap",
            Protocol::Http => "http",
        }
    }

    /// MQTT is the only protocol whose sender and receiver are separate
    /// processes that must be joined by identifier.
    pub fn requires_join(&self) -> bool {
        matches!(self, Protocol::Mqtt)
    }

    /// Role that mints `seq_id` and starts the transfer.
    pub fn sender_role(&self) -> Role {
        match self {
            Protocol::Mqtt => Role::Publisher,
            Protocol::Coap | Protocol::Http => Role::Client,
        }
    }

    /// Role on the far side of the transfer.
    pub fn receiver_role(&self) -> Role {
        match self {
            Protocol::Mqtt => Role::Subscriber,
            Protocol::Coap | Protocol::Http => Role::Server,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mqtt" => Ok(Protocol::Mqtt),
            "coap" => Ok(Protocol::Coap),
            "http" => Ok(Protocol::Http),
            _ => Err(RecordError::InvalidField {
                field: "protocol",
                value: s.to_string(),
                reason: "Expected one of mqtt, coap, http".to_string(),
            }),
        }
    }
}

/// Viewpoint from which an event was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Publisher,
    Subscriber,
    Client,
    Server,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Publisher => "publisher",
            Role::Subscriber => "subscriber",
            Role::Client => "client",
            Role::Server => "server",
        }
    }

    /// Infer the role from a log file stem such as `publisher_qos1`.
    pub fn from_file_stem(stem: &str) -> Option<Self> {
        stem.split(['_', '-', '.'])
            .next()
            .and_then(|head| head.parse().ok())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "publisher" => Ok(Role::Publisher),
            "subscriber" => Ok(Role::Subscriber),
            "client" => Ok(Role::Client),
            "server" => Ok(Role::Server),
            _ => Err(RecordError::InvalidField {
                field: "role",
                value: s.to_string(),
                reason: "Expected one of publisher, subscriber, client, server".to_string(),
            }),
        }
    }
}

/// Correlation key minted by the initiating side of a transfer.
/// Must be non-empty and free of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SeqId(String);

impl SeqId {
    /// Create a new SeqId with validation.
    pub fn new(id: impl Into<String>) -> Result<Self, RecordError> {
        let id = id.into();

        if id.is_empty() {
            return Err(RecordError::InvalidField {
                field: "seq_id",
                value: id,
                reason: "Sequence ID cannot be empty".to_string(),
            });
        }

        if id.trim() != id {
            return Err(RecordError::InvalidField {
                field: "seq_id",
                value: id,
                reason: "Sequence ID cannot carry surrounding whitespace".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Mint a fresh identifier the way senders do (random UUID v4).
    pub fn mint() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Whether the identifier is a canonical hyphenated UUID.
    pub fn is_uuid(&self) -> bool {
        self.0.len() == 36 && Uuid::parse_str(&self.0).is_ok()
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SeqId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for SeqId {
    type Error = RecordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SeqId> for String {
    fn from(id: SeqId) -> Self {
        id.0
    }
}
