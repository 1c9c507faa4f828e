// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! xferbench Core Library
//!
//! Offline correlation and aggregation engine for file-transfer benchmark
//! logs recorded by MQTT, CoAP and HTTP producers. Provides the event data
//! model, a tolerant log loader, the sender/receiver correlator, summary
//! aggregation and the sink interface used by report emitters.

pub mod aggregator;
pub mod config;
pub mod correlator;
pub mod error;
pub mod loader;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod types;
pub mod wire;
pub mod writer;

// Re-export commonly used types
pub use aggregator::{AggregationOptions, Aggregator, SummaryRow};
pub use config::{Config, ConfigLoader, OutputConfig};
pub use correlator::{Correlation, Correlator, DeliveryStats, TransferEvent};
pub use error::{ConfigError, LogFileError, RecordError, XferError, XferResult};
pub use loader::{EventLoader, EventStore, LoadReport};
pub use pipeline::{Analysis, ProtocolReport};
pub use record::EventRecord;
pub use sink::{MemorySink, TableSink};
pub use types::{Protocol, Role, SeqId};
pub use writer::EventLogWriter;
