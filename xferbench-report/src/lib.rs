// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! xferbench Report Emitters
//!
//! Turns an [`xferbench_core::Analysis`] into files on disk.
//!
//! # Outputs
//!
//! - **CSV tables**: `<prefix>_<protocol>_events.csv` and
//!   `<prefix>_<protocol>_summary.csv` per protocol, byte-identical across
//!   runs over the same logs
//! - **JSON run report**: timestamped document with system info, load
//!   statistics, delivery counts and summary fingerprints
//! - **Workbook**: `<prefix>.xlsx` with events and summary sheets per protocol

pub mod metrics;
pub mod reporter;
pub mod xlsx;

pub use metrics::{format_bps, format_ms, LoadSummary, ProtocolSection, RunReport, SystemInfo};
pub use reporter::{summary_fingerprint, CsvReporter, JsonReporter, ReporterError};
pub use xlsx::XlsxReporter;
