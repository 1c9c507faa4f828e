// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! File reporters for correlation runs.
//!
//! [`CsvReporter`] writes one events table and one summary table per
//! protocol. [`JsonReporter`] saves the whole [`RunReport`] as a timestamped
//! JSON document for later comparison.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use xferbench_core::config::validate_prefix;
use xferbench_core::{ConfigError, Protocol, SummaryRow, TableSink, TransferEvent};

use crate::metrics::RunReport;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("Failed to write report file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid report prefix: {0}")]
    Prefix(#[from] ConfigError),

    #[error("Failed to write workbook: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

/// Encode rows as CSV with an explicit header, so empty tables keep their
/// columns.
pub fn encode_table<T: Serialize>(columns: &[&str], rows: &[T]) -> Result<Vec<u8>, ReporterError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(columns)?;
    for row in rows {
        writer.serialize(row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ReporterError::Io(e.into_error()))
}

/// CRC32 of a summary table in its CSV encoding.
pub fn summary_fingerprint(summary: &[SummaryRow]) -> Result<u32, ReporterError> {
    let bytes = encode_table(&SummaryRow::COLUMNS, summary)?;
    Ok(crc32fast::hash(&bytes))
}

/// Delimited-file sink: `<dir>/<prefix>_<protocol>_{events,summary}.csv`.
pub struct CsvReporter {
    output_dir: PathBuf,
    prefix: String,
    written: Vec<PathBuf>,
}

impl CsvReporter {
    /// Create a reporter writing into `output_dir`.
    pub fn new(output_dir: impl AsRef<Path>, prefix: impl Into<String>) -> Result<Self, ReporterError> {
        let prefix = prefix.into();
        validate_prefix(&prefix)?;

        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            output_dir,
            prefix,
            written: Vec::new(),
        })
    }

    /// Path of one table for one protocol.
    pub fn table_path(&self, protocol: Protocol, table: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}_{}.csv", self.prefix, protocol, table))
    }

    /// Files written so far, in write order.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    fn write_table(&mut self, path: PathBuf, bytes: Vec<u8>) -> Result<(), ReporterError> {
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), "Wrote table");
        self.written.push(path);
        Ok(())
    }
}

impl TableSink for CsvReporter {
    type Error = ReporterError;

    fn write_events(
        &mut self,
        protocol: Protocol,
        events: &[TransferEvent],
    ) -> Result<(), Self::Error> {
        let bytes = encode_table(&TransferEvent::COLUMNS, events)?;
        let path = self.table_path(protocol, "events");
        self.write_table(path, bytes)
    }

    fn write_summary(
        &mut self,
        protocol: Protocol,
        summary: &[SummaryRow],
    ) -> Result<(), Self::Error> {
        let bytes = encode_table(&SummaryRow::COLUMNS, summary)?;
        let path = self.table_path(protocol, "summary");
        self.write_table(path, bytes)
    }
}

/// JSON reporter for run reports.
pub struct JsonReporter {
    /// Output directory for report files
    output_dir: PathBuf,
}

impl JsonReporter {
    /// Create a new JSON reporter with the specified output directory.
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self, ReporterError> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Save a run report as `<prefix>_report_<timestamp>.json`.
    ///
    /// Returns the path to the created file.
    pub fn save(&self, prefix: &str, report: &RunReport) -> Result<PathBuf, ReporterError> {
        validate_prefix(prefix)?;

        let timestamp = report.timestamp.format("%Y-%m-%dT%H-%M-%SZ");
        let filename = format!("{}_report_{}.json", prefix, timestamp);
        let filepath = self.output_dir.join(&filename);

        let file = File::create(&filepath)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, report)?;

        Ok(filepath)
    }

    /// Load an existing run report from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<RunReport, ReporterError> {
        let file = File::open(path)?;
        let report = serde_json::from_reader(file)?;
        Ok(report)
    }
}
