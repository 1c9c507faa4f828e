// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Spreadsheet workbook sink.
//!
//! Writes every table into one `<prefix>.xlsx` workbook with an events and a
//! summary sheet per protocol (`MQTT_Events`, `MQTT_Summary`, ...). Numeric
//! columns become numeric cells; missing values stay empty.

use std::fs;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::Workbook;
use tracing::debug;
use xferbench_core::config::validate_prefix;
use xferbench_core::record::meta_to_json;
use xferbench_core::{Protocol, SummaryRow, TableSink, TransferEvent};

use crate::reporter::ReporterError;

/// One worksheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

fn number(value: f64) -> Cell {
    if value.is_finite() {
        Cell::Number(value)
    } else {
        Cell::Empty
    }
}

fn text(value: impl Into<String>) -> Cell {
    Cell::Text(value.into())
}

fn optional<T>(value: Option<T>, f: impl FnOnce(T) -> Cell) -> Cell {
    value.map(f).unwrap_or(Cell::Empty)
}

/// A table row that can be laid out as worksheet cells.
pub trait SheetRow {
    /// Cells in the same order as the table's column list.
    fn cells(&self) -> Vec<Cell>;
}

impl SheetRow for TransferEvent {
    fn cells(&self) -> Vec<Cell> {
        vec![
            text(self.protocol.as_str()),
            text(self.role.as_str()),
            text(self.file_name.as_str()),
            text(self.seq_id.as_str()),
            number(f64::from(self.iteration)),
            text(self.qos_or_mode.as_str()),
            number(self.file_size_bytes as f64),
            optional(self.receiver_file_size_bytes, |v| number(v as f64)),
            number(self.t_start_ns as f64),
            number(self.t_end_ns as f64),
            optional(self.receiver_t_ns, |v| number(v as f64)),
            number(self.sender_duration_ms),
            number(self.duration_ms),
            number(self.bytes_sent_sender_to_receiver as f64),
            optional(self.receiver_bytes, |v| number(v as f64)),
            number(self.overhead_bytes as f64),
            number(self.throughput_bps),
            optional(self.overhead_ratio, number),
            text(meta_to_json(&self.extra_meta)),
            optional(self.receiver_extra_meta.as_ref(), |m| text(meta_to_json(m))),
        ]
    }
}

impl SheetRow for SummaryRow {
    fn cells(&self) -> Vec<Cell> {
        vec![
            text(self.protocol.as_str()),
            text(self.file_name.as_str()),
            optional(self.qos_or_mode.as_deref(), text),
            number(self.count as f64),
            number(self.avg_ms),
            number(self.median_ms),
            number(self.p95_ms),
            number(self.avg_throughput_bps),
            optional(self.avg_overhead_ratio, number),
        ]
    }
}

/// Sheet name prefix for a protocol.
pub fn sheet_label(protocol: Protocol) -> &'static str {
    match protocol {
        Protocol::Mqtt => "MQTT",
        Protocol::Coap => "CoAP",
        Protocol::Http => "HTTP",
    }
}

/// Workbook sink. Sheets are buffered until [`XlsxReporter::save`].
pub struct XlsxReporter {
    path: PathBuf,
    workbook: Workbook,
    sheets: Vec<String>,
}

impl XlsxReporter {
    /// Create a reporter for `<output_dir>/<prefix>.xlsx`.
    pub fn new(output_dir: impl AsRef<Path>, prefix: &str) -> Result<Self, ReporterError> {
        validate_prefix(prefix)?;

        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;

        Ok(Self {
            path: output_dir.join(format!("{}.xlsx", prefix)),
            workbook: Workbook::new(),
            sheets: Vec::new(),
        })
    }

    /// Sheet names added so far, in order.
    pub fn sheets(&self) -> &[String] {
        &self.sheets
    }

    fn add_sheet<R: SheetRow>(
        &mut self,
        name: String,
        columns: &[&str],
        rows: &[R],
    ) -> Result<(), ReporterError> {
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(name.as_str())?;

        for (col, header) in columns.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header)?;
        }

        for (index, row) in rows.iter().enumerate() {
            let row_num = index as u32 + 1;
            for (col, cell) in row.cells().into_iter().enumerate() {
                match cell {
                    Cell::Text(value) => {
                        worksheet.write_string(row_num, col as u16, value)?;
                    }
                    Cell::Number(value) => {
                        worksheet.write_number(row_num, col as u16, value)?;
                    }
                    Cell::Empty => {}
                }
            }
        }

        debug!(sheet = %name, rows = rows.len(), "Added worksheet");
        self.sheets.push(name);
        Ok(())
    }

    /// Write the workbook to disk and return its path.
    pub fn save(mut self) -> Result<PathBuf, ReporterError> {
        self.workbook.save(&self.path)?;
        Ok(self.path)
    }
}

impl TableSink for XlsxReporter {
    type Error = ReporterError;

    fn write_events(
        &mut self,
        protocol: Protocol,
        events: &[TransferEvent],
    ) -> Result<(), Self::Error> {
        let name = format!("{}_Events", sheet_label(protocol));
        self.add_sheet(name, &TransferEvent::COLUMNS, events)
    }

    fn write_summary(
        &mut self,
        protocol: Protocol,
        summary: &[SummaryRow],
    ) -> Result<(), Self::Error> {
        let name = format!("{}_Summary", sheet_label(protocol));
        self.add_sheet(name, &SummaryRow::COLUMNS, summary)
    }
}
