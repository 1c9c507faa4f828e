// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Append-only event log writer used by producers.
//!
//! Each role owns exactly one log file. The header is written when the file
//! is new or still empty, and every append is flushed immediately so a
//! concurrent reader only ever sees whole rows plus at most one partial
//! trailing line.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{XferError, XferResult};
use crate::record::{EventRecord, EXTRA_META_COLUMN, REQUIRED_COLUMNS};

/// Single-writer append handle for one `(protocol, role)` event log.
pub struct EventLogWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
}

impl EventLogWriter {
    /// Open (or create) the log at `path`, writing the header if needed.
    pub fn open(path: impl AsRef<Path>) -> XferResult<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| XferError::Io {
                context: "creating event log directory",
                source: e,
            })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| XferError::Io {
                context: "opening event log",
                source: e,
            })?;

        let needs_header = file
            .metadata()
            .map_err(|e| XferError::Io {
                context: "reading event log metadata",
                source: e,
            })?
            .len()
            == 0;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if needs_header {
            let header = REQUIRED_COLUMNS.iter().copied().chain([EXTRA_META_COLUMN]);
            writer.write_record(header).map_err(|e| XferError::Csv {
                context: "writing event log header",
                source: e,
            })?;
            writer.flush().map_err(|e| XferError::Io {
                context: "flushing event log header",
                source: e,
            })?;
        }

        Ok(Self { path, writer })
    }

    /// Append one record and flush it to disk.
    pub fn append(&mut self, record: &EventRecord) -> XferResult<()> {
        let row = [
            record.protocol.as_str().to_string(),
            record.role.as_str().to_string(),
            record.file_name.clone(),
            record.file_size_bytes.to_string(),
            record.iteration.to_string(),
            record.seq_id.to_string(),
            record.qos_or_mode.clone(),
            record.t_start_ns.to_string(),
            record.t_end_ns.to_string(),
            format!("{:.3}", record.duration_ms),
            record.bytes_sent_sender_to_receiver.to_string(),
            record.extra_meta_json(),
        ];

        self.writer.write_record(&row).map_err(|e| XferError::Csv {
            context: "appending event record",
            source: e,
        })?;
        self.writer.flush().map_err(|e| XferError::Io {
            context: "flushing event record",
            source: e,
        })?;

        trace!(path = %self.path.display(), seq_id = %record.seq_id, "Appended event record");
        Ok(())
    }
}
