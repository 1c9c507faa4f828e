// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Event store loader.
//!
//! Reads `<root>/<protocol>/*.csv` into typed tables partitioned by
//! `(protocol, role)`. Loading is tolerant by construction:
//!
//! - a missing protocol directory is an empty table
//! - a malformed row is skipped with a warning
//! - an unparseable trailing line without a newline is a record still being
//!   appended by a live producer and is silently left for the next load
//! - a structural problem (missing column, unreadable file) aborts that file
//!   only and is returned in the [`LoadReport`]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use crate::error::{LogFileError, RecordError};
use crate::record::{
    EventRecord, RawEventRow, EXTRA_META_COLUMN, EXTRA_META_LEGACY_COLUMN, REQUIRED_COLUMNS,
};
use crate::types::{Protocol, Role};

/// In-memory event tables keyed by `(protocol, role)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventStore {
    tables: BTreeMap<(Protocol, Role), Vec<EventRecord>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records in arrival order.
    pub fn from_records(records: impl IntoIterator<Item = EventRecord>) -> Self {
        let mut store = Self::new();
        store.extend(records);
        store
    }

    /// Append records, preserving their order within each table.
    pub fn extend(&mut self, records: impl IntoIterator<Item = EventRecord>) {
        for record in records {
            self.tables
                .entry((record.protocol, record.role))
                .or_default()
                .push(record);
        }
    }

    /// Records for one `(protocol, role)`; empty when nothing was logged.
    pub fn table(&self, protocol: Protocol, role: Role) -> &[EventRecord] {
        self.tables
            .get(&(protocol, role))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate over non-empty tables in key order.
    pub fn tables(&self) -> impl Iterator<Item = (&(Protocol, Role), &[EventRecord])> {
        self.tables.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Total number of records across all tables.
    pub fn len(&self) -> usize {
        self.tables.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A discovered event log file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogFile {
    pub path: PathBuf,
    pub protocol: Protocol,
    /// Role inferred from the file stem; rows carry their own role.
    pub role_hint: Option<Role>,
}

impl LogFile {
    fn role_label(&self) -> String {
        self.role_hint
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Result of loading a single log file.
#[derive(Debug, Clone, Default)]
pub struct FileLoad {
    pub records: Vec<EventRecord>,
    pub rows_skipped: usize,
    /// A trailing partial line was left for a later load.
    pub partial_tail: bool,
}

/// Per-file outcome included in the load report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    pub protocol: Protocol,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub partial_tail: bool,
}

/// Everything the loader observed besides the records themselves.
#[derive(Debug, Default, Serialize)]
pub struct LoadReport {
    pub files: Vec<FileSummary>,
    #[serde(serialize_with = "serialize_failures")]
    pub failures: Vec<LogFileError>,
    /// Protocols whose log directory did not exist.
    pub missing_protocols: Vec<Protocol>,
}

impl LoadReport {
    pub fn rows_loaded(&self) -> usize {
        self.files.iter().map(|f| f.rows_loaded).sum()
    }

    pub fn rows_skipped(&self) -> usize {
        self.files.iter().map(|f| f.rows_skipped).sum()
    }
}

#[allow(clippy::ptr_arg)]
fn serialize_failures<S: Serializer>(
    failures: &Vec<LogFileError>,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_seq(failures.iter().map(|f| f.to_string()))
}

/// Loader for a benchmark log directory.
pub struct EventLoader {
    root: PathBuf,
    protocols: Vec<Protocol>,
}

impl EventLoader {
    /// Create a loader for all protocols under `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            protocols: Protocol::ALL.to_vec(),
        }
    }

    /// Restrict loading to the given protocols.
    pub fn protocols(mut self, protocols: &[Protocol]) -> Self {
        self.protocols = protocols.to_vec();
        self
    }

    /// Enumerate log files in deterministic order.
    ///
    /// Unreadable protocol directories are reported as failures; missing
    /// ones are listed in `missing`.
    pub fn discover(&self) -> Discovery {
        let mut discovery = Discovery::default();

        for &protocol in &self.protocols {
            let dir = self.root.join(protocol.as_str());
            if !dir.is_dir() {
                debug!(protocol = %protocol, dir = %dir.display(), "No log directory");
                discovery.missing.push(protocol);
                continue;
            }

            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    discovery.failures.push(LogFileError::Read {
                        path: dir,
                        protocol,
                        role: "*".to_string(),
                        source: e,
                    });
                    continue;
                }
            };

            let mut paths: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "csv"))
                .collect();
            paths.sort();

            for path in paths {
                let role_hint = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(Role::from_file_stem);
                discovery.files.push(LogFile {
                    path,
                    protocol,
                    role_hint,
                });
            }
        }

        discovery
    }

    /// Load every discovered log into an [`EventStore`].
    pub fn load(&self) -> (EventStore, LoadReport) {
        let discovery = self.discover();
        let mut store = EventStore::new();
        let mut report = LoadReport {
            files: Vec::with_capacity(discovery.files.len()),
            failures: discovery.failures,
            missing_protocols: discovery.missing,
        };

        for log in &discovery.files {
            match load_file(log) {
                Ok(load) => {
                    report.files.push(FileSummary {
                        path: log.path.clone(),
                        protocol: log.protocol,
                        rows_loaded: load.records.len(),
                        rows_skipped: load.rows_skipped,
                        partial_tail: load.partial_tail,
                    });
                    store.extend(load.records);
                }
                Err(e) => {
                    warn!(error = %e, "Skipping event log");
                    report.failures.push(e);
                }
            }
        }

        for ((protocol, role), records) in store.tables() {
            debug!(protocol = %protocol, role = %role, records = records.len(), "Event table");
        }

        info!(
            root = %self.root.display(),
            files = report.files.len(),
            failed = report.failures.len(),
            records = store.len(),
            skipped = report.rows_skipped(),
            "Loaded event logs"
        );

        (store, report)
    }
}

/// Files found under the log root.
#[derive(Debug, Default)]
pub struct Discovery {
    pub files: Vec<LogFile>,
    pub failures: Vec<LogFileError>,
    pub missing: Vec<Protocol>,
}

/// Parse one log file.
///
/// Only structural problems are errors; bad rows are counted and skipped.
pub fn load_file(log: &LogFile) -> Result<FileLoad, LogFileError> {
    let bytes = fs::read(&log.path).map_err(|e| LogFileError::Read {
        path: log.path.clone(),
        protocol: log.protocol,
        role: log.role_label(),
        source: e,
    })?;

    // Producer created the file but has not written the header yet.
    if bytes.iter().all(u8::is_ascii_whitespace) {
        debug!(path = %log.path.display(), "Empty event log");
        return Ok(FileLoad::default());
    }

    let complete_tail = bytes.ends_with(b"\n");

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes.as_slice());

    let headers = reader
        .headers()
        .map_err(|e| LogFileError::Header {
            path: log.path.clone(),
            protocol: log.protocol,
            role: log.role_label(),
            reason: e.to_string(),
        })?
        .clone();

    if let Some(column) = REQUIRED_COLUMNS
        .iter()
        .copied()
        .find(|c| !headers.iter().any(|h| h == *c))
    {
        // Producer is still writing the header line.
        if !bytes.contains(&b'\n') {
            debug!(path = %log.path.display(), "Partial header line, not yet available");
            return Ok(FileLoad {
                partial_tail: true,
                ..FileLoad::default()
            });
        }

        return Err(LogFileError::MissingColumn {
            path: log.path.clone(),
            protocol: log.protocol,
            role: log.role_label(),
            column,
        });
    }

    if !headers
        .iter()
        .any(|h| h == EXTRA_META_COLUMN || h == EXTRA_META_LEGACY_COLUMN)
    {
        debug!(path = %log.path.display(), "No metadata column, extra_meta left empty");
    }

    let rows: Vec<_> = reader.records().collect();
    let last = rows.len().saturating_sub(1);
    let mut load = FileLoad::default();

    for (index, row) in rows.into_iter().enumerate() {
        let line = row
            .as_ref()
            .ok()
            .and_then(|r| r.position())
            .map(|p| p.line())
            .unwrap_or(0);

        let parsed = row
            .map_err(|e| RecordError::Schema {
                reason: e.to_string(),
            })
            .and_then(|record| parse_row(&record, &headers, log.protocol));

        match parsed {
            Ok(record) => load.records.push(record),
            Err(_) if index == last && !complete_tail => {
                debug!(path = %log.path.display(), line, "Partial trailing line, not yet available");
                load.partial_tail = true;
            }
            Err(e) => {
                warn!(path = %log.path.display(), line, error = %e, "Skipping malformed row");
                load.rows_skipped += 1;
            }
        }
    }

    debug!(
        path = %log.path.display(),
        rows = load.records.len(),
        skipped = load.rows_skipped,
        "Loaded event log"
    );

    Ok(load)
}

fn parse_row(
    record: &csv::StringRecord,
    headers: &csv::StringRecord,
    expected: Protocol,
) -> Result<EventRecord, RecordError> {
    if record.len() != headers.len() {
        return Err(RecordError::Schema {
            reason: format!("expected {} fields, found {}", headers.len(), record.len()),
        });
    }

    let raw: RawEventRow = record
        .deserialize(Some(headers))
        .map_err(|e| RecordError::Schema {
            reason: e.to_string(),
        })?;
    let event = EventRecord::try_from(raw)?;

    if event.protocol != expected {
        return Err(RecordError::ProtocolMismatch {
            expected,
            found: event.protocol,
        });
    }

    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str = "protocol,role,file_name,file_size_bytes,iteration,seq_id,qos_or_mode,t_start_ns,t_end_ns,duration_ms,bytes_sent_sender_to_receiver,extra_meta_json\n";

    fn write(dir: &Path, rel: &str, content: &str) -> PathBuf {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn log(path: PathBuf, protocol: Protocol) -> LogFile {
        LogFile {
            path,
            protocol,
            role_hint: None,
        }
    }

    #[test]
    fn test_header_only_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "http/client.csv", HEADER);
        let load = load_file(&log(path, Protocol::Http)).unwrap();
        assert!(load.records.is_empty());
        assert_eq!(load.rows_skipped, 0);
        assert!(!load.partial_tail);
    }

    #[test]
    fn test_zero_byte_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(temp_dir.path(), "http/client.csv", "");
        let load = load_file(&log(path, Protocol::Http)).unwrap();
        assert!(load.records.is_empty());
    }

    #[test]
    fn test_malformed_row_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let content = format!(
            "{HEADER}http,client,f_100B.bin,100,1,a,http,0,1000000,1.000,100,{{}}\n\
             http,client,f_100B.bin,not-a-number,2,b,http,0,1000000,1.000,100,{{}}\n\
             http,client,f_100B.bin,100,3,c,http,0,2000000,2.000,100,{{}}\n"
        );
        let path = write(temp_dir.path(), "http/client.csv", &content);
        let load = load_file(&log(path, Protocol::Http)).unwrap();
        assert_eq!(load.records.len(), 2);
        assert_eq!(load.rows_skipped, 1);
        assert_eq!(load.records[1].seq_id.as_str(), "c");
    }

    #[test]
    fn test_partial_trailing_line_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let content = format!(
            "{HEADER}http,client,f_100B.bin,100,1,a,http,0,1000000,1.000,100,{{}}\nhttp,client,f_1"
        );
        let path = write(temp_dir.path(), "http/client.csv", &content);
        let load = load_file(&log(path, Protocol::Http)).unwrap();
        assert_eq!(load.records.len(), 1);
        assert_eq!(load.rows_skipped, 0);
        assert!(load.partial_tail);
    }

    #[test]
    fn test_partial_header_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "mqtt/subscriber_qos1.csv", "protocol,role,file_na");

        let (store, report) = EventLoader::new(temp_dir.path())
            .protocols(&[Protocol::Mqtt])
            .load();
        assert!(store.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(report.files.len(), 1);
        assert!(report.files[0].partial_tail);
        assert_eq!(report.rows_skipped(), 0);
    }

    #[test]
    fn test_missing_column_is_structural() {
        let temp_dir = TempDir::new().unwrap();
        let path = write(
            temp_dir.path(),
            "mqtt/publisher_qos1.csv",
            "protocol,role,file_name\nmqtt,publisher,f_100B.bin\n",
        );
        let err = load_file(&LogFile {
            path,
            protocol: Protocol::Mqtt,
            role_hint: Some(Role::Publisher),
        })
        .unwrap_err();
        match err {
            LogFileError::MissingColumn { column, role, .. } => {
                assert_eq!(column, "file_size_bytes");
                assert_eq!(role, "publisher");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_protocol_mismatch_row_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let content =
            format!("{HEADER}coap,client,f_100B.bin,100,1,a,con-block,0,1000000,1.000,100,{{}}\n");
        let path = write(temp_dir.path(), "http/client.csv", &content);
        let load = load_file(&log(path, Protocol::Http)).unwrap();
        assert!(load.records.is_empty());
        assert_eq!(load.rows_skipped, 1);
    }

    #[test]
    fn test_loader_missing_dirs_are_empty() {
        let temp_dir = TempDir::new().unwrap();
        let (store, report) = EventLoader::new(temp_dir.path()).load();
        assert!(store.is_empty());
        assert_eq!(report.missing_protocols, Protocol::ALL.to_vec());
        assert!(report.failures.is_empty());
        assert!(store.table(Protocol::Mqtt, Role::Publisher).is_empty());
    }

    #[test]
    fn test_loader_partitions_and_orders() {
        let temp_dir = TempDir::new().unwrap();
        write(
            temp_dir.path(),
            "mqtt/publisher_qos2.csv",
            &format!("{HEADER}mqtt,publisher,f_100B.bin,100,1,b,qos2,10,20,0.000,150,{{}}\n"),
        );
        write(
            temp_dir.path(),
            "mqtt/publisher_qos1.csv",
            &format!("{HEADER}mqtt,publisher,f_100B.bin,100,1,a,qos1,10,20,0.000,150,{{}}\n"),
        );
        write(
            temp_dir.path(),
            "mqtt/subscriber_qos1.csv",
            &format!("{HEADER}mqtt,subscriber,f_100B.bin,100,0,a,qos1,30,30,0.000,150,{{}}\n"),
        );
        write(temp_dir.path(), "mqtt/notes.txt", "ignored");
        write(temp_dir.path(), "mqtt/broken.csv", "protocol\nmqtt\n");

        let (store, report) = EventLoader::new(temp_dir.path()).load();
        let pubs = store.table(Protocol::Mqtt, Role::Publisher);
        assert_eq!(pubs.len(), 2);
        // qos1 file sorts first
        assert_eq!(pubs[0].seq_id.as_str(), "a");
        assert_eq!(pubs[1].seq_id.as_str(), "b");
        assert_eq!(store.table(Protocol::Mqtt, Role::Subscriber).len(), 1);
        let keys: Vec<_> = store.tables().map(|(key, _)| *key).collect();
        assert_eq!(
            keys,
            vec![(Protocol::Mqtt, Role::Publisher), (Protocol::Mqtt, Role::Subscriber)]
        );
        assert_eq!(report.files.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].path().ends_with("broken.csv"));
        assert_eq!(report.rows_loaded(), 3);
    }

    #[test]
    fn test_loader_protocol_filter() {
        let temp_dir = TempDir::new().unwrap();
        write(temp_dir.path(), "http/client.csv", HEADER);
        let discovery = EventLoader::new(temp_dir.path())
            .protocols(&[Protocol::Http])
            .discover();
        assert_eq!(discovery.files.len(), 1);
        assert_eq!(discovery.files[0].role_hint, Some(Role::Client));
        assert!(discovery.missing.is_empty());
    }
}
