// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! File-level tests for the CSV reporter over logs on disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;
use xferbench_core::wire::{estimate_mqtt_publish_overhead_bytes, transfer_topic};
use xferbench_core::{
    AggregationOptions, Analysis, EventLogWriter, EventRecord, Protocol, Role, SeqId,
};
use xferbench_report::{summary_fingerprint, CsvReporter};

fn mqtt_record(role: Role, seq: &SeqId, size: u64, t_start_ns: i64) -> EventRecord {
    let topic = transfer_topic("hw3/files", "f_1MB.bin", seq);
    EventRecord {
        protocol: Protocol::Mqtt,
        role,
        file_name: "f_1MB.bin".to_string(),
        file_size_bytes: size,
        iteration: 1,
        seq_id: seq.clone(),
        qos_or_mode: "qos1".to_string(),
        t_start_ns,
        t_end_ns: t_start_ns + 400_000,
        duration_ms: 0.4,
        bytes_sent_sender_to_receiver: estimate_mqtt_publish_overhead_bytes(&topic, size, 1),
        extra_meta: BTreeMap::from([("topic".to_string(), topic)]),
    }
}

fn write_logs(root: &Path) {
    let seqs: Vec<SeqId> = (0..6).map(|_| SeqId::mint()).collect();

    let mut publisher = EventLogWriter::open(root.join("mqtt/publisher_qos1.csv")).unwrap();
    let mut subscriber = EventLogWriter::open(root.join("mqtt/subscriber_qos1.csv")).unwrap();
    for (i, seq) in seqs.iter().enumerate() {
        let t_start = i as i64 * 50_000_000;
        publisher
            .append(&mqtt_record(Role::Publisher, seq, 1_048_576, t_start))
            .unwrap();
        subscriber
            .append(&mqtt_record(Role::Subscriber, seq, 1_048_576, t_start + 7_500_000 + i as i64))
            .unwrap();
    }
}

fn emit(logs: &Path, out: &Path) -> Analysis {
    let analysis = Analysis::from_log_dir(logs, &Protocol::ALL, AggregationOptions::default());
    let mut reporter = CsvReporter::new(out, "results").unwrap();
    analysis.emit(&mut reporter).unwrap();
    analysis
}

/// Two runs over the same logs write byte-identical tables.
#[test]
fn test_tables_are_byte_identical_across_runs() {
    let logs = TempDir::new().unwrap();
    let first_out = TempDir::new().unwrap();
    let second_out = TempDir::new().unwrap();
    write_logs(logs.path());

    let first = emit(logs.path(), first_out.path());
    let second = emit(logs.path(), second_out.path());

    for protocol in Protocol::ALL {
        for table in ["events", "summary"] {
            let name = format!("results_{}_{}.csv", protocol, table);
            let a = fs::read(first_out.path().join(&name)).unwrap();
            let b = fs::read(second_out.path().join(&name)).unwrap();
            assert_eq!(a, b, "{name} differs between runs");
        }
    }

    let summary = fs::read_to_string(first_out.path().join("results_mqtt_summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 2);

    let fingerprint = |analysis: &Analysis| {
        summary_fingerprint(&analysis.protocol(Protocol::Mqtt).unwrap().summary).unwrap()
    };
    assert_eq!(fingerprint(&first), fingerprint(&second));
}

/// Joined rows keep role, sender bytes and both metadata cells.
#[test]
fn test_events_table_keeps_record_columns() {
    let logs = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    write_logs(logs.path());
    emit(logs.path(), out.path());

    let events = fs::read_to_string(out.path().join("results_mqtt_events.csv")).unwrap();
    let mut lines = events.lines();
    let header: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert!(header.contains(&"role"));
    assert!(header.contains(&"bytes_sent_sender_to_receiver"));
    assert!(header.contains(&"receiver_extra_meta"));

    let row = lines.next().unwrap();
    assert!(row.starts_with("mqtt,publisher,f_1MB.bin,"));
    // sender and receiver topic metadata are both present
    assert_eq!(row.matches("hw3/files/f_1MB.bin/").count(), 2);
}
