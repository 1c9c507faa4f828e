// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! End-to-end tests for the correlation engine.
//!
//! Logs are produced with the same append-only writer producers use, then
//! loaded, correlated and aggregated from disk.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use tempfile::TempDir;
use xferbench_core::wire::{estimate_mqtt_publish_overhead_bytes, transfer_topic};
use xferbench_core::{
    AggregationOptions, Analysis, EventLoader, EventLogWriter, EventRecord, MemorySink, Protocol,
    Role, SeqId,
};

fn mqtt_record(
    role: Role,
    seq: &SeqId,
    file_name: &str,
    size: u64,
    iteration: u32,
    t_start_ns: i64,
) -> EventRecord {
    let topic = transfer_topic("hw3/files", file_name, seq);
    EventRecord {
        protocol: Protocol::Mqtt,
        role,
        file_name: file_name.to_string(),
        file_size_bytes: size,
        iteration,
        seq_id: seq.clone(),
        qos_or_mode: "qos1".to_string(),
        t_start_ns,
        t_end_ns: t_start_ns + 250_000,
        duration_ms: 0.25,
        bytes_sent_sender_to_receiver: estimate_mqtt_publish_overhead_bytes(&topic, size, 1),
        extra_meta: BTreeMap::from([("topic".to_string(), topic)]),
    }
}

fn client_record(
    protocol: Protocol,
    seq: &str,
    file_name: &str,
    size: u64,
    duration_ms: f64,
) -> EventRecord {
    EventRecord {
        protocol,
        role: Role::Client,
        file_name: file_name.to_string(),
        file_size_bytes: size,
        iteration: 1,
        seq_id: SeqId::new(seq).unwrap(),
        qos_or_mode: if protocol == Protocol::Coap {
            "con-block".to_string()
        } else {
            "http".to_string()
        },
        t_start_ns: 10_000_000,
        t_end_ns: 10_000_000 + (duration_ms * 1e6) as i64,
        duration_ms,
        bytes_sent_sender_to_receiver: size,
        extra_meta: BTreeMap::new(),
    }
}

fn write_log(root: &Path, rel: &str, records: &[EventRecord]) {
    let mut writer = EventLogWriter::open(root.join(rel)).expect("open log");
    for record in records {
        writer.append(record).expect("append record");
    }
}

fn analyse(root: &Path) -> Analysis {
    Analysis::from_log_dir(root, &Protocol::ALL, AggregationOptions::default())
}

/// N matching pairs plus M publisher-only records give exactly N rows.
#[test]
fn test_mqtt_join_counts() {
    let temp_dir = TempDir::new().unwrap();
    let n = 7;
    let m = 4;

    let seqs: Vec<SeqId> = (0..n + m).map(|_| SeqId::mint()).collect();
    let pubs: Vec<EventRecord> = seqs
        .iter()
        .enumerate()
        .map(|(i, seq)| {
            mqtt_record(Role::Publisher, seq, "f_10KB.bin", 10_240, i as u32 + 1, 1_000_000)
        })
        .collect();
    let subs: Vec<EventRecord> = seqs[..n]
        .iter()
        .map(|seq| mqtt_record(Role::Subscriber, seq, "f_10KB.bin", 10_240, 0, 3_000_000))
        .collect();

    write_log(temp_dir.path(), "mqtt/publisher_qos1.csv", &pubs);
    write_log(temp_dir.path(), "mqtt/subscriber_qos1.csv", &subs);

    let analysis = analyse(temp_dir.path());
    let mqtt = analysis.protocol(Protocol::Mqtt).unwrap();
    assert_eq!(mqtt.events.len(), n);
    assert_eq!(mqtt.delivery.matched, n);
    assert_eq!(mqtt.delivery.unmatched_sender, m);
    assert_eq!(mqtt.summary.len(), 1);
    assert_eq!(mqtt.summary[0].count, n);
    assert!((mqtt.summary[0].avg_ms - 2.0).abs() < 1e-9);
}

/// Publisher at 1 ms, subscriber at 5 ms: end-to-end 4 ms.
#[test]
fn test_mqtt_end_to_end_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let seq = SeqId::new("A").unwrap();

    write_log(
        temp_dir.path(),
        "mqtt/publisher_qos1.csv",
        &[mqtt_record(Role::Publisher, &seq, "f_100B.bin", 100, 1, 1_000_000)],
    );
    write_log(
        temp_dir.path(),
        "mqtt/subscriber_qos1.csv",
        &[mqtt_record(Role::Subscriber, &seq, "f_100B.bin", 100, 0, 5_000_000)],
    );

    let analysis = analyse(temp_dir.path());
    let events = &analysis.protocol(Protocol::Mqtt).unwrap().events;
    assert_eq!(events.len(), 1);
    assert!((events[0].duration_ms - 4.0).abs() < 1e-9);
    assert!((events[0].throughput_bps - 200_000.0).abs() < 1e-6);
    assert!(events[0].overhead_ratio.unwrap() > 2.0);
}

/// A single CoAP client record at 50 ms for 1 MB: 160 Mbit/s, no join.
#[test]
fn test_coap_passthrough_scenario() {
    let temp_dir = TempDir::new().unwrap();
    write_log(
        temp_dir.path(),
        "coap/client.csv",
        &[client_record(Protocol::Coap, "c1", "f_1MB.bin", 1_000_000, 50.0)],
    );

    let analysis = analyse(temp_dir.path());
    let coap = analysis.protocol(Protocol::Coap).unwrap();
    assert_eq!(coap.events.len(), 1);
    assert!((coap.events[0].throughput_bps - 160_000_000.0).abs() < 1e-3);
    assert_eq!(coap.events[0].receiver_t_ns, None);
    assert_eq!(coap.delivery.receiver_records, 0);
}

/// HTTP client at 1000 ms for 1 MB: 8 Mbit/s.
#[test]
fn test_http_throughput_formula() {
    let temp_dir = TempDir::new().unwrap();
    write_log(
        temp_dir.path(),
        "http/client.csv",
        &[client_record(Protocol::Http, "h1", "f_1MB.bin", 1_000_000, 1000.0)],
    );
    write_log(
        temp_dir.path(),
        "http/server.csv",
        &[EventRecord {
            role: Role::Server,
            ..client_record(Protocol::Http, "h1", "f_1MB.bin", 1_000_000, 990.0)
        }],
    );

    let analysis = analyse(temp_dir.path());
    let http = analysis.protocol(Protocol::Http).unwrap();
    assert_eq!(http.events.len(), 1);
    assert!((http.events[0].throughput_bps - 8_000_000.0).abs() < 1e-6);
    assert_eq!(http.delivery.receiver_records, 1);
}

/// Zero-byte payloads have no overhead ratio and never drag the mean to 0.
#[test]
fn test_zero_size_overhead_excluded() {
    let temp_dir = TempDir::new().unwrap();
    write_log(
        temp_dir.path(),
        "http/client.csv",
        &[
            client_record(Protocol::Http, "z1", "f_empty.bin", 0, 1.0),
            client_record(Protocol::Http, "z2", "f_empty.bin", 0, 2.0),
            client_record(Protocol::Http, "k1", "f_100B.bin", 100, 1.0),
            client_record(Protocol::Http, "k2", "f_100B.bin", 0, 1.0),
        ],
    );

    let analysis = analyse(temp_dir.path());
    let summary = &analysis.protocol(Protocol::Http).unwrap().summary;
    let empty = summary.iter().find(|r| r.file_name == "f_empty.bin").unwrap();
    assert_eq!(empty.count, 2);
    assert_eq!(empty.avg_overhead_ratio, None);

    let mixed = summary.iter().find(|r| r.file_name == "f_100B.bin").unwrap();
    assert_eq!(mixed.count, 2);
    assert_eq!(mixed.avg_overhead_ratio, Some(1.0));
}

/// Twenty CoAP samples of 1..20 ms: linear-interpolation p95 is 19.05.
#[test]
fn test_percentile_from_logs() {
    let temp_dir = TempDir::new().unwrap();
    let records: Vec<EventRecord> = (1..=20)
        .map(|ms| {
            client_record(
                Protocol::Coap,
                &format!("p{ms}"),
                "f_10KB.bin",
                10_240,
                f64::from(ms),
            )
        })
        .collect();
    write_log(temp_dir.path(), "coap/client.csv", &records);

    let analysis = analyse(temp_dir.path());
    let row = &analysis.protocol(Protocol::Coap).unwrap().summary[0];
    assert_eq!(row.count, 20);
    assert!((row.p95_ms - 19.05).abs() < 1e-9);
    assert!((row.median_ms - 10.5).abs() < 1e-9);
}

/// Running twice over the same logs yields identical tables.
#[test]
fn test_idempotent_runs() {
    let temp_dir = TempDir::new().unwrap();
    let seqs: Vec<SeqId> = (0..5).map(|_| SeqId::mint()).collect();
    let pubs: Vec<EventRecord> = seqs
        .iter()
        .map(|s| mqtt_record(Role::Publisher, s, "f_1MB.bin", 1_048_576, 1, 1_000))
        .collect();
    let subs: Vec<EventRecord> = seqs
        .iter()
        .rev()
        .map(|s| mqtt_record(Role::Subscriber, s, "f_1MB.bin", 1_048_576, 0, 9_000_000))
        .collect();
    write_log(temp_dir.path(), "mqtt/publisher_qos1.csv", &pubs);
    write_log(temp_dir.path(), "mqtt/subscriber_qos1.csv", &subs);
    write_log(
        temp_dir.path(),
        "http/client.csv",
        &[client_record(Protocol::Http, "h1", "f_1MB.bin", 1_048_576, 12.5)],
    );

    let mut first = MemorySink::default();
    let mut second = MemorySink::default();
    analyse(temp_dir.path()).emit(&mut first).unwrap();
    analyse(temp_dir.path()).emit(&mut second).unwrap();

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first.summaries).unwrap(),
        serde_json::to_string(&second.summaries).unwrap()
    );
}

/// Missing directories, header-only logs and broken files never abort a run.
#[test]
fn test_tolerant_loading() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    // header-only subscriber log, no publisher log at all
    write_log(root, "mqtt/subscriber_qos1.csv", &[]);
    // coap has a structurally broken file next to a good one
    write_log(
        root,
        "coap/client.csv",
        &[client_record(Protocol::Coap, "c1", "f_100B.bin", 100, 2.0)],
    );
    fs::write(root.join("coap/server.csv"), "protocol,role\ncoap,server\n").unwrap();
    // http directory missing

    let analysis = analyse(root);
    assert!(analysis.protocol(Protocol::Mqtt).unwrap().events.is_empty());
    assert_eq!(analysis.protocol(Protocol::Coap).unwrap().events.len(), 1);
    assert!(analysis.protocol(Protocol::Http).unwrap().summary.is_empty());
    assert_eq!(analysis.load.failures.len(), 1);
    assert_eq!(analysis.load.missing_protocols, vec![Protocol::Http]);
}

/// A subscriber row with blank identifiers is matched through its topic.
#[test]
fn test_subscriber_identifiers_recovered_from_topic() {
    let temp_dir = TempDir::new().unwrap();
    let seq = SeqId::mint();
    let topic = transfer_topic("hw3/files", "f_100B.bin", &seq);

    write_log(
        temp_dir.path(),
        "mqtt/publisher_qos2.csv",
        &[mqtt_record(Role::Publisher, &seq, "f_100B.bin", 100, 1, 0)],
    );
    let header = fs::read_to_string(temp_dir.path().join("mqtt/publisher_qos2.csv"))
        .unwrap()
        .lines()
        .next()
        .unwrap()
        .to_string();
    let topic_json = format!("\"{{\"\"topic\"\":\"\"{topic}\"\"}}\"");
    fs::write(
        temp_dir.path().join("mqtt/subscriber_qos2.csv"),
        format!("{header}\nmqtt,subscriber,,100,0,,qos2,2000000,2000000,0.000,130,{topic_json}\n"),
    )
    .unwrap();

    let (store, report) = EventLoader::new(temp_dir.path()).load();
    assert_eq!(report.rows_skipped(), 0);
    let subs = store.table(Protocol::Mqtt, Role::Subscriber);
    assert_eq!(subs.len(), 1);
    assert_eq!(subs[0].seq_id, seq);

    let analysis = analyse(temp_dir.path());
    let events = &analysis.protocol(Protocol::Mqtt).unwrap().events;
    assert_eq!(events.len(), 1);
    assert!((events[0].duration_ms - 2.0).abs() < 1e-9);
}
