// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Summary statistics over correlated transfer events.
//!
//! Events are grouped by `(protocol, file_name)`. The file name encodes the
//! payload size, so each group compares like-sized transfers. Grouping can
//! optionally split further by transfer mode (e.g. MQTT `qos1` vs `qos2`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::correlator::TransferEvent;
use crate::types::Protocol;

/// Knobs for the aggregation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationOptions {
    /// Add `qos_or_mode` to the grouping key.
    pub split_by_mode: bool,
}

/// One summary row per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    pub protocol: Protocol,
    pub file_name: String,
    /// Only set when aggregating with `split_by_mode`.
    pub qos_or_mode: Option<String>,
    pub count: usize,
    pub avg_ms: f64,
    pub median_ms: f64,
    pub p95_ms: f64,
    pub avg_throughput_bps: f64,
    /// `None` when no event in the group has a defined ratio.
    pub avg_overhead_ratio: Option<f64>,
}

impl SummaryRow {
    /// Column names in serialization order.
    pub const COLUMNS: [&'static str; 9] = [
        "protocol",
        "file_name",
        "qos_or_mode",
        "count",
        "avg_ms",
        "median_ms",
        "p95_ms",
        "avg_throughput_bps",
        "avg_overhead_ratio",
    ];
}

type GroupKey = (Protocol, String, Option<String>);

/// Groups events and computes per-group statistics.
#[derive(Debug, Clone, Copy, Default)]
pub struct Aggregator {
    options: AggregationOptions,
}

impl Aggregator {
    pub fn new(options: AggregationOptions) -> Self {
        Self { options }
    }

    /// Summarize events; rows come out in sorted key order.
    pub fn summarize(&self, events: &[TransferEvent]) -> Vec<SummaryRow> {
        let mut groups: BTreeMap<GroupKey, Vec<&TransferEvent>> = BTreeMap::new();
        for event in events {
            let mode = self
                .options
                .split_by_mode
                .then(|| event.qos_or_mode.clone());
            groups
                .entry((event.protocol, event.file_name.clone(), mode))
                .or_default()
                .push(event);
        }

        groups
            .into_iter()
            .map(|((protocol, file_name, qos_or_mode), group)| {
                let mut latencies: Vec<f64> = group.iter().map(|e| e.duration_ms).collect();
                latencies.sort_by(f64::total_cmp);

                let throughputs: Vec<f64> = group.iter().map(|e| e.throughput_bps).collect();
                let ratios: Vec<f64> = group.iter().filter_map(|e| e.overhead_ratio).collect();

                // Groups are never empty, so the latency statistics exist.
                SummaryRow {
                    protocol,
                    file_name,
                    qos_or_mode,
                    count: group.len(),
                    avg_ms: mean(&latencies).unwrap_or_default(),
                    median_ms: quantile(&latencies, 0.5).unwrap_or_default(),
                    p95_ms: quantile(&latencies, 0.95).unwrap_or_default(),
                    avg_throughput_bps: mean(&throughputs).unwrap_or_default(),
                    avg_overhead_ratio: mean(&ratios),
                }
            })
            .collect()
    }
}

/// Arithmetic mean, `None` for no samples.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Linear-interpolation quantile of ascending `sorted` samples.
///
/// Position is `q * (n - 1)` on the 0-based sample index, interpolated
/// between its two neighbours.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }

    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;

    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}
