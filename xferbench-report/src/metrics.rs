// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Run report types and human-readable formatting.
//!
//! A [`RunReport`] wraps one analysis run with the metadata needed to compare
//! runs later: when and where it ran, what was loaded, delivery counts and a
//! fingerprint of every summary table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sysinfo::System;
use uuid::Uuid;
use xferbench_core::{Analysis, DeliveryStats, Protocol, SummaryRow};

use crate::reporter::{summary_fingerprint, ReporterError};

/// System information captured when the report was produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    /// Operating system name
    pub os: String,
    /// OS version
    pub os_version: String,
    /// Kernel version (Linux)
    pub kernel_version: Option<String>,
    /// Number of CPU cores
    pub cpu_cores: usize,
    /// Hostname
    pub hostname: String,
}

impl SystemInfo {
    /// Collect current system information.
    pub fn collect() -> Self {
        let mut sys = System::new();
        sys.refresh_cpu();

        Self {
            os: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version(),
            cpu_cores: sys.cpus().len(),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Load statistics as they appear in the report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadSummary {
    pub files_read: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
    pub partial_tails: usize,
    pub failed_files: Vec<String>,
    pub missing_protocols: Vec<Protocol>,
}

/// Per-protocol section of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolSection {
    pub protocol: Protocol,
    pub events: usize,
    pub delivery: DeliveryStats,
    /// CRC32 of the summary table as emitted by the CSV reporter.
    pub summary_crc32: u32,
    pub summary: Vec<SummaryRow>,
}

/// Complete report for one correlation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Suite identifier
    pub suite: String,
    /// Framework version
    pub version: String,
    pub run_id: Uuid,
    /// Timestamp when the run finished
    pub timestamp: DateTime<Utc>,
    pub system_info: SystemInfo,
    pub load: LoadSummary,
    pub protocols: Vec<ProtocolSection>,
}

impl RunReport {
    /// Build a report from a finished analysis.
    pub fn from_analysis(analysis: &Analysis) -> Result<Self, ReporterError> {
        let load = &analysis.load;

        let protocols = analysis
            .protocols
            .iter()
            .map(|p| {
                Ok(ProtocolSection {
                    protocol: p.protocol,
                    events: p.events.len(),
                    delivery: p.delivery.clone(),
                    summary_crc32: summary_fingerprint(&p.summary)?,
                    summary: p.summary.clone(),
                })
            })
            .collect::<Result<Vec<_>, ReporterError>>()?;

        Ok(Self {
            suite: "xferbench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            run_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            system_info: SystemInfo::collect(),
            load: LoadSummary {
                files_read: load.files.len(),
                rows_loaded: load.rows_loaded(),
                rows_skipped: load.rows_skipped(),
                partial_tails: load.files.iter().filter(|f| f.partial_tail).count(),
                failed_files: load.failures.iter().map(|e| e.to_string()).collect(),
                missing_protocols: load.missing_protocols.clone(),
            },
            protocols,
        })
    }
}

/// Format a millisecond latency (auto-selects μs/ms/s).
pub fn format_ms(ms: f64) -> String {
    let abs = ms.abs();
    if abs < 1.0 {
        format!("{:.2}μs", ms * 1_000.0)
    } else if abs < 1_000.0 {
        format!("{:.2}ms", ms)
    } else {
        format!("{:.2}s", ms / 1_000.0)
    }
}

/// Format a bit rate in human-readable form.
pub fn format_bps(bps: f64) -> String {
    if bps < 1_000.0 {
        format!("{:.2} bit/s", bps)
    } else if bps < 1_000_000.0 {
        format!("{:.2} kbit/s", bps / 1_000.0)
    } else if bps < 1_000_000_000.0 {
        format!("{:.2} Mbit/s", bps / 1_000_000.0)
    } else {
        format!("{:.2} Gbit/s", bps / 1_000_000_000.0)
    }
}
