// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! `xferbench aggregate` command - Correlate logs and emit result tables.

use std::path::PathBuf;

use tracing::info;
use xferbench_core::config::validate_prefix;
use xferbench_core::{AggregationOptions, Analysis, Config, Protocol, ProtocolReport};
use xferbench_report::{
    format_bps, format_ms, CsvReporter, JsonReporter, RunReport, XlsxReporter,
};

/// Command-line values that take precedence over the config file.
pub struct Overrides {
    pub logs: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub prefix: Option<String>,
    pub split_by_mode: bool,
    pub protocols: Vec<String>,
    pub no_json: bool,
    pub xlsx: bool,
}

impl Overrides {
    fn apply(self, mut config: Config) -> Result<Config, Box<dyn std::error::Error>> {
        if let Some(logs) = self.logs {
            config.log_dir = logs;
        }
        if let Some(out) = self.out {
            config.output.dir = out;
        }
        if let Some(prefix) = self.prefix {
            validate_prefix(&prefix)?;
            config.output.prefix = prefix;
        }
        if self.split_by_mode {
            config.aggregation = AggregationOptions {
                split_by_mode: true,
            };
        }
        if !self.protocols.is_empty() {
            let mut protocols = Vec::with_capacity(self.protocols.len());
            for value in &self.protocols {
                let protocol: Protocol = value.parse()?;
                if !protocols.contains(&protocol) {
                    protocols.push(protocol);
                }
            }
            config.protocols = protocols;
        }
        if self.no_json {
            config.output.json_report = false;
        }
        if self.xlsx {
            config.output.xlsx = true;
        }
        Ok(config)
    }
}

pub fn execute(config: Config, overrides: Overrides) -> Result<(), Box<dyn std::error::Error>> {
    let config = overrides.apply(config)?;

    info!(
        logs = %config.log_dir.display(),
        out = %config.output.dir.display(),
        "Aggregating benchmark logs"
    );

    let analysis = Analysis::from_log_dir(&config.log_dir, &config.protocols, config.aggregation);

    let mut reporter = CsvReporter::new(&config.output.dir, config.output.prefix.as_str())?;
    analysis.emit(&mut reporter)?;

    println!(
        "Loaded {} row(s) from {} file(s)",
        analysis.load.rows_loaded(),
        analysis.load.files.len()
    );
    if analysis.load.rows_skipped() > 0 {
        println!("Skipped {} malformed row(s)", analysis.load.rows_skipped());
    }
    for failure in &analysis.load.failures {
        eprintln!("✗ {}", failure);
    }
    println!();

    for report in &analysis.protocols {
        println!("{}", headline(report));

        for row in &report.summary {
            let mode = row.qos_or_mode.as_deref().unwrap_or("-");
            println!(
                "  {:<24} {:<8} n={:<5} avg={:<12} p50={:<12} p95={:<12} {}",
                row.file_name,
                mode,
                row.count,
                format_ms(row.avg_ms),
                format_ms(row.median_ms),
                format_ms(row.p95_ms),
                format_bps(row.avg_throughput_bps)
            );
        }
    }

    println!();
    for path in reporter.written() {
        println!("Wrote {}", path.display());
    }

    if config.output.xlsx {
        let mut workbook = XlsxReporter::new(&config.output.dir, &config.output.prefix)?;
        analysis.emit(&mut workbook)?;
        println!("Wrote {}", workbook.save()?.display());
    }

    if config.output.json_report {
        let report = RunReport::from_analysis(&analysis)?;
        let path = JsonReporter::new(&config.output.dir)?.save(&config.output.prefix, &report)?;
        println!("Wrote {}", path.display());
    }

    Ok(())
}

/// One-line event and delivery count for a protocol.
fn headline(report: &ProtocolReport) -> String {
    let delivery = &report.delivery;
    match delivery.delivery_ratio() {
        Some(ratio) if report.protocol.requires_join() => format!(
            "{}: {} event(s), {}/{} delivered ({:.1}%)",
            report.protocol,
            report.events.len(),
            delivery.matched,
            delivery.distinct_senders(),
            ratio * 100.0
        ),
        _ => format!("{}: {} event(s)", report.protocol, report.events.len()),
    }
}
