// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Load → correlate → aggregate in one stateless pass.
//!
//! A run owns nothing between invocations. Given the same logs it produces
//! the same tables, so it can be repeated freely.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::aggregator::{AggregationOptions, Aggregator, SummaryRow};
use crate::correlator::{Correlator, DeliveryStats, TransferEvent};
use crate::loader::{EventLoader, EventStore, LoadReport};
use crate::sink::TableSink;
use crate::types::Protocol;

/// Correlated events, summary and delivery counts for one protocol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProtocolReport {
    pub protocol: Protocol,
    #[serde(skip)]
    pub events: Vec<TransferEvent>,
    pub summary: Vec<SummaryRow>,
    pub delivery: DeliveryStats,
}

/// Result of one full analysis run.
#[derive(Debug, Serialize)]
pub struct Analysis {
    pub load: LoadReport,
    pub protocols: Vec<ProtocolReport>,
}

impl Analysis {
    /// Load logs under `log_dir` and analyse the given protocols.
    pub fn from_log_dir(
        log_dir: impl AsRef<Path>,
        protocols: &[Protocol],
        options: AggregationOptions,
    ) -> Self {
        let (store, load) = EventLoader::new(log_dir).protocols(protocols).load();
        Self::from_store(&store, load, protocols, options)
    }

    /// Analyse an already loaded store.
    pub fn from_store(
        store: &EventStore,
        load: LoadReport,
        protocols: &[Protocol],
        options: AggregationOptions,
    ) -> Self {
        let aggregator = Aggregator::new(options);

        let protocols = protocols
            .iter()
            .map(|&protocol| {
                let correlation = Correlator::correlate(store, protocol);
                let summary = aggregator.summarize(&correlation.events);
                info!(
                    protocol = %protocol,
                    events = correlation.events.len(),
                    groups = summary.len(),
                    "Aggregated protocol"
                );
                ProtocolReport {
                    protocol,
                    events: correlation.events,
                    summary,
                    delivery: correlation.delivery,
                }
            })
            .collect();

        Self { load, protocols }
    }

    /// Report for one protocol, if it was part of the run.
    pub fn protocol(&self, protocol: Protocol) -> Option<&ProtocolReport> {
        self.protocols.iter().find(|p| p.protocol == protocol)
    }

    /// Hand every table to `sink`; empty tables are emitted too.
    pub fn emit<S: TableSink>(&self, sink: &mut S) -> Result<(), S::Error> {
        for report in &self.protocols {
            sink.write_events(report.protocol, &report.events)?;
            sink.write_summary(report.protocol, &report.summary)?;
        }
        Ok(())
    }
}
