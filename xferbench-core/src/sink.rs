// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Row/column sink interface for correlated output.
//!
//! The engine hands finished tables to a [`TableSink`]; where they end up
//! (delimited files, a JSON report, memory) is the sink's business.

use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::aggregator::SummaryRow;
use crate::correlator::TransferEvent;
use crate::types::Protocol;

/// Destination for per-protocol events and summary tables.
///
/// Both methods are called once per protocol, even when the table is empty.
pub trait TableSink {
    type Error;

    fn write_events(&mut self, protocol: Protocol, events: &[TransferEvent])
        -> Result<(), Self::Error>;

    fn write_summary(&mut self, protocol: Protocol, summary: &[SummaryRow])
        -> Result<(), Self::Error>;
}

/// Keeps every table in memory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySink {
    pub events: BTreeMap<Protocol, Vec<TransferEvent>>,
    pub summaries: BTreeMap<Protocol, Vec<SummaryRow>>,
}

impl TableSink for MemorySink {
    type Error = Infallible;

    fn write_events(
        &mut self,
        protocol: Protocol,
        events: &[TransferEvent],
    ) -> Result<(), Self::Error> {
        self.events.insert(protocol, events.to_vec());
        Ok(())
    }

    fn write_summary(
        &mut self,
        protocol: Protocol,
        summary: &[SummaryRow],
    ) -> Result<(), Self::Error> {
        self.summaries.insert(protocol, summary.to_vec());
        Ok(())
    }
}
