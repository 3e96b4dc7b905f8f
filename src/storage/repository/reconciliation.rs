// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Reconciliation event log.
//!
//! When a ledger payment has already confirmed but the off-chain side of a
//! settlement fails to persist, the books disagree with the chain. Those
//! cases land here as append-only events an operator works through by hand.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{RecordStore, StorageResult};

/// What went wrong after ledger confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationKind {
    /// Payout confirmed on-chain; task status or cached balance not updated.
    PayoutOffChainUpdateFailed,
    /// Redemption confirmed on-chain; voucher or cached balance not updated.
    RedemptionOffChainUpdateFailed,
}

/// One discrepancy between the ledger and the record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconciliationEvent {
    pub kind: ReconciliationKind,
    pub student_id: String,
    /// Token amount of the confirmed payment.
    pub amount: i64,
    /// Hash of the confirmed ledger transaction, the anchor for manual repair.
    pub tx_hash: String,
    /// What failed off-chain.
    pub detail: String,
    pub timestamp: DateTime<Utc>,
}

impl ReconciliationEvent {
    pub fn new(
        kind: ReconciliationKind,
        student_id: &str,
        amount: i64,
        tx_hash: &str,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            student_id: student_id.to_string(),
            amount,
            tx_hash: tx_hash.to_string(),
            detail: detail.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Repository for reconciliation events.
pub struct ReconciliationRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> ReconciliationRepository<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Append an event to the daily JSONL log.
    pub fn log(&self, event: &ReconciliationEvent) -> StorageResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let path = self.store.paths().reconciliation_events_file(&date);
        let line = serde_json::to_string(event)?;
        self.store.append_line(path, &line)
    }

    /// Read all events for a date (operator tooling and tests).
    pub fn events_for_date(&self, date: &str) -> StorageResult<Vec<ReconciliationEvent>> {
        let path = self.store.paths().reconciliation_events_file(date);
        self.store
            .read_lines(path)?
            .iter()
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }
}
