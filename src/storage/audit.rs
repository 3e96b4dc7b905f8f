// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Audit logging for custody-sensitive operations.
//!
//! Every provisioning, mint, payout, and redemption is appended to the
//! audit store. Secrets never appear here; events reference public keys and
//! row identifiers only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RecordStore, StorageResult};

/// Types of auditable events.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    // Institution events
    InstitutionProvisioned,
    EscrowCreated,
    TokensMinted,

    // Student wallet events
    StudentWalletCreated,
    TrustlineLinked,

    // Settlement events
    PayoutSettled,
    TokensRedeemed,

    // Failure events
    ReconciliationRequired,
}

/// An audit log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: String,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// Type of event.
    pub event_type: AuditEventType,
    /// Principal who triggered the event (admin or student id).
    pub actor_id: Option<String>,
    /// Resource affected (student_task_id, voucher_uuid, public key, ...).
    pub resource_id: Option<String>,
    /// Resource type (wallet, student_task, voucher, ...).
    pub resource_type: Option<String>,
    /// Additional details as JSON.
    pub details: Option<serde_json::Value>,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Error message if operation failed.
    pub error: Option<String>,
}

impl AuditEvent {
    /// Create a new audit event.
    pub fn new(event_type: AuditEventType) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type,
            actor_id: None,
            resource_id: None,
            resource_type: None,
            details: None,
            success: true,
            error: None,
        }
    }

    /// Set the acting principal.
    pub fn with_actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    /// Set the resource.
    pub fn with_resource(
        mut self,
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        self.resource_type = Some(resource_type.into());
        self.resource_id = Some(resource_id.into());
        self
    }

    /// Add details.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Mark as failed with error message.
    pub fn failed(mut self, error: impl Into<String>) -> Self {
        self.success = false;
        self.error = Some(error.into());
        self
    }
}

/// Repository for audit events.
pub struct AuditRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> AuditRepository<'a> {
    /// Create a new audit repository.
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Log an audit event.
    ///
    /// Events are appended to a daily log file in JSONL format.
    pub fn log(&self, event: &AuditEvent) -> StorageResult<()> {
        let date = event.timestamp.format("%Y-%m-%d").to_string();
        let path = self.store.paths().audit_events_file(&date);
        let line = serde_json::to_string(event)?;
        self.store.append_line(path, &line)
    }

    /// Read all events for a date (diagnostics and tests).
    pub fn events_for_date(&self, date: &str) -> StorageResult<Vec<AuditEvent>> {
        let path = self.store.paths().audit_events_file(date);
        self.store
            .read_lines(path)?
            .iter()
            .map(|line| serde_json::from_str(line).map_err(Into::into))
            .collect()
    }
}
