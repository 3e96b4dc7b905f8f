// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! # Record Store
//!
//! File-backed persistence for the settlement service. All data lives under
//! `/data`, a mounted volume owned exclusively by this process.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/
//!   wallets/
//!     issuer.json            # Singleton institutional rows
//!     distributor.json
//!     escrow.json
//!     student-{id}.json      # One per student
//!   students/
//!     {student_id}.json      # Cached balance and wallet linkage
//!   student_tasks/
//!     {student_task_id}.json # Approval state machine rows
//!   vouchers/
//!     {voucher_token}.json   # Confirmed redemptions
//!   reconciliation/
//!     {date}.jsonl           # Ledger/off-chain discrepancies
//!   audit/
//!     {date}.jsonl           # Daily audit logs
//! ```
//!
//! ## Important Notes
//!
//! - Row writes go through a temp-file-and-rename so a crash never leaves a
//!   half-written row.
//! - Read-modify-write mutations go through [`RecordStore::mutate_json`],
//!   which holds the store-wide write lock.
//! - Secret seeds live only in wallet rows; they never reach logs or the
//!   audit store.

pub mod audit;
pub mod paths;
pub mod record_fs;
pub mod repository;

pub use audit::{AuditEvent, AuditEventType, AuditRepository};
pub use paths::StoragePaths;
pub use record_fs::{RecordStore, StorageError, StorageResult};
pub use repository::{
    voucher_token, ReconciliationEvent, ReconciliationKind, ReconciliationRepository,
    RedeemVoucher, StellarWalletRecord, StudentRecord, StudentRepository, StudentTaskRecord,
    StudentTaskRepository, TaskStatus, VoucherRepository, VoucherStatus, WalletRepository,
    WalletRole,
};
