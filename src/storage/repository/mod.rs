// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Repository layer providing typed access to the record store.
//!
//! Each repository provides CRUD operations for a specific entity type,
//! using the RecordStore for all file operations.

pub mod reconciliation;
pub mod students;
pub mod tasks;
pub mod vouchers;
pub mod wallets;

pub use reconciliation::{ReconciliationEvent, ReconciliationKind, ReconciliationRepository};
pub use students::{StudentRecord, StudentRepository};
pub use tasks::{StudentTaskRecord, StudentTaskRepository, TaskStatus};
pub use vouchers::{voucher_token, RedeemVoucher, VoucherRepository, VoucherStatus};
pub use wallets::{StellarWalletRecord, WalletRepository, WalletRole};
