// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Path constants and utilities for the record-store layout.

use std::path::{Path, PathBuf};

/// Base directory for all persistent records.
/// In production this is a mounted volume owned exclusively by this service.
pub const DATA_ROOT: &str = "/data";

/// Storage path utilities for the record store.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    root: PathBuf,
}

impl Default for StoragePaths {
    fn default() -> Self {
        Self::new(DATA_ROOT)
    }
}

impl StoragePaths {
    /// Create a new StoragePaths with a custom root (useful for testing).
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory for all data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ========== Wallet Paths ==========

    /// Directory containing all wallet rows.
    pub fn wallets_dir(&self) -> PathBuf {
        self.root.join("wallets")
    }

    /// Path to a singleton institutional wallet row (issuer/distributor/escrow).
    pub fn institution_wallet(&self, role: &str) -> PathBuf {
        self.wallets_dir().join(format!("{role}.json"))
    }

    /// Path to a student wallet row.
    pub fn student_wallet(&self, student_id: &str) -> PathBuf {
        self.wallets_dir().join(format!("student-{student_id}.json"))
    }

    // ========== Student Paths ==========

    /// Directory containing all student rows.
    pub fn students_dir(&self) -> PathBuf {
        self.root.join("students")
    }

    /// Path to a specific student row.
    pub fn student(&self, student_id: &str) -> PathBuf {
        self.students_dir().join(format!("{student_id}.json"))
    }

    // ========== Student Task Paths ==========

    /// Directory containing all student-task rows.
    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("student_tasks")
    }

    /// Path to a specific student-task row.
    pub fn student_task(&self, student_task_id: &str) -> PathBuf {
        self.tasks_dir().join(format!("{student_task_id}.json"))
    }

    // ========== Redeem Voucher Paths ==========

    /// Directory containing all redeem vouchers.
    pub fn vouchers_dir(&self) -> PathBuf {
        self.root.join("vouchers")
    }

    /// Path to a specific voucher row.
    pub fn voucher(&self, voucher_uuid: &str) -> PathBuf {
        self.vouchers_dir().join(format!("{voucher_uuid}.json"))
    }

    // ========== Reconciliation Log Paths ==========

    /// Directory containing the reconciliation event log.
    pub fn reconciliation_dir(&self) -> PathBuf {
        self.root.join("reconciliation")
    }

    /// Path to a daily reconciliation events file (JSONL format).
    pub fn reconciliation_events_file(&self, date: &str) -> PathBuf {
        self.reconciliation_dir().join(format!("{date}.jsonl"))
    }

    // ========== Audit Log Paths ==========

    /// Directory containing audit logs.
    pub fn audit_dir(&self) -> PathBuf {
        self.root.join("audit")
    }

    /// Path to a daily audit events file (JSONL format).
    pub fn audit_events_file(&self, date: &str) -> PathBuf {
        self.audit_dir().join(format!("{date}.jsonl"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths_use_data_root() {
        let paths = StoragePaths::default();
        assert_eq!(paths.root(), Path::new("/data"));
    }

    #[test]
    fn custom_root_for_testing() {
        let paths = StoragePaths::new("/tmp/test-data");
        assert_eq!(paths.root(), Path::new("/tmp/test-data"));
        assert_eq!(
            paths.institution_wallet("issuer"),
            PathBuf::from("/tmp/test-data/wallets/issuer.json")
        );
    }

    #[test]
    fn wallet_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(paths.wallets_dir(), PathBuf::from("/data/wallets"));
        assert_eq!(
            paths.institution_wallet("distributor"),
            PathBuf::from("/data/wallets/distributor.json")
        );
        assert_eq!(
            paths.student_wallet("stu-1"),
            PathBuf::from("/data/wallets/student-stu-1.json")
        );
    }

    #[test]
    fn record_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(
            paths.student("stu-1"),
            PathBuf::from("/data/students/stu-1.json")
        );
        assert_eq!(
            paths.student_task("st-9"),
            PathBuf::from("/data/student_tasks/st-9.json")
        );
        assert_eq!(
            paths.voucher("abc123"),
            PathBuf::from("/data/vouchers/abc123.json")
        );
    }

    #[test]
    fn log_paths_are_correct() {
        let paths = StoragePaths::default();
        assert_eq!(
            paths.audit_events_file("2026-08-29"),
            PathBuf::from("/data/audit/2026-08-29.jsonl")
        );
        assert_eq!(
            paths.reconciliation_events_file("2026-08-29"),
            PathBuf::from("/data/reconciliation/2026-08-29.jsonl")
        );
    }
}
