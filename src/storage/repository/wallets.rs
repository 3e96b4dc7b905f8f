// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Wallet rows: ledger identities and their custody state.
//!
//! ## Storage Layout
//!
//! ```text
//! /data/wallets/
//!   issuer.json          # singleton institutional rows
//!   distributor.json
//!   escrow.json
//!   student-{id}.json    # one per student
//! ```
//!
//! ## Security
//!
//! - Secret seeds are stored for issuer, distributor, and student rows
//!   (custodial signing). The escrow row holds no secret; it is returned
//!   once at creation for external archival.
//! - Wallet rows never serialize into API responses; handlers copy the
//!   public key out explicitly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{RecordStore, StorageError, StorageResult};

/// Role an account plays in the settlement protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletRole {
    /// Creates units of the asset by paying them out.
    Issuer,
    /// Institutional reserve that pays earned tokens to students.
    Distributor,
    /// Holding vault receiving redeemed tokens.
    Escrow,
    /// Per-student account.
    Student,
}

impl WalletRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Issuer => "issuer",
            Self::Distributor => "distributor",
            Self::Escrow => "escrow",
            Self::Student => "student",
        }
    }
}

/// A persisted wallet row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StellarWalletRecord {
    /// Protocol role of this account.
    pub role: WalletRole,
    /// Account public key in strkey form.
    pub public_key: String,
    /// Secret seed; `None` for escrow (archived externally at creation).
    pub secret_key: Option<String>,
    /// Owning principal (student id), `None` for institutional rows.
    pub owner_id: Option<String>,
    /// Whether the multisig hardening transaction has confirmed. Student
    /// rows start `false`; the flag flips only after the signer set is
    /// live, so an interrupted setup can be resumed.
    #[serde(default)]
    pub hardened: bool,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
}

impl StellarWalletRecord {
    /// Build an institutional row (issuer/distributor/escrow).
    pub fn institutional(role: WalletRole, public_key: String, secret_key: Option<String>) -> Self {
        Self {
            role,
            public_key,
            secret_key,
            owner_id: None,
            hardened: false,
            created_at: Utc::now(),
        }
    }

    /// Build a student row.
    pub fn student(student_id: &str, public_key: String, secret_key: String) -> Self {
        Self {
            role: WalletRole::Student,
            public_key,
            secret_key: Some(secret_key),
            owner_id: Some(student_id.to_string()),
            hardened: false,
            created_at: Utc::now(),
        }
    }
}

/// Repository for wallet rows.
pub struct WalletRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> WalletRepository<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// Check if a singleton institutional row exists.
    pub fn institution_exists(&self, role: WalletRole) -> bool {
        self.store
            .exists(self.store.paths().institution_wallet(role.as_str()))
    }

    /// Load a singleton institutional row.
    pub fn get_institution(&self, role: WalletRole) -> StorageResult<StellarWalletRecord> {
        let path = self.store.paths().institution_wallet(role.as_str());
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("{} wallet", role.as_str())));
        }
        self.store.read_json(path)
    }

    /// Persist a singleton institutional row.
    ///
    /// Exactly one row may exist per role; a second creation is rejected
    /// rather than silently overwriting the institution's keys.
    pub fn create_institution(&self, record: &StellarWalletRecord) -> StorageResult<()> {
        let role = record.role;
        let path = self.store.paths().institution_wallet(role.as_str());
        if self.store.exists(&path) {
            return Err(StorageError::AlreadyExists(format!(
                "{} wallet",
                role.as_str()
            )));
        }
        self.store.write_json(path, record)
    }

    /// Check if a student wallet row exists.
    pub fn student_exists(&self, student_id: &str) -> bool {
        self.store
            .exists(self.store.paths().student_wallet(student_id))
    }

    /// Load a student wallet row.
    pub fn get_student(&self, student_id: &str) -> StorageResult<StellarWalletRecord> {
        let path = self.store.paths().student_wallet(student_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!(
                "student wallet for {student_id}"
            )));
        }
        self.store.read_json(path)
    }

    /// Persist a student wallet row.
    pub fn create_student(&self, record: &StellarWalletRecord) -> StorageResult<()> {
        let Some(student_id) = record.owner_id.as_deref() else {
            return Err(StorageError::InvalidState(
                "student wallet row requires an owner".to_string(),
            ));
        };
        let path = self.store.paths().student_wallet(student_id);
        if self.store.exists(&path) {
            return Err(StorageError::AlreadyExists(format!(
                "student wallet for {student_id}"
            )));
        }
        self.store.write_json(path, record)
    }

    /// Mark a student wallet as hardened once the signer set is confirmed.
    pub fn mark_student_hardened(&self, student_id: &str) -> StorageResult<()> {
        let path = self.store.paths().student_wallet(student_id);
        self.store
            .mutate_json::<StellarWalletRecord, ()>(path, |wallet| {
                wallet.hardened = true;
                Ok(())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StoragePaths;

    fn test_store() -> (tempfile::TempDir, RecordStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut store = RecordStore::new(StoragePaths::new(dir.path()));
        store.initialize().expect("initialize");
        (dir, store)
    }

    #[test]
    fn institutional_rows_are_singletons() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);

        let issuer = StellarWalletRecord::institutional(
            WalletRole::Issuer,
            "GISSUER".to_string(),
            Some("SISSUER".to_string()),
        );
        repo.create_institution(&issuer).unwrap();
        assert!(repo.institution_exists(WalletRole::Issuer));

        let duplicate = repo.create_institution(&issuer);
        assert!(matches!(duplicate, Err(StorageError::AlreadyExists(_))));

        let loaded = repo.get_institution(WalletRole::Issuer).unwrap();
        assert_eq!(loaded.public_key, "GISSUER");
        assert_eq!(loaded.secret_key.as_deref(), Some("SISSUER"));
    }

    #[test]
    fn roles_do_not_collide() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);

        repo.create_institution(&StellarWalletRecord::institutional(
            WalletRole::Issuer,
            "GISSUER".to_string(),
            Some("SISSUER".to_string()),
        ))
        .unwrap();
        repo.create_institution(&StellarWalletRecord::institutional(
            WalletRole::Distributor,
            "GDIST".to_string(),
            Some("SDIST".to_string()),
        ))
        .unwrap();

        assert_eq!(
            repo.get_institution(WalletRole::Distributor)
                .unwrap()
                .public_key,
            "GDIST"
        );
    }

    #[test]
    fn escrow_row_stores_no_secret() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);

        repo.create_institution(&StellarWalletRecord::institutional(
            WalletRole::Escrow,
            "GESCROW".to_string(),
            None,
        ))
        .unwrap();

        let loaded = repo.get_institution(WalletRole::Escrow).unwrap();
        assert!(loaded.secret_key.is_none());
    }

    #[test]
    fn student_wallet_round_trip_and_duplicate() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);

        let record =
            StellarWalletRecord::student("stu-1", "GSTU".to_string(), "SSTU".to_string());
        repo.create_student(&record).unwrap();
        assert!(repo.student_exists("stu-1"));
        assert!(!repo.student_exists("stu-2"));

        let loaded = repo.get_student("stu-1").unwrap();
        assert_eq!(loaded.owner_id.as_deref(), Some("stu-1"));
        assert_eq!(loaded.role, WalletRole::Student);

        assert!(matches!(
            repo.create_student(&record),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn student_wallet_hardening_flag_starts_false_and_flips_once_marked() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);

        repo.create_student(&StellarWalletRecord::student(
            "stu-1",
            "GSTU".to_string(),
            "SSTU".to_string(),
        ))
        .unwrap();
        assert!(!repo.get_student("stu-1").unwrap().hardened);

        repo.mark_student_hardened("stu-1").unwrap();
        assert!(repo.get_student("stu-1").unwrap().hardened);
    }

    #[test]
    fn missing_rows_are_not_found() {
        let (_dir, store) = test_store();
        let repo = WalletRepository::new(&store);

        assert!(matches!(
            repo.get_institution(WalletRole::Distributor),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            repo.get_student("ghost"),
            Err(StorageError::NotFound(_))
        ));
    }
}
