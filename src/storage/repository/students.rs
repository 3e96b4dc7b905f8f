// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Student rows with the cached token balance.
//!
//! `tokens` mirrors the on-chain balance and is mutated only by the
//! settlement and redemption handlers, after ledger confirmation, through
//! the store's atomic mutation primitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::super::{RecordStore, StorageError, StorageResult};

/// A persisted student row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentRecord {
    /// Stable student identifier.
    pub student_id: String,
    /// Display name, when known.
    pub display_name: Option<String>,
    /// Public key of the student's wallet, once provisioned.
    pub stellar_public_key: Option<String>,
    /// Cached token balance mirrored from the ledger.
    pub tokens: i64,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl StudentRecord {
    pub fn new(student_id: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            display_name: None,
            stellar_public_key: None,
            tokens: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Repository for student rows.
pub struct StudentRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> StudentRepository<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    pub fn exists(&self, student_id: &str) -> bool {
        self.store.exists(self.store.paths().student(student_id))
    }

    pub fn get(&self, student_id: &str) -> StorageResult<StudentRecord> {
        let path = self.store.paths().student(student_id);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("student {student_id}")));
        }
        self.store.read_json(path)
    }

    pub fn create(&self, record: &StudentRecord) -> StorageResult<()> {
        let path = self.store.paths().student(&record.student_id);
        if self.store.exists(&path) {
            return Err(StorageError::AlreadyExists(format!(
                "student {}",
                record.student_id
            )));
        }
        self.store.write_json(path, record)
    }

    /// Attach the wallet public key after provisioning.
    pub fn set_public_key(&self, student_id: &str, public_key: &str) -> StorageResult<()> {
        let path = self.store.paths().student(student_id);
        self.store
            .mutate_json::<StudentRecord, ()>(path, |student| {
                student.stellar_public_key = Some(public_key.to_string());
                student.updated_at = Utc::now();
                Ok(())
            })
    }

    /// Atomically adjust the cached balance by `delta`, returning the new
    /// balance. Negative deltas reject when they would drive the cache
    /// below zero, which signals a stale mirror rather than a valid state.
    pub fn adjust_tokens(&self, student_id: &str, delta: i64) -> StorageResult<i64> {
        let path = self.store.paths().student(student_id);
        self.store
            .mutate_json::<StudentRecord, i64>(path, |student| {
                let next = student.tokens.checked_add(delta).ok_or_else(|| {
                    StorageError::InvalidState(format!(
                        "balance overflow for student {student_id}"
                    ))
                })?;
                if next < 0 {
                    return Err(StorageError::InvalidState(format!(
                        "cached balance for student {student_id} would become negative"
                    )));
                }
                student.tokens = next;
                student.updated_at = Utc::now();
                Ok(next)
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
    fn create_get_and_duplicate() {
        let (_dir, store) = test_store();
        let repo = StudentRepository::new(&store);

        let record = StudentRecord::new("stu-1");
        repo.create(&record).unwrap();
        assert!(repo.exists("stu-1"));

        let loaded = repo.get("stu-1").unwrap();
        assert_eq!(loaded.tokens, 0);
        assert!(loaded.stellar_public_key.is_none());

        assert!(matches!(
            repo.create(&record),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn set_public_key_updates_row() {
        let (_dir, store) = test_store();
        let repo = StudentRepository::new(&store);

        repo.create(&StudentRecord::new("stu-1")).unwrap();
        repo.set_public_key("stu-1", "GSTU").unwrap();

        assert_eq!(
            repo.get("stu-1").unwrap().stellar_public_key.as_deref(),
            Some("GSTU")
        );
    }

    #[test]
    fn adjust_tokens_increments_and_decrements() {
        let (_dir, store) = test_store();
        let repo = StudentRepository::new(&store);

        repo.create(&StudentRecord::new("stu-1")).unwrap();
        assert_eq!(repo.adjust_tokens("stu-1", 15).unwrap(), 15);
        assert_eq!(repo.adjust_tokens("stu-1", 35).unwrap(), 50);
        assert_eq!(repo.adjust_tokens("stu-1", -30).unwrap(), 20);
        assert_eq!(repo.get("stu-1").unwrap().tokens, 20);
    }

    #[test]
    fn adjust_tokens_rejects_negative_balance() {
        let (_dir, store) = test_store();
        let repo = StudentRepository::new(&store);

        repo.create(&StudentRecord::new("stu-1")).unwrap();
        repo.adjust_tokens("stu-1", 10).unwrap();

        let err = repo.adjust_tokens("stu-1", -11).unwrap_err();
        assert!(matches!(err, StorageError::InvalidState(_)));
        assert_eq!(repo.get("stu-1").unwrap().tokens, 10);
    }

    #[test]
    fn adjust_tokens_missing_student_is_not_found() {
        let (_dir, store) = test_store();
        let repo = StudentRepository::new(&store);
        assert!(matches!(
            repo.adjust_tokens("ghost", 1),
            Err(StorageError::NotFound(_))
        ));
    }
}
