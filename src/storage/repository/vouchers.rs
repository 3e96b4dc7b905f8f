// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Redeem vouchers.
//!
//! A voucher row exists iff a confirmed ledger payment to escrow exists.
//! The voucher token doubles as the transaction memo and as the dedup key a
//! redemption desk scans, so insertion rejects duplicates outright.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::{RecordStore, StorageError, StorageResult};

/// Voucher fulfillment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    /// On-chain payment confirmed and off-chain state recorded.
    Completed,
    /// Reward handed out; set by the redemption desk, not this service.
    Fulfilled,
}

/// A persisted redemption voucher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemVoucher {
    /// Memo token carried by the escrow payment; globally unique.
    pub voucher_uuid: String,
    /// Redeeming student.
    pub student_id: String,
    /// Reward being redeemed.
    pub reward_id: String,
    /// Token amount paid to escrow.
    pub amount: i64,
    /// Hash of the confirmed ledger transaction.
    pub stellar_tx_hash: String,
    /// Fulfillment state.
    pub status: VoucherStatus,
    /// When the voucher was recorded.
    pub created_at: DateTime<Utc>,
}

/// Generate a fresh voucher token.
///
/// Derived from a v4 UUID but truncated to fit the ledger's 28-byte text
/// memo; 96 bits of randomness keeps collisions out of reach.
pub fn voucher_token() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    id[..24].to_string()
}

/// Repository for redeem vouchers.
pub struct VoucherRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> VoucherRepository<'a> {
    pub fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    pub fn exists(&self, voucher_uuid: &str) -> bool {
        self.store.exists(self.store.paths().voucher(voucher_uuid))
    }

    pub fn get(&self, voucher_uuid: &str) -> StorageResult<RedeemVoucher> {
        let path = self.store.paths().voucher(voucher_uuid);
        if !self.store.exists(&path) {
            return Err(StorageError::NotFound(format!("voucher {voucher_uuid}")));
        }
        self.store.read_json(path)
    }

    /// Insert a voucher row; the token is a dedup key, so an existing row
    /// rejects the insert.
    pub fn insert(&self, voucher: &RedeemVoucher) -> StorageResult<()> {
        let path = self.store.paths().voucher(&voucher.voucher_uuid);
        if self.store.exists(&path) {
            return Err(StorageError::AlreadyExists(format!(
                "voucher {}",
                voucher.voucher_uuid
            )));
        }
        self.store.write_json(path, voucher)
    }

    /// All voucher tokens on record.
    pub fn list_tokens(&self) -> StorageResult<Vec<String>> {
        self.store.list_rows(self.store.paths().vouchers_dir())
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

    fn test_voucher(token: &str) -> RedeemVoucher {
        RedeemVoucher {
            voucher_uuid: token.to_string(),
            student_id: "stu-1".to_string(),
            reward_id: "rw-1".to_string(),
            amount: 30,
            stellar_tx_hash: "deadbeef".to_string(),
            status: VoucherStatus::Completed,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn voucher_tokens_fit_the_memo_and_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            let token = voucher_token();
            assert!(token.len() <= 28, "token exceeds memo limit");
            assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
            assert!(seen.insert(token), "duplicate voucher token");
        }
    }

    #[test]
    fn insert_get_and_duplicate_rejection() {
        let (_dir, store) = test_store();
        let repo = VoucherRepository::new(&store);

        let voucher = test_voucher("abc123");
        repo.insert(&voucher).unwrap();
        assert!(repo.exists("abc123"));

        let loaded = repo.get("abc123").unwrap();
        assert_eq!(loaded.amount, 30);
        assert_eq!(loaded.status, VoucherStatus::Completed);

        assert!(matches!(
            repo.insert(&voucher),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn list_tokens_covers_all_rows() {
        let (_dir, store) = test_store();
        let repo = VoucherRepository::new(&store);

        repo.insert(&test_voucher("token-b")).unwrap();
        repo.insert(&test_voucher("token-a")).unwrap();

        assert_eq!(repo.list_tokens().unwrap(), vec!["token-a", "token-b"]);
    }
}
