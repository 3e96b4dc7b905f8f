// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Per-source-account submission serialization.
//!
//! Transactions from one account must reach the ledger in strict
//! sequence-number order. The issuer and distributor keys are shared across
//! concurrent requests, so sequence load, signing, and submission happen
//! under a per-account async lock. The registry is process-local, matching
//! the single-writer deployment model of this service.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per source public key.
#[derive(Debug, Default)]
pub struct SubmissionRegistry {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl SubmissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the submission lock for `source_public_key`.
    ///
    /// The guard must be held from the sequence-number read through the
    /// submission response; dropping it earlier reopens the race.
    pub async fn lock(&self, source_public_key: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().expect("submission registry poisoned");
            locks
                .entry(source_public_key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
