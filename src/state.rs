// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::stellar::{HorizonClient, SubmissionRegistry};
use crate::storage::RecordStore;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
    pub horizon: Arc<HorizonClient>,
    pub submissions: Arc<SubmissionRegistry>,
    /// Serializes institutional setup (provision, escrow creation) so two
    /// concurrent calls cannot both pass the existence check and fund
    /// duplicate accounts.
    pub provisioning: Arc<Mutex<()>>,
    /// Reward asset code (1-4 alphanumeric characters).
    pub asset_code: String,
}

impl AppState {
    pub fn new(store: RecordStore, horizon: HorizonClient, asset_code: String) -> Self {
        Self {
            store: Arc::new(store),
            horizon: Arc::new(horizon),
            submissions: Arc::new(SubmissionRegistry::new()),
            provisioning: Arc::new(Mutex::new(())),
            asset_code,
        }
    }
}
