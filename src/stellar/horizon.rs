// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! HTTP client for the Horizon ledger gateway.
//!
//! Three wire interactions cover everything the settlement core needs:
//! `GET /accounts/{id}` for sequence numbers and balances, `POST
//! /transactions` with a form-encoded base64 envelope for submission, and a
//! `GET` against the friendbot faucet for account activation on test
//! networks.
//!
//! Funding is asynchronous on the ledger side, so activation is observed by
//! bounded polling of the account endpoint with exponential backoff rather
//! than a fixed settle delay. Rejections preserve the gateway's own
//! `result_codes` verbatim; a stale sequence number makes blind retry
//! unsafe, so nothing here retries a submission.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::asset::RewardAsset;
use super::network::NetworkConfig;
use super::tx::{SignedEnvelope, TxError};

/// Initial delay between activation polls.
const ACTIVATION_POLL_INITIAL: Duration = Duration::from_millis(500);

/// Ceiling for the backoff between activation polls.
const ACTIVATION_POLL_CAP: Duration = Duration::from_secs(4);

/// Hard deadline for account activation to become observable.
const ACTIVATION_DEADLINE: Duration = Duration::from_secs(30);

/// Per-request HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from ledger gateway interactions.
#[derive(Debug, thiserror::Error)]
pub enum HorizonError {
    #[error("ledger gateway request failed: {0}")]
    Transport(String),

    #[error("account {0} not found on the ledger")]
    AccountNotFound(String),

    #[error("ledger response was invalid: {0}")]
    InvalidResponse(String),

    #[error("account activation failed: {0}")]
    ActivationFailed(String),

    #[error("transaction rejected by ledger: {transaction} [{}]", .operations.join(", "))]
    Rejected {
        transaction: String,
        operations: Vec<String>,
    },

    #[error("transaction encoding failed: {0}")]
    Encoding(#[from] TxError),
}

impl HorizonError {
    /// Whether a rejection was caused by a missing trustline on the
    /// destination. Callers surface this distinctly because the repair
    /// (link the asset) differs from every other rejection.
    pub fn is_missing_trustline(&self) -> bool {
        matches!(
            self,
            Self::Rejected { operations, .. }
                if operations.iter().any(|code| code == "op_no_trust")
        )
    }
}

/// One entry of an account's balance list.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountBalance {
    pub balance: String,
    pub asset_type: String,
    #[serde(default)]
    pub asset_code: Option<String>,
    #[serde(default)]
    pub asset_issuer: Option<String>,
}

/// Account state read from the gateway.
#[derive(Debug, Clone)]
pub struct AccountRecord {
    pub account_id: String,
    pub sequence: i64,
    pub balances: Vec<AccountBalance>,
}

impl AccountRecord {
    /// Sequence number the account's next transaction must carry.
    pub fn next_sequence(&self) -> i64 {
        self.sequence + 1
    }

    /// Whether the account holds a trustline for `asset`.
    pub fn has_trustline(&self, asset: &RewardAsset) -> bool {
        self.balances.iter().any(|b| {
            b.asset_code.as_deref() == Some(asset.code())
                && b.asset_issuer.as_deref() == Some(asset.issuer())
        })
    }
}

/// Result of a successful transaction submission.
#[derive(Debug, Clone)]
pub struct SubmitResult {
    /// Transaction hash as reported by the gateway.
    pub hash: String,
    /// Ledger number the transaction was included in, when reported.
    pub ledger: Option<i64>,
}

/// Horizon gateway client.
#[derive(Debug, Clone)]
pub struct HorizonClient {
    horizon_url: String,
    friendbot_url: Option<String>,
    passphrase: String,
    http: Client,
}

impl HorizonClient {
    /// Create a client for a built-in network configuration.
    pub fn new(network: &NetworkConfig) -> Result<Self, HorizonError> {
        Self::with_urls(
            network.horizon_url.to_string(),
            network.friendbot_url.map(str::to_string),
            network.passphrase.to_string(),
        )
    }

    /// Create a client from explicit URLs (environment overrides).
    pub fn with_urls(
        horizon_url: String,
        friendbot_url: Option<String>,
        passphrase: String,
    ) -> Result<Self, HorizonError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| HorizonError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            horizon_url: horizon_url.trim_end_matches('/').to_string(),
            friendbot_url,
            passphrase,
            http,
        })
    }

    /// Network passphrase this client signs against.
    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    /// Read an account's sequence number and balances.
    pub async fn load_account(&self, public_key: &str) -> Result<AccountRecord, HorizonError> {
        let url = format!("{}/accounts/{}", self.horizon_url, public_key);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| HorizonError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(HorizonError::AccountNotFound(public_key.to_string()));
        }
        if !response.status().is_success() {
            return Err(HorizonError::Transport(format!(
                "account read returned HTTP {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| HorizonError::InvalidResponse(e.to_string()))?;
        parse_account(public_key, &body)
    }

    /// Request a minimum-balance grant from the faucet for `public_key`.
    ///
    /// This only starts activation; the grant lands asynchronously. Callers
    /// must follow up with [`HorizonClient::wait_for_account`] before any
    /// operation that reads the account's sequence number.
    pub async fn fund_account(&self, public_key: &str) -> Result<(), HorizonError> {
        let Some(friendbot) = &self.friendbot_url else {
            return Err(HorizonError::ActivationFailed(
                "no faucet is configured for this network".to_string(),
            ));
        };

        let response = self
            .http
            .get(friendbot)
            .query(&[("addr", public_key)])
            .send()
            .await
            .map_err(|e| HorizonError::ActivationFailed(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(HorizonError::ActivationFailed(format!(
                "faucet returned HTTP {status}: {}",
                truncate(&detail, 200)
            )));
        }

        debug!(account = %public_key, "faucet funding requested");
        Ok(())
    }

    /// Poll until the account is observable on the ledger.
    ///
    /// Exponential backoff with a hard deadline; expiry surfaces an
    /// activation failure so dependent steps (trustline, mint) abort
    /// instead of proceeding against an unfunded account.
    pub async fn wait_for_account(&self, public_key: &str) -> Result<AccountRecord, HorizonError> {
        let deadline = tokio::time::Instant::now() + ACTIVATION_DEADLINE;
        let mut delay = ACTIVATION_POLL_INITIAL;

        loop {
            match self.load_account(public_key).await {
                Ok(account) => return Ok(account),
                Err(HorizonError::AccountNotFound(_)) => {}
                Err(err) => {
                    warn!(account = %public_key, error = %err, "activation poll failed, will retry");
                }
            }

            if tokio::time::Instant::now() + delay > deadline {
                return Err(HorizonError::ActivationFailed(format!(
                    "account {public_key} did not appear on the ledger within {}s",
                    ACTIVATION_DEADLINE.as_secs()
                )));
            }
            tokio::time::sleep(delay).await;
            delay = (delay * 2).min(ACTIVATION_POLL_CAP);
        }
    }

    /// Submit a signed envelope.
    ///
    /// A non-success submission result carries the gateway's transaction
    /// and per-operation result codes verbatim.
    pub async fn submit(&self, envelope: &SignedEnvelope) -> Result<SubmitResult, HorizonError> {
        let url = format!("{}/transactions", self.horizon_url);
        let encoded = envelope.to_base64()?;

        let response = self
            .http
            .post(&url)
            .form(&[("tx", encoded.as_str())])
            .send()
            .await
            .map_err(|e| HorizonError::Transport(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| HorizonError::InvalidResponse(e.to_string()))?;

        if status.is_success() {
            let result = parse_submit_success(&body)?;
            debug!(
                tx_hash = %result.hash,
                ledger = result.ledger,
                "transaction accepted"
            );
            Ok(result)
        } else {
            Err(parse_submit_error(&body))
        }
    }
}

/// Parse an account read response.
fn parse_account(public_key: &str, body: &Value) -> Result<AccountRecord, HorizonError> {
    let sequence = body
        .get("sequence")
        .and_then(Value::as_str)
        .ok_or_else(|| HorizonError::InvalidResponse("missing account sequence".to_string()))?
        .parse::<i64>()
        .map_err(|e| HorizonError::InvalidResponse(format!("bad sequence number: {e}")))?;

    let balances = body
        .get("balances")
        .cloned()
        .map(serde_json::from_value::<Vec<AccountBalance>>)
        .transpose()
        .map_err(|e| HorizonError::InvalidResponse(format!("bad balance list: {e}")))?
        .unwrap_or_default();

    Ok(AccountRecord {
        account_id: public_key.to_string(),
        sequence,
        balances,
    })
}

/// Parse a successful submission response.
fn parse_submit_success(body: &Value) -> Result<SubmitResult, HorizonError> {
    let hash = body
        .get("hash")
        .and_then(Value::as_str)
        .ok_or_else(|| HorizonError::InvalidResponse("missing transaction hash".to_string()))?
        .to_string();
    let ledger = body.get("ledger").and_then(Value::as_i64);
    Ok(SubmitResult { hash, ledger })
}

/// Extract result codes from a submission error response.
fn parse_submit_error(body: &Value) -> HorizonError {
    let transaction = body
        .pointer("/extras/result_codes/transaction")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let operations = body
        .pointer("/extras/result_codes/operations")
        .and_then(Value::as_array)
        .map(|codes| {
            codes
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    HorizonError::Rejected {
        transaction,
        operations,
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
