// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Student wallet endpoints.
//!
//! Wallet creation activates a fresh account, links the reward asset, and
//! hardens the account with a multisig signer set: the master key is
//! demoted to weight 0 and three weight-1 signers (device plus two
//! recovery keys) are installed under thresholds low=1 / medium=2 / high=2.
//! The device secret leaves the process exactly once, in the response that
//! completes hardening; recovery secrets are discarded.
//!
//! Hardening state is tracked on the wallet row. A setup interrupted after
//! funding (trustline or hardening submission failed) is resumed on the
//! next invocation with a fresh device key, instead of leaving the account
//! stuck under its master key forever.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    api::{require_institution, reward_asset, signing_keypair},
    error::ApiError,
    state::AppState,
    stellar::{AccountRecord, Keypair, TxBuilder},
    storage::{
        AuditEvent, AuditEventType, AuditRepository, StellarWalletRecord, StorageError,
        StudentRecord, StudentRepository, WalletRepository, WalletRole,
    },
};

/// Request to create a student wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateStudentWalletRequest {
    pub student_id: String,
}

/// Response after creating (or re-reading) a student wallet.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateStudentWalletResponse {
    /// Student account public key.
    pub stellar_public_key: String,
    /// Device signer secret seed. Present only in the response that
    /// completes hardening; never stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_secret_key: Option<String>,
    /// Whether this call created the wallet row.
    pub created: bool,
}

/// Request to (re-)establish a student's reward asset trustline.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkTokenRequest {
    pub student_id: String,
}

/// Response after a trustline submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LinkTokenResponse {
    /// Hash of the confirmed change-trust transaction.
    pub tx_hash: String,
}

/// Establish the trustline (when the institution exists and the account
/// lacks one) and submit the hardening transaction.
///
/// Returns the fresh device secret and whether a trustline was submitted.
/// The trustline must precede hardening: once the master key is demoted it
/// can no longer sign a change-trust on its own.
async fn link_and_harden(
    state: &AppState,
    wallets: &WalletRepository<'_>,
    master: &Keypair,
    account: &AccountRecord,
) -> Result<(String, bool), ApiError> {
    let master_public = master.public_key();
    let mut sequence = account.next_sequence();

    let mut trustline_linked = false;
    if wallets.institution_exists(WalletRole::Issuer) {
        let issuer_row = wallets.get_institution(WalletRole::Issuer)?;
        let asset = reward_asset(state, &issuer_row.public_key)?;
        if !account.has_trustline(&asset) {
            let envelope = TxBuilder::new(state.horizon.passphrase(), &master_public, sequence)?
                .change_trust(&asset)?
                .sign(master)?;
            state.horizon.submit(&envelope).await?;
            sequence += 1;
            trustline_linked = true;
        }
    }

    // Hardening: three weight-1 signers, then demote the master key. One
    // transaction so the account is never left with a partial signer set.
    let device = Keypair::generate();
    let recovery_one = Keypair::generate();
    let recovery_two = Keypair::generate();
    let envelope = TxBuilder::new(state.horizon.passphrase(), &master_public, sequence)?
        .add_signer(&device.public_key(), 1)?
        .add_signer(&recovery_one.public_key(), 1)?
        .add_signer(&recovery_two.public_key(), 1)?
        .set_thresholds(0, 1, 2, 2)
        .sign(master)?;
    state.horizon.submit(&envelope).await?;

    Ok((device.secret_seed(), trustline_linked))
}

/// Create and harden a student wallet.
///
/// When the institution is not yet provisioned the trustline step is
/// skipped; `link-token` repairs it later. An existing hardened wallet
/// returns its public key without a device secret. An existing wallet
/// whose hardening never confirmed resumes setup and issues a fresh
/// device secret.
#[utoipa::path(
    post,
    path = "/v1/students/wallet",
    tag = "Students",
    request_body = CreateStudentWalletRequest,
    responses(
        (status = 201, description = "Wallet created", body = CreateStudentWalletResponse),
        (status = 200, description = "Wallet already exists (hardening resumed if it was incomplete)", body = CreateStudentWalletResponse),
        (status = 502, description = "Ledger activation or submission failed")
    )
)]
pub async fn create_wallet(
    State(state): State<AppState>,
    Json(request): Json<CreateStudentWalletRequest>,
) -> Result<(StatusCode, Json<CreateStudentWalletResponse>), ApiError> {
    if request.student_id.trim().is_empty() {
        return Err(ApiError::bad_request("student_id must not be empty"));
    }

    let wallets = WalletRepository::new(&state.store);
    let students = StudentRepository::new(&state.store);

    if wallets.student_exists(&request.student_id) {
        let row = wallets.get_student(&request.student_id)?;
        if row.hardened {
            return Ok((
                StatusCode::OK,
                Json(CreateStudentWalletResponse {
                    stellar_public_key: row.public_key,
                    device_secret_key: None,
                    created: false,
                }),
            ));
        }

        // Resume an interrupted setup: the account is funded but the
        // signer set never confirmed, so the master key still signs.
        let master = signing_keypair(&row)?;
        let (device_secret, trustline_linked) = {
            let _guard = state.submissions.lock(&row.public_key).await;
            let account = state.horizon.load_account(&row.public_key).await?;
            link_and_harden(&state, &wallets, &master, &account).await?
        };
        wallets.mark_student_hardened(&request.student_id)?;

        let audit = AuditRepository::new(&state.store);
        let event = AuditEvent::new(AuditEventType::StudentWalletCreated)
            .with_actor(&request.student_id)
            .with_resource("wallet", &row.public_key)
            .with_details(serde_json::json!({
                "trustline_linked": trustline_linked,
                "resumed": true,
            }));
        if let Err(e) = audit.log(&event) {
            warn!(error = %e, "failed to write audit event");
        }

        info!(
            student = %request.student_id,
            account = %row.public_key,
            trustline_linked,
            "student wallet hardening resumed and completed"
        );

        return Ok((
            StatusCode::OK,
            Json(CreateStudentWalletResponse {
                stellar_public_key: row.public_key,
                device_secret_key: Some(device_secret),
                created: false,
            }),
        ));
    }

    let master = Keypair::generate();
    let master_public = master.public_key();

    state.horizon.fund_account(&master_public).await?;
    let account = state.horizon.wait_for_account(&master_public).await?;

    // Persist custody as soon as the account exists on the ledger; a
    // failure in a later step must not orphan a funded account.
    wallets.create_student(&StellarWalletRecord::student(
        &request.student_id,
        master_public.clone(),
        master.secret_seed(),
    ))?;
    if !students.exists(&request.student_id) {
        students.create(&StudentRecord::new(&request.student_id))?;
    }
    students.set_public_key(&request.student_id, &master_public)?;

    let (device_secret, trustline_linked) =
        link_and_harden(&state, &wallets, &master, &account).await?;
    wallets.mark_student_hardened(&request.student_id)?;

    let audit = AuditRepository::new(&state.store);
    let event = AuditEvent::new(AuditEventType::StudentWalletCreated)
        .with_actor(&request.student_id)
        .with_resource("wallet", &master_public)
        .with_details(serde_json::json!({ "trustline_linked": trustline_linked }));
    if let Err(e) = audit.log(&event) {
        warn!(error = %e, "failed to write audit event");
    }

    info!(
        student = %request.student_id,
        account = %master_public,
        trustline_linked,
        "student wallet created and hardened"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateStudentWalletResponse {
            stellar_public_key: master_public,
            device_secret_key: Some(device_secret),
            created: true,
        }),
    ))
}

/// Re-establish the reward asset trustline for a student.
///
/// Safe to repeat: re-establishing an existing trustline with the same
/// limit is a no-op on the ledger.
#[utoipa::path(
    post,
    path = "/v1/students/link-token",
    tag = "Students",
    request_body = LinkTokenRequest,
    responses(
        (status = 200, description = "Trustline established", body = LinkTokenResponse),
        (status = 422, description = "Student has no wallet or institution is not configured"),
        (status = 502, description = "Ledger rejected the transaction")
    )
)]
pub async fn link_token(
    State(state): State<AppState>,
    Json(request): Json<LinkTokenRequest>,
) -> Result<Json<LinkTokenResponse>, ApiError> {
    let wallets = WalletRepository::new(&state.store);

    let row = match wallets.get_student(&request.student_id) {
        Ok(row) => row,
        Err(StorageError::NotFound(_)) => {
            return Err(ApiError::unprocessable(format!(
                "student {} has no wallet",
                request.student_id
            )));
        }
        Err(e) => return Err(e.into()),
    };
    let student = signing_keypair(&row)?;

    let issuer_row = require_institution(&wallets, WalletRole::Issuer)?;
    let asset = reward_asset(&state, &issuer_row.public_key)?;

    let result = {
        let _guard = state.submissions.lock(&row.public_key).await;
        let account = state.horizon.load_account(&row.public_key).await?;
        let envelope = TxBuilder::new(
            state.horizon.passphrase(),
            &row.public_key,
            account.next_sequence(),
        )?
        .change_trust(&asset)?
        .sign(&student)?;
        state.horizon.submit(&envelope).await?
    };

    let audit = AuditRepository::new(&state.store);
    let event = AuditEvent::new(AuditEventType::TrustlineLinked)
        .with_actor(&request.student_id)
        .with_resource("wallet", &row.public_key)
        .with_details(serde_json::json!({ "tx_hash": result.hash }));
    if let Err(e) = audit.log(&event) {
        warn!(error = %e, "failed to write audit event");
    }

    info!(student = %request.student_id, tx_hash = %result.hash, "trustline linked");

    Ok(Json(LinkTokenResponse {
        tx_hash: result.hash,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stellar::{HorizonClient, STELLAR_TESTNET};
    use crate::storage::{RecordStore, StoragePaths};

    // A closed local port: any ledger traffic fails immediately, so tests
    // can tell "never touched the gateway" from "tried and failed".
    fn test_state(dir: &std::path::Path) -> AppState {
        let mut store = RecordStore::new(StoragePaths::new(dir));
        store.initialize().expect("initialize");
        let horizon = HorizonClient::with_urls(
            "http://127.0.0.1:1".to_string(),
            Some("http://127.0.0.1:1".to_string()),
            STELLAR_TESTNET.passphrase.to_string(),
        )
        .expect("client");
        AppState::new(store, horizon, "E4C".to_string())
    }

    fn seed_wallet(state: &AppState, student_id: &str) -> Keypair {
        let pair = Keypair::generate();
        let wallets = WalletRepository::new(&state.store);
        wallets
            .create_student(&StellarWalletRecord::student(
                student_id,
                pair.public_key(),
                pair.secret_seed(),
            ))
            .unwrap();
        pair
    }

    #[tokio::test]
    async fn hardened_wallet_returns_existing_without_ledger_traffic() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let pair = seed_wallet(&state, "stu-1");
        WalletRepository::new(&state.store)
            .mark_student_hardened("stu-1")
            .unwrap();

        let (status, Json(body)) = create_wallet(
            State(state),
            Json(CreateStudentWalletRequest {
                student_id: "stu-1".to_string(),
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.stellar_public_key, pair.public_key());
        assert!(!body.created);
        assert!(body.device_secret_key.is_none());
    }

    #[tokio::test]
    async fn unhardened_wallet_resumes_hardening_instead_of_returning_existing() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        seed_wallet(&state, "stu-1");

        let err = create_wallet(
            State(state.clone()),
            Json(CreateStudentWalletRequest {
                student_id: "stu-1".to_string(),
            }),
        )
        .await
        .unwrap_err();

        // The resume path reached for the ledger (and failed against the
        // closed port) rather than short-circuiting with the existing row.
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);

        // Still unhardened, so the next invocation retries.
        let row = WalletRepository::new(&state.store)
            .get_student("stu-1")
            .unwrap();
        assert!(!row.hardened);
    }

    #[tokio::test]
    async fn empty_student_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());

        let err = create_wallet(
            State(state),
            Json(CreateStudentWalletRequest {
                student_id: "  ".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
