// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Settlement endpoints: payouts and redemptions.
//!
//! Both operations move value on the ledger first and mirror it off-chain
//! only after confirmation. A pre-submission failure leaves no side
//! effects. An off-chain failure after confirmation is never reported as
//! success: it lands in the reconciliation log with the transaction hash as
//! the recovery anchor and surfaces as a 500 carrying that hash.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::{
    api::{require_institution, reward_asset, signing_keypair},
    error::ApiError,
    state::AppState,
    stellar::TxBuilder,
    storage::{
        voucher_token, AuditEvent, AuditEventType, AuditRepository, ReconciliationEvent,
        ReconciliationKind, ReconciliationRepository, RedeemVoucher, StorageError,
        StudentRepository, StudentTaskRepository, TaskStatus, VoucherRepository, VoucherStatus,
        WalletRepository, WalletRole,
    },
};

/// Request to pay out earned tokens for an approved task.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayoutRequest {
    pub student_id: String,
    /// Whole tokens to pay out.
    pub amount: i64,
    /// Task assignment being settled; must be in `teacher_approved`.
    pub student_task_id: String,
}

/// Response after a settled payout.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayoutResponse {
    /// Hash of the confirmed payment transaction.
    pub tx_hash: String,
    /// Student's cached balance after the payout.
    pub new_balance: i64,
    /// Task status after settlement.
    pub task_status: TaskStatus,
}

/// Request to redeem tokens against the escrow account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedeemRequest {
    pub student_id: String,
    /// Whole tokens to redeem.
    pub amount: i64,
    /// Reward the student is redeeming for.
    pub reward_id: String,
}

/// Response after a completed redemption.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RedeemResponse {
    /// Hash of the confirmed payment transaction.
    pub tx_hash: String,
    /// Opaque voucher token; also the payment's memo.
    pub voucher_token: String,
    /// Student's cached balance after the redemption.
    pub new_balance: i64,
}

/// Record a money-moved-but-unrecorded condition.
///
/// Called only after ledger confirmation; the event is the operator's
/// starting point for manual repair, keyed by the transaction hash.
fn record_reconciliation(
    state: &AppState,
    kind: ReconciliationKind,
    student_id: &str,
    amount: i64,
    tx_hash: &str,
    detail: &str,
) {
    error!(
        student = %student_id,
        tx_hash = %tx_hash,
        detail = %detail,
        "off-chain update failed after ledger confirmation"
    );

    let reconciliation = ReconciliationRepository::new(&state.store);
    let event = ReconciliationEvent::new(kind, student_id, amount, tx_hash, detail);
    if let Err(e) = reconciliation.log(&event) {
        error!(error = %e, tx_hash = %tx_hash, "failed to write reconciliation event");
    }

    let audit = AuditRepository::new(&state.store);
    let event = AuditEvent::new(AuditEventType::ReconciliationRequired)
        .with_actor(student_id)
        .with_details(serde_json::json!({ "tx_hash": tx_hash, "amount": amount }))
        .failed(detail);
    if let Err(e) = audit.log(&event) {
        warn!(error = %e, "failed to write audit event");
    }
}

/// Pay out earned tokens from the distributor to a student.
///
/// The task gate is checked before any ledger call; an ineligible task
/// costs nothing on-chain. After confirmation the task advances to
/// `validator_approved` and the cached balance is incremented atomically.
#[utoipa::path(
    post,
    path = "/v1/settlement/payout",
    tag = "Settlement",
    request_body = PayoutRequest,
    responses(
        (status = 200, description = "Payout settled", body = PayoutResponse),
        (status = 404, description = "Task not found"),
        (status = 409, description = "Task is not eligible for payout"),
        (status = 422, description = "Student wallet missing or institution not configured"),
        (status = 500, description = "Settled on the ledger but off-chain records were not updated"),
        (status = 502, description = "Ledger rejected the transaction")
    )
)]
pub async fn payout(
    State(state): State<AppState>,
    Json(request): Json<PayoutRequest>,
) -> Result<Json<PayoutResponse>, ApiError> {
    if request.amount <= 0 {
        return Err(ApiError::bad_request(
            "amount must be a positive whole token count",
        ));
    }

    // Task gate, before anything touches the ledger.
    let tasks = StudentTaskRepository::new(&state.store);
    let task = tasks.get(&request.student_task_id)?;
    if task.student_id != request.student_id {
        return Err(ApiError::unprocessable(format!(
            "task {} does not belong to student {}",
            request.student_task_id, request.student_id
        )));
    }
    if task.status != TaskStatus::TeacherApproved {
        return Err(ApiError::conflict(format!(
            "task {} is {:?}; payout requires teacher approval",
            request.student_task_id, task.status
        )));
    }

    let wallets = WalletRepository::new(&state.store);
    let student_row = match wallets.get_student(&request.student_id) {
        Ok(row) => row,
        Err(StorageError::NotFound(_)) => {
            return Err(ApiError::unprocessable(format!(
                "student {} has no wallet; create it before paying out",
                request.student_id
            )));
        }
        Err(e) => return Err(e.into()),
    };

    let distributor_row = require_institution(&wallets, WalletRole::Distributor)?;
    let distributor = signing_keypair(&distributor_row)?;
    let issuer_row = require_institution(&wallets, WalletRole::Issuer)?;
    let asset = reward_asset(&state, &issuer_row.public_key)?;

    let result = {
        let _guard = state.submissions.lock(&distributor_row.public_key).await;
        let account = state.horizon.load_account(&distributor_row.public_key).await?;
        let envelope = TxBuilder::new(
            state.horizon.passphrase(),
            &distributor_row.public_key,
            account.next_sequence(),
        )?
        .payment(&student_row.public_key, &asset, request.amount)?
        .sign(&distributor)?;
        match state.horizon.submit(&envelope).await {
            Ok(result) => result,
            Err(err) if err.is_missing_trustline() => {
                return Err(ApiError::bad_gateway(format!(
                    "student {} holds no trustline for the reward asset; call link-token first: {err}",
                    request.student_id
                )));
            }
            Err(err) => return Err(err.into()),
        }
    };

    // Off-chain mirror, only after confirmation.
    let students = StudentRepository::new(&state.store);
    let off_chain = tasks
        .transition(
            &request.student_task_id,
            TaskStatus::TeacherApproved,
            TaskStatus::ValidatorApproved,
        )
        .and_then(|_| students.adjust_tokens(&request.student_id, request.amount));

    let new_balance = match off_chain {
        Ok(balance) => balance,
        Err(err) => {
            let detail = format!("payout off-chain update failed: {err}");
            record_reconciliation(
                &state,
                ReconciliationKind::PayoutOffChainUpdateFailed,
                &request.student_id,
                request.amount,
                &result.hash,
                &detail,
            );
            return Err(ApiError::internal(format!(
                "payout settled on the ledger (tx {}) but off-chain records were not updated; reconciliation required",
                result.hash
            )));
        }
    };

    let audit = AuditRepository::new(&state.store);
    let event = AuditEvent::new(AuditEventType::PayoutSettled)
        .with_actor(&request.student_id)
        .with_resource("student_task", &request.student_task_id)
        .with_details(serde_json::json!({
            "amount": request.amount,
            "tx_hash": result.hash,
            "new_balance": new_balance,
        }));
    if let Err(e) = audit.log(&event) {
        warn!(error = %e, "failed to write audit event");
    }

    info!(
        student = %request.student_id,
        task = %request.student_task_id,
        amount = request.amount,
        tx_hash = %result.hash,
        "payout settled"
    );

    Ok(Json(PayoutResponse {
        tx_hash: result.hash,
        new_balance,
        task_status: TaskStatus::ValidatorApproved,
    }))
}

/// Redeem tokens by paying them from the student's account to escrow.
///
/// The payment is memo-tagged with a fresh voucher token; on confirmation
/// the cached balance is decremented and a completed voucher row is
/// inserted under that token.
#[utoipa::path(
    post,
    path = "/v1/settlement/redeem",
    tag = "Settlement",
    request_body = RedeemRequest,
    responses(
        (status = 201, description = "Redemption completed", body = RedeemResponse),
        (status = 422, description = "Wallet missing, escrow not configured, or balance too low"),
        (status = 500, description = "Settled on the ledger but off-chain records were not updated"),
        (status = 502, description = "Ledger rejected the transaction")
    )
)]
pub async fn redeem(
    State(state): State<AppState>,
    Json(request): Json<RedeemRequest>,
) -> Result<(StatusCode, Json<RedeemResponse>), ApiError> {
    if request.amount <= 0 {
        return Err(ApiError::bad_request(
            "amount must be a positive whole token count",
        ));
    }

    let wallets = WalletRepository::new(&state.store);
    let student_row = match wallets.get_student(&request.student_id) {
        Ok(row) => row,
        Err(StorageError::NotFound(_)) => {
            return Err(ApiError::unprocessable(format!(
                "student {} has no wallet",
                request.student_id
            )));
        }
        Err(e) => return Err(e.into()),
    };
    let student_key = signing_keypair(&student_row)?;

    let escrow_row = require_institution(&wallets, WalletRole::Escrow)?;
    let issuer_row = require_institution(&wallets, WalletRole::Issuer)?;
    let asset = reward_asset(&state, &issuer_row.public_key)?;

    // Reject from the cached mirror before spending a fee on a payment the
    // ledger would bounce anyway.
    let students = StudentRepository::new(&state.store);
    let student = students.get(&request.student_id)?;
    if student.tokens < request.amount {
        return Err(ApiError::unprocessable(format!(
            "balance {} is below the requested redemption of {}",
            student.tokens, request.amount
        )));
    }

    let token = voucher_token();

    let result = {
        let _guard = state.submissions.lock(&student_row.public_key).await;
        let account = state.horizon.load_account(&student_row.public_key).await?;
        let envelope = TxBuilder::new(
            state.horizon.passphrase(),
            &student_row.public_key,
            account.next_sequence(),
        )?
        .with_memo_text(&token)?
        .payment(&escrow_row.public_key, &asset, request.amount)?
        .sign(&student_key)?;
        state.horizon.submit(&envelope).await?
    };

    // Off-chain mirror, only after confirmation.
    let vouchers = VoucherRepository::new(&state.store);
    let off_chain = students
        .adjust_tokens(&request.student_id, -request.amount)
        .and_then(|balance| {
            vouchers.insert(&RedeemVoucher {
                voucher_uuid: token.clone(),
                student_id: request.student_id.clone(),
                reward_id: request.reward_id.clone(),
                amount: request.amount,
                stellar_tx_hash: result.hash.clone(),
                status: VoucherStatus::Completed,
                created_at: chrono::Utc::now(),
            })?;
            Ok(balance)
        });

    let new_balance = match off_chain {
        Ok(balance) => balance,
        Err(err) => {
            let detail = format!("redemption off-chain update failed: {err}");
            record_reconciliation(
                &state,
                ReconciliationKind::RedemptionOffChainUpdateFailed,
                &request.student_id,
                request.amount,
                &result.hash,
                &detail,
            );
            return Err(ApiError::internal(format!(
                "redemption settled on the ledger (tx {}) but off-chain records were not updated; reconciliation required",
                result.hash
            )));
        }
    };

    let audit = AuditRepository::new(&state.store);
    let event = AuditEvent::new(AuditEventType::TokensRedeemed)
        .with_actor(&request.student_id)
        .with_resource("voucher", &token)
        .with_details(serde_json::json!({
            "amount": request.amount,
            "reward_id": request.reward_id,
            "tx_hash": result.hash,
            "new_balance": new_balance,
        }));
    if let Err(e) = audit.log(&event) {
        warn!(error = %e, "failed to write audit event");
    }

    info!(
        student = %request.student_id,
        reward = %request.reward_id,
        amount = request.amount,
        tx_hash = %result.hash,
        "tokens redeemed"
    );

    Ok((
        StatusCode::CREATED,
        Json(RedeemResponse {
            tx_hash: result.hash,
            voucher_token: token,
            new_balance,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stellar::{HorizonClient, Keypair, STELLAR_TESTNET};
    use crate::storage::{
        RecordStore, StellarWalletRecord, StoragePaths, StudentRecord, StudentTaskRecord,
    };

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

    fn seed_task(state: &AppState, task_id: &str, student_id: &str, status: TaskStatus) {
        StudentTaskRepository::new(&state.store)
            .create(&StudentTaskRecord::new(task_id, student_id, status))
            .unwrap();
    }

    fn seed_student_with_wallet(state: &AppState, student_id: &str, tokens: i64) {
        let pair = Keypair::generate();
        WalletRepository::new(&state.store)
            .create_student(&StellarWalletRecord::student(
                student_id,
                pair.public_key(),
                pair.secret_seed(),
            ))
            .unwrap();
        let students = StudentRepository::new(&state.store);
        students.create(&StudentRecord::new(student_id)).unwrap();
        if tokens > 0 {
            students.adjust_tokens(student_id, tokens).unwrap();
        }
    }

    #[tokio::test]
    async fn payout_rejects_unapproved_task_before_any_ledger_call() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        seed_student_with_wallet(&state, "stu-1", 0);
        seed_task(&state, "task-1", "stu-1", TaskStatus::Completed);

        let err = payout(
            State(state.clone()),
            Json(PayoutRequest {
                student_id: "stu-1".to_string(),
                amount: 5,
                student_task_id: "task-1".to_string(),
            }),
        )
        .await
        .unwrap_err();

        // A 409 from the task gate; any ledger traffic would have failed
        // against the closed port with a 502 instead.
        assert_eq!(err.status, StatusCode::CONFLICT);

        // The task and balance are untouched.
        let task = StudentTaskRepository::new(&state.store)
            .get("task-1")
            .unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        let student = StudentRepository::new(&state.store).get("stu-1").unwrap();
        assert_eq!(student.tokens, 0);
    }

    #[tokio::test]
    async fn payout_rejects_missing_wallet_before_any_ledger_call() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        seed_task(&state, "task-1", "stu-1", TaskStatus::TeacherApproved);

        let err = payout(
            State(state),
            Json(PayoutRequest {
                student_id: "stu-1".to_string(),
                amount: 5,
                student_task_id: "task-1".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("has no wallet"));
    }

    #[tokio::test]
    async fn payout_rejects_task_owned_by_another_student() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        seed_student_with_wallet(&state, "stu-1", 0);
        seed_task(&state, "task-1", "stu-2", TaskStatus::TeacherApproved);

        let err = payout(
            State(state),
            Json(PayoutRequest {
                student_id: "stu-1".to_string(),
                amount: 5,
                student_task_id: "task-1".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn redeem_rejects_insufficient_balance_before_any_ledger_call() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        seed_student_with_wallet(&state, "stu-1", 3);
        let wallets = WalletRepository::new(&state.store);
        wallets
            .create_institution(&StellarWalletRecord::institutional(
                WalletRole::Escrow,
                Keypair::generate().public_key(),
                None,
            ))
            .unwrap();
        let issuer = Keypair::generate();
        wallets
            .create_institution(&StellarWalletRecord::institutional(
                WalletRole::Issuer,
                issuer.public_key(),
                Some(issuer.secret_seed()),
            ))
            .unwrap();

        let err = redeem(
            State(state),
            Json(RedeemRequest {
                student_id: "stu-1".to_string(),
                amount: 10,
                reward_id: "reward-1".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.message.contains("below the requested redemption"));
    }
}
