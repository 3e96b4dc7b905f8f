// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Institution provisioning and minting endpoints.
//!
//! These endpoints create the issuer, distributor, and escrow accounts and
//! move new supply from the issuer. Issuer and distributor keys stay in
//! custody; the escrow secret is returned exactly once for external archival
//! and is not stored.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::{
    api::{require_institution, reward_asset, signing_keypair},
    config::INITIAL_EMISSION_TOKENS,
    error::ApiError,
    state::AppState,
    stellar::{Keypair, TxBuilder},
    storage::{
        AuditEvent, AuditEventType, AuditRepository, StellarWalletRecord, WalletRepository,
        WalletRole,
    },
};

/// Request to provision the institutional accounts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProvisionRequest {
    /// Administrator performing the provisioning (audit trail only).
    pub admin_id: String,
}

/// Response after provisioning (or re-reading) the institution.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProvisionResponse {
    /// Issuer account public key.
    pub issuer_public_key: String,
    /// Distributor account public key.
    pub distributor_public_key: String,
    /// Tokens minted to the distributor by this call (0 when the
    /// institution already existed).
    pub minted_tokens: i64,
    /// Whether this call created the accounts.
    pub created: bool,
}

/// Request to mint additional supply.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MintRequest {
    /// Administrator performing the mint (audit trail only).
    pub admin_id: String,
    /// Whole tokens to mint to the distributor.
    pub amount: i64,
}

/// Response after a successful mint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MintResponse {
    /// Hash of the confirmed mint transaction.
    pub tx_hash: String,
    /// Tokens minted.
    pub amount: i64,
    /// Receiving distributor public key.
    pub destination: String,
}

/// Request to create the escrow account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EscrowRequest {
    /// Administrator performing the creation (audit trail only).
    pub admin_id: String,
}

/// Response after creating (or re-reading) the escrow account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EscrowResponse {
    /// Escrow account public key.
    pub escrow_public_key: String,
    /// Escrow secret seed. Present only on creation; this is the single
    /// time the service exposes it, and it is not stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escrow_secret_key: Option<String>,
    /// Whether this call created the account.
    pub created: bool,
}

/// Provision the issuer and distributor accounts and mint the initial
/// emission.
///
/// Both accounts are faucet-funded, the distributor's trustline for the
/// reward asset is established, and the initial supply is paid from the
/// issuer. When both rows already exist the call returns the existing
/// public keys without touching the ledger.
#[utoipa::path(
    post,
    path = "/v1/institution/provision",
    tag = "Institution",
    request_body = ProvisionRequest,
    responses(
        (status = 201, description = "Institution provisioned", body = ProvisionResponse),
        (status = 200, description = "Institution already provisioned", body = ProvisionResponse),
        (status = 409, description = "Institution is partially provisioned"),
        (status = 502, description = "Ledger activation or submission failed")
    )
)]
pub async fn provision(
    State(state): State<AppState>,
    Json(request): Json<ProvisionRequest>,
) -> Result<(StatusCode, Json<ProvisionResponse>), ApiError> {
    // One institutional setup at a time; the existence check below is only
    // meaningful while no concurrent call is funding the same accounts.
    let _setup = state.provisioning.lock().await;

    let wallets = WalletRepository::new(&state.store);

    let issuer_exists = wallets.institution_exists(WalletRole::Issuer);
    let distributor_exists = wallets.institution_exists(WalletRole::Distributor);
    if issuer_exists && distributor_exists {
        let issuer = wallets.get_institution(WalletRole::Issuer)?;
        let distributor = wallets.get_institution(WalletRole::Distributor)?;
        return Ok((
            StatusCode::OK,
            Json(ProvisionResponse {
                issuer_public_key: issuer.public_key,
                distributor_public_key: distributor.public_key,
                minted_tokens: 0,
                created: false,
            }),
        ));
    }
    if issuer_exists != distributor_exists {
        return Err(ApiError::conflict(
            "institution is partially provisioned; manual repair required",
        ));
    }

    let issuer = Keypair::generate();
    let distributor = Keypair::generate();
    let issuer_public = issuer.public_key();
    let distributor_public = distributor.public_key();

    // Fund both accounts and wait for activation before any dependent step.
    state.horizon.fund_account(&issuer_public).await?;
    state.horizon.fund_account(&distributor_public).await?;
    state.horizon.wait_for_account(&issuer_public).await?;
    let distributor_account = state.horizon.wait_for_account(&distributor_public).await?;

    let asset = reward_asset(&state, &issuer_public)?;

    // Distributor trustline first; the mint fails without it.
    {
        let _guard = state.submissions.lock(&distributor_public).await;
        let envelope = TxBuilder::new(
            state.horizon.passphrase(),
            &distributor_public,
            distributor_account.next_sequence(),
        )?
        .change_trust(&asset)?
        .sign(&distributor)?;
        state.horizon.submit(&envelope).await?;
    }

    // Initial emission from the issuer.
    let mint_result = {
        let _guard = state.submissions.lock(&issuer_public).await;
        let issuer_account = state.horizon.load_account(&issuer_public).await?;
        let envelope = TxBuilder::new(
            state.horizon.passphrase(),
            &issuer_public,
            issuer_account.next_sequence(),
        )?
        .payment(&distributor_public, &asset, INITIAL_EMISSION_TOKENS)?
        .sign(&issuer)?;
        state.horizon.submit(&envelope).await?
    };

    wallets.create_institution(&StellarWalletRecord::institutional(
        WalletRole::Issuer,
        issuer_public.clone(),
        Some(issuer.secret_seed()),
    ))?;
    wallets.create_institution(&StellarWalletRecord::institutional(
        WalletRole::Distributor,
        distributor_public.clone(),
        Some(distributor.secret_seed()),
    ))?;

    let audit = AuditRepository::new(&state.store);
    let event = AuditEvent::new(AuditEventType::InstitutionProvisioned)
        .with_actor(&request.admin_id)
        .with_resource("wallet", &issuer_public)
        .with_details(serde_json::json!({
            "distributor": distributor_public,
            "minted_tokens": INITIAL_EMISSION_TOKENS,
            "tx_hash": mint_result.hash,
        }));
    if let Err(e) = audit.log(&event) {
        warn!(error = %e, "failed to write audit event");
    }

    info!(
        issuer = %issuer_public,
        distributor = %distributor_public,
        minted = INITIAL_EMISSION_TOKENS,
        "institution provisioned"
    );

    Ok((
        StatusCode::CREATED,
        Json(ProvisionResponse {
            issuer_public_key: issuer_public,
            distributor_public_key: distributor_public,
            minted_tokens: INITIAL_EMISSION_TOKENS,
            created: true,
        }),
    ))
}

/// Mint additional supply from the issuer to the distributor.
#[utoipa::path(
    post,
    path = "/v1/institution/mint",
    tag = "Institution",
    request_body = MintRequest,
    responses(
        (status = 200, description = "Tokens minted", body = MintResponse),
        (status = 400, description = "Invalid amount"),
        (status = 422, description = "Institution is not configured"),
        (status = 502, description = "Ledger rejected the transaction")
    )
)]
pub async fn mint(
    State(state): State<AppState>,
    Json(request): Json<MintRequest>,
) -> Result<Json<MintResponse>, ApiError> {
    if request.amount <= 0 {
        return Err(ApiError::bad_request(
            "amount must be a positive whole token count",
        ));
    }

    let wallets = WalletRepository::new(&state.store);
    let issuer_row = require_institution(&wallets, WalletRole::Issuer)?;
    let distributor_row = require_institution(&wallets, WalletRole::Distributor)?;
    let issuer = signing_keypair(&issuer_row)?;
    let asset = reward_asset(&state, &issuer_row.public_key)?;

    let result = {
        let _guard = state.submissions.lock(&issuer_row.public_key).await;
        let account = state.horizon.load_account(&issuer_row.public_key).await?;
        let envelope = TxBuilder::new(
            state.horizon.passphrase(),
            &issuer_row.public_key,
            account.next_sequence(),
        )?
        .payment(&distributor_row.public_key, &asset, request.amount)?
        .sign(&issuer)?;
        match state.horizon.submit(&envelope).await {
            Ok(result) => result,
            Err(err) if err.is_missing_trustline() => {
                return Err(ApiError::bad_gateway(format!(
                    "distributor {} holds no trustline for the reward asset; repair it before minting: {err}",
                    distributor_row.public_key
                )));
            }
            Err(err) => return Err(err.into()),
        }
    };

    let audit = AuditRepository::new(&state.store);
    let event = AuditEvent::new(AuditEventType::TokensMinted)
        .with_actor(&request.admin_id)
        .with_resource("wallet", &distributor_row.public_key)
        .with_details(serde_json::json!({
            "amount": request.amount,
            "tx_hash": result.hash,
        }));
    if let Err(e) = audit.log(&event) {
        warn!(error = %e, "failed to write audit event");
    }

    info!(amount = request.amount, tx_hash = %result.hash, "tokens minted");

    Ok(Json(MintResponse {
        tx_hash: result.hash,
        amount: request.amount,
        destination: distributor_row.public_key,
    }))
}

/// Create the escrow account that receives redeemed tokens.
///
/// The account is faucet-funded and trustline-linked to the reward asset.
/// The row stores the public key only; the secret seed appears in the
/// creation response and nowhere else.
#[utoipa::path(
    post,
    path = "/v1/institution/escrow",
    tag = "Institution",
    request_body = EscrowRequest,
    responses(
        (status = 201, description = "Escrow account created", body = EscrowResponse),
        (status = 200, description = "Escrow account already exists", body = EscrowResponse),
        (status = 422, description = "Institution is not configured"),
        (status = 502, description = "Ledger activation or submission failed")
    )
)]
pub async fn create_escrow(
    State(state): State<AppState>,
    Json(request): Json<EscrowRequest>,
) -> Result<(StatusCode, Json<EscrowResponse>), ApiError> {
    let _setup = state.provisioning.lock().await;

    let wallets = WalletRepository::new(&state.store);

    if wallets.institution_exists(WalletRole::Escrow) {
        let row = wallets.get_institution(WalletRole::Escrow)?;
        return Ok((
            StatusCode::OK,
            Json(EscrowResponse {
                escrow_public_key: row.public_key,
                escrow_secret_key: None,
                created: false,
            }),
        ));
    }

    let issuer_row = require_institution(&wallets, WalletRole::Issuer)?;
    let asset = reward_asset(&state, &issuer_row.public_key)?;

    let escrow = Keypair::generate();
    let escrow_public = escrow.public_key();

    state.horizon.fund_account(&escrow_public).await?;
    let account = state.horizon.wait_for_account(&escrow_public).await?;

    let envelope = TxBuilder::new(
        state.horizon.passphrase(),
        &escrow_public,
        account.next_sequence(),
    )?
    .change_trust(&asset)?
    .sign(&escrow)?;
    state.horizon.submit(&envelope).await?;

    wallets.create_institution(&StellarWalletRecord::institutional(
        WalletRole::Escrow,
        escrow_public.clone(),
        None,
    ))?;

    let audit = AuditRepository::new(&state.store);
    let event = AuditEvent::new(AuditEventType::EscrowCreated)
        .with_actor(&request.admin_id)
        .with_resource("wallet", &escrow_public);
    if let Err(e) = audit.log(&event) {
        warn!(error = %e, "failed to write audit event");
    }

    info!(escrow = %escrow_public, "escrow account created");

    Ok((
        StatusCode::CREATED,
        Json(EscrowResponse {
            escrow_public_key: escrow_public,
            escrow_secret_key: Some(escrow.secret_seed()),
            created: true,
        }),
    ))
}
