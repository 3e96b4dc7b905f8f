// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! HTTP API: routing, OpenAPI document, and shared handler helpers.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    error::ApiError,
    state::AppState,
    stellar::{Keypair, RewardAsset},
    storage::{StellarWalletRecord, StorageError, WalletRepository, WalletRole},
};

pub mod health;
pub mod institution;
pub mod settlement;
pub mod students;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/institution/provision", post(institution::provision))
        .route("/institution/mint", post(institution::mint))
        .route("/institution/escrow", post(institution::create_escrow))
        .route("/students/wallet", post(students::create_wallet))
        .route("/students/link-token", post(students::link_token))
        .route("/settlement/payout", post(settlement::payout))
        .route("/settlement/redeem", post(settlement::redeem));

    Router::new()
        .nest("/v1", v1_routes)
        .route("/health", get(health::health))
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        institution::provision,
        institution::mint,
        institution::create_escrow,
        students::create_wallet,
        students::link_token,
        settlement::payout,
        settlement::redeem
    ),
    components(
        schemas(
            health::HealthResponse,
            health::HealthChecks,
            institution::ProvisionRequest,
            institution::ProvisionResponse,
            institution::MintRequest,
            institution::MintResponse,
            institution::EscrowRequest,
            institution::EscrowResponse,
            students::CreateStudentWalletRequest,
            students::CreateStudentWalletResponse,
            students::LinkTokenRequest,
            students::LinkTokenResponse,
            settlement::PayoutRequest,
            settlement::PayoutResponse,
            settlement::RedeemRequest,
            settlement::RedeemResponse,
            crate::storage::TaskStatus
        )
    ),
    tags(
        (name = "Health", description = "Service health"),
        (name = "Institution", description = "Institutional account provisioning and minting"),
        (name = "Students", description = "Student wallet custody"),
        (name = "Settlement", description = "Payouts and redemptions")
    )
)]
struct ApiDoc;

/// Load a singleton institutional row, mapping absence to the
/// configuration error the settlement operations report.
pub(crate) fn require_institution(
    wallets: &WalletRepository<'_>,
    role: WalletRole,
) -> Result<StellarWalletRecord, ApiError> {
    match wallets.get_institution(role) {
        Ok(row) => Ok(row),
        Err(StorageError::NotFound(_)) => Err(ApiError::unprocessable(format!(
            "{} wallet is not configured; provision the institution first",
            role.as_str()
        ))),
        Err(e) => Err(e.into()),
    }
}

/// Rebuild a signing keypair from a custodial wallet row.
pub(crate) fn signing_keypair(row: &StellarWalletRecord) -> Result<Keypair, ApiError> {
    let secret = row.secret_key.as_deref().ok_or_else(|| {
        ApiError::internal(format!(
            "{} wallet holds no signing key",
            row.role.as_str()
        ))
    })?;
    Keypair::from_secret(secret).map_err(|_| {
        ApiError::internal(format!(
            "{} wallet signing key is invalid",
            row.role.as_str()
        ))
    })
}

/// The reward asset issued by `issuer_public_key` under the configured code.
pub(crate) fn reward_asset(
    state: &AppState,
    issuer_public_key: &str,
) -> Result<RewardAsset, ApiError> {
    RewardAsset::new(&state.asset_code, issuer_public_key)
        .map_err(|e| ApiError::internal(format!("invalid asset configuration: {e}")))
}
