// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

use std::{env, net::SocketAddr};

use tracing::info;

use educhain_settlement::{
    api::router,
    config::{
        ASSET_CODE_ENV, DATA_DIR_ENV, DEFAULT_ASSET_CODE, DEFAULT_DATA_DIR, FRIENDBOT_URL_ENV,
        HORIZON_URL_ENV, HOST_ENV, LOG_FORMAT_ENV, NETWORK_PASSPHRASE_ENV, PORT_ENV,
    },
    state::AppState,
    stellar::{HorizonClient, STELLAR_TESTNET},
    storage::{RecordStore, StoragePaths},
};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=debug"));

    let format = env::var(LOG_FORMAT_ENV).unwrap_or_default();
    if format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    info!("shutdown signal received");
}

#[tokio::main]
async fn main() {
    init_tracing();

    let data_dir = env::var(DATA_DIR_ENV).unwrap_or_else(|_| DEFAULT_DATA_DIR.to_string());
    let mut store = RecordStore::new(StoragePaths::new(&data_dir));
    store
        .initialize()
        .expect("failed to initialize the record store");
    info!(data_dir = %data_dir, "record store initialized");

    let horizon_url =
        env::var(HORIZON_URL_ENV).unwrap_or_else(|_| STELLAR_TESTNET.horizon_url.to_string());
    let friendbot_url = env::var(FRIENDBOT_URL_ENV)
        .ok()
        .or_else(|| STELLAR_TESTNET.friendbot_url.map(str::to_string));
    let passphrase = env::var(NETWORK_PASSPHRASE_ENV)
        .unwrap_or_else(|_| STELLAR_TESTNET.passphrase.to_string());
    let horizon = HorizonClient::with_urls(horizon_url.clone(), friendbot_url, passphrase)
        .expect("failed to build the Horizon client");
    info!(horizon = %horizon_url, "ledger gateway configured");

    let asset_code = env::var(ASSET_CODE_ENV).unwrap_or_else(|_| DEFAULT_ASSET_CODE.to_string());

    let state = AppState::new(store, horizon, asset_code);
    let app = router(state);

    let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var(PORT_ENV)
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .expect("failed to parse bind address");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("failed to bind server address");
    info!("settlement service listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server failed");
}
