// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root directory for the record store | `/data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `HORIZON_URL` | Horizon ledger gateway base URL | Stellar testnet |
//! | `FRIENDBOT_URL` | Faucet endpoint for account activation | Stellar testnet |
//! | `NETWORK_PASSPHRASE` | Network passphrase for signature payloads | Testnet |
//! | `ASSET_CODE` | Reward asset code (1-4 alphanumeric) | `E4C` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the record-store data directory path.
///
/// Wallet rows, student rows, task rows, vouchers, and the audit and
/// reconciliation logs all live under this directory. In production it is a
/// mounted volume owned exclusively by this service.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Default record-store directory when `DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "/data";

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name overriding the Horizon gateway base URL.
pub const HORIZON_URL_ENV: &str = "HORIZON_URL";

/// Environment variable name overriding the friendbot faucet URL.
pub const FRIENDBOT_URL_ENV: &str = "FRIENDBOT_URL";

/// Environment variable name overriding the network passphrase.
///
/// The passphrase is hashed into every transaction signature payload, so a
/// mismatch with the gateway's network makes every submission invalid.
pub const NETWORK_PASSPHRASE_ENV: &str = "NETWORK_PASSPHRASE";

/// Environment variable name overriding the reward asset code.
pub const ASSET_CODE_ENV: &str = "ASSET_CODE";

/// Environment variable name selecting the log output format
/// (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Default reward asset code.
pub const DEFAULT_ASSET_CODE: &str = "E4C";

/// Tokens minted to the distributor during institutional provisioning.
pub const INITIAL_EMISSION_TOKENS: i64 = 1_000_000;
