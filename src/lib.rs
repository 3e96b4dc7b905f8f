// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! EduChain Settlement - Custodial Stellar Token Settlement Service
//!
//! This crate issues, custodies, and settles the EduChain reward asset on
//! Stellar. It holds institutional signing keys server-side and mirrors
//! confirmed on-chain transfers into a file-backed record store.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum)
//! - `stellar` - Ledger integration: keys, assets, transactions, Horizon
//! - `storage` - File-backed record store and repositories
//! - `config` - Environment variable names and defaults
//! - `error` - HTTP error envelope
//! - `state` - Shared application state

pub mod api;
pub mod config;
pub mod error;
pub mod state;
pub mod stellar;
pub mod storage;
