// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Stellar ledger integration.
//!
//! Everything that touches the chain lives here: keypairs and strkey
//! encoding, the reward asset descriptor, XDR transaction assembly and
//! signing, the Horizon gateway client, and the per-account submission
//! serialization that keeps shared signing accounts in sequence order.

pub mod asset;
pub mod horizon;
pub mod keys;
pub mod network;
pub mod submission;
pub mod tx;

pub use asset::{AssetError, RewardAsset};
pub use horizon::{AccountRecord, HorizonClient, HorizonError, SubmitResult};
pub use keys::{decode_public_key, KeyError, Keypair};
pub use network::{NetworkConfig, STELLAR_PUBLIC, STELLAR_TESTNET};
pub use submission::SubmissionRegistry;
pub use tx::{tokens_to_stroops, SignedEnvelope, TxBuilder, TxError, BASE_FEE};
