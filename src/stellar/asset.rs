// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! The reward asset descriptor.
//!
//! A fungible asset on the ledger is identified by `(code, issuer)`. Every
//! holder account needs a trustline to this exact pair before it can receive
//! payments of the asset.

use stellar_xdr::curr::{AccountId, AlphaNum4, Asset, AssetCode4, ChangeTrustAsset, PublicKey, Uint256};

use super::keys::{decode_public_key, KeyError};

/// Errors from asset descriptor construction.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("asset code must be 1-4 alphanumeric characters, got `{0}`")]
    InvalidCode(String),

    #[error("invalid issuer: {0}")]
    InvalidIssuer(#[from] KeyError),
}

/// A `(code, issuer)` asset pair, e.g. `E4C:GXXXX...`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardAsset {
    code: String,
    issuer: String,
}

impl RewardAsset {
    /// Build a descriptor, validating the code and issuer encoding.
    pub fn new(code: &str, issuer_public_key: &str) -> Result<Self, AssetError> {
        if code.is_empty() || code.len() > 4 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(AssetError::InvalidCode(code.to_string()));
        }
        decode_public_key(issuer_public_key)?;
        Ok(Self {
            code: code.to_string(),
            issuer: issuer_public_key.to_string(),
        })
    }

    /// Asset code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Issuer public key in strkey form.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Zero-padded 4-byte code as the ledger encodes alphanum-4 assets.
    fn code4(&self) -> AssetCode4 {
        let mut bytes = [0u8; 4];
        bytes[..self.code.len()].copy_from_slice(self.code.as_bytes());
        AssetCode4(bytes)
    }

    fn issuer_account(&self) -> AccountId {
        // Validated in the constructor.
        let bytes = decode_public_key(&self.issuer).unwrap_or([0u8; 32]);
        AccountId(PublicKey::PublicKeyTypeEd25519(Uint256(bytes)))
    }

    /// XDR form used inside payment operations.
    pub fn to_xdr(&self) -> Asset {
        Asset::CreditAlphanum4(AlphaNum4 {
            asset_code: self.code4(),
            issuer: self.issuer_account(),
        })
    }

    /// XDR form used inside change-trust operations.
    pub fn to_change_trust_xdr(&self) -> ChangeTrustAsset {
        ChangeTrustAsset::CreditAlphanum4(AlphaNum4 {
            asset_code: self.code4(),
            issuer: self.issuer_account(),
        })
    }
}
