// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Ed25519 keypair handling and strkey encoding.
//!
//! ## Security
//!
//! - Secret seeds are held in memory only for the duration of a signing
//!   operation or a single provisioning response.
//! - `Keypair` deliberately implements neither `Serialize` nor `Debug`
//!   output of the seed; only the strkey accessors expose material, and the
//!   secret accessor is explicit at every call site.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;

/// Errors from key decoding.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("invalid public key encoding")]
    InvalidPublicKey,

    #[error("invalid secret seed encoding")]
    InvalidSecretSeed,
}

/// An ed25519 signing identity on the ledger.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Generate a fresh random keypair.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut OsRng),
        }
    }

    /// Reconstruct a keypair from an `S...` secret seed.
    pub fn from_secret(seed: &str) -> Result<Self, KeyError> {
        let private = stellar_strkey::ed25519::PrivateKey::from_string(seed)
            .map_err(|_| KeyError::InvalidSecretSeed)?;
        Ok(Self {
            signing_key: SigningKey::from_bytes(&private.0),
        })
    }

    /// Public key as raw bytes.
    pub fn public_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Public key in `G...` strkey form.
    pub fn public_key(&self) -> String {
        stellar_strkey::ed25519::PublicKey(self.public_bytes()).to_string()
    }

    /// Secret seed in `S...` strkey form.
    ///
    /// Call sites are limited to wallet-row persistence and the two
    /// return-once provisioning responses (escrow, device key).
    pub fn secret_seed(&self) -> String {
        stellar_strkey::ed25519::PrivateKey(self.signing_key.to_bytes()).to_string()
    }

    /// Sign a message, returning the 64-byte signature.
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Signature hint: the last four bytes of the public key, attached to
    /// decorated signatures so validators can locate the matching signer.
    pub fn signature_hint(&self) -> [u8; 4] {
        let public = self.public_bytes();
        [public[28], public[29], public[30], public[31]]
    }
}

impl std::fmt::Debug for Keypair {
    /// Shows only the public key; the secret seed is never formatted.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

/// Decode a `G...` strkey into raw public key bytes.
pub fn decode_public_key(public_key: &str) -> Result<[u8; 32], KeyError> {
    stellar_strkey::ed25519::PublicKey::from_string(public_key)
        .map(|k| k.0)
        .map_err(|_| KeyError::InvalidPublicKey)
}
