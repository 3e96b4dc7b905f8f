// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Ledger network configuration constants.

use sha2::{Digest, Sha256};

/// Stellar network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Network passphrase, hashed into every signature payload
    pub passphrase: &'static str,
    /// Horizon gateway base URL
    pub horizon_url: &'static str,
    /// Friendbot faucet URL (None on networks without a faucet)
    pub friendbot_url: Option<&'static str>,
}

/// Stellar testnet configuration.
pub const STELLAR_TESTNET: NetworkConfig = NetworkConfig {
    name: "Stellar Testnet",
    passphrase: "Test SDF Network ; September 2015",
    horizon_url: "https://horizon-testnet.stellar.org",
    friendbot_url: Some("https://friendbot.stellar.org"),
};

/// Stellar public network configuration.
///
/// No faucet exists here; institutional accounts must be funded externally
/// before provisioning can complete.
pub const STELLAR_PUBLIC: NetworkConfig = NetworkConfig {
    name: "Stellar Public",
    passphrase: "Public Global Stellar Network ; September 2015",
    horizon_url: "https://horizon.stellar.org",
    friendbot_url: None,
};

/// Compute the 32-byte network id for a passphrase.
///
/// The network id is the SHA-256 of the passphrase and prefixes every
/// transaction signature payload, binding signatures to one network.
pub fn network_id(passphrase: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(passphrase.as_bytes());
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testnet_network_id_matches_known_value() {
        // SHA-256("Test SDF Network ; September 2015")
        let id = network_id(STELLAR_TESTNET.passphrase);
        assert_eq!(
            id[..4],
            [0xce, 0xe0, 0x30, 0x2d],
            "testnet network id prefix changed"
        );
    }

    #[test]
    fn different_passphrases_yield_different_ids() {
        assert_ne!(
            network_id(STELLAR_TESTNET.passphrase),
            network_id(STELLAR_PUBLIC.passphrase)
        );
    }
}
