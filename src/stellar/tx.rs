// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 EduChain

//! Transaction building and signing.
//!
//! Every ledger mutation this service performs (trustline establishment,
//! mint, payout, redemption, wallet hardening) is assembled here as an XDR
//! transaction envelope, signed over the network-bound signature payload,
//! and handed to the Horizon client as a base64 string.
//!
//! Amounts cross this boundary as whole tokens and are converted to stroops
//! (1 token = 10^7 stroops) with overflow checks.

use sha2::{Digest, Sha256};
use stellar_xdr::curr::{
    ChangeTrustOp, DecoratedSignature, Limits, Memo, MuxedAccount, Operation, OperationBody,
    PaymentOp, Preconditions, SequenceNumber, SetOptionsOp, Signature, SignatureHint, Signer,
    SignerKey, StringM, Transaction, TransactionEnvelope, TransactionExt,
    TransactionSignaturePayload, TransactionSignaturePayloadTaggedTransaction,
    TransactionV1Envelope, Uint256, WriteXdr,
};

use super::asset::RewardAsset;
use super::keys::{decode_public_key, KeyError, Keypair};
use super::network::network_id;

/// Fee per operation in stroops.
pub const BASE_FEE: u32 = 100;

/// Stroops per whole token.
pub const STROOPS_PER_TOKEN: i64 = 10_000_000;

/// Maximum memo text length the ledger accepts, in bytes.
pub const MEMO_TEXT_LIMIT: usize = 28;

/// Errors from transaction assembly and signing.
#[derive(Debug, thiserror::Error)]
pub enum TxError {
    #[error("amount must be positive and below the stroop ceiling, got {0}")]
    AmountOutOfRange(i64),

    #[error("memo exceeds {MEMO_TEXT_LIMIT} bytes: `{0}`")]
    MemoTooLong(String),

    #[error("invalid account key: {0}")]
    InvalidAccount(#[from] KeyError),

    #[error("transaction holds too many operations")]
    TooManyOperations,

    #[error("envelope encoding failed: {0}")]
    Encoding(String),
}

/// Convert whole tokens to stroops, rejecting non-positive and overflowing
/// amounts.
pub fn tokens_to_stroops(tokens: i64) -> Result<i64, TxError> {
    if tokens <= 0 {
        return Err(TxError::AmountOutOfRange(tokens));
    }
    tokens
        .checked_mul(STROOPS_PER_TOKEN)
        .ok_or(TxError::AmountOutOfRange(tokens))
}

/// Builder for a single-source transaction.
///
/// The sequence number passed to [`TxBuilder::new`] is the transaction's
/// own sequence, i.e. the account's current sequence plus one.
pub struct TxBuilder {
    network_id: [u8; 32],
    source: [u8; 32],
    seq_num: i64,
    memo: Memo,
    operations: Vec<Operation>,
}

impl TxBuilder {
    /// Start a transaction from `source_public_key` at `seq_num`.
    pub fn new(
        network_passphrase: &str,
        source_public_key: &str,
        seq_num: i64,
    ) -> Result<Self, TxError> {
        Ok(Self {
            network_id: network_id(network_passphrase),
            source: decode_public_key(source_public_key)?,
            seq_num,
            memo: Memo::None,
            operations: Vec::new(),
        })
    }

    /// Attach a text memo (at most 28 bytes).
    pub fn with_memo_text(mut self, text: &str) -> Result<Self, TxError> {
        if text.len() > MEMO_TEXT_LIMIT {
            return Err(TxError::MemoTooLong(text.to_string()));
        }
        let memo_text: StringM<28> = text
            .try_into()
            .map_err(|_| TxError::MemoTooLong(text.to_string()))?;
        self.memo = Memo::Text(memo_text);
        Ok(self)
    }

    /// Add a payment of `amount_tokens` of `asset` to `destination`.
    pub fn payment(
        mut self,
        destination: &str,
        asset: &RewardAsset,
        amount_tokens: i64,
    ) -> Result<Self, TxError> {
        let destination = decode_public_key(destination)?;
        self.operations.push(Operation {
            source_account: None,
            body: OperationBody::Payment(PaymentOp {
                destination: MuxedAccount::Ed25519(Uint256(destination)),
                asset: asset.to_xdr(),
                amount: tokens_to_stroops(amount_tokens)?,
            }),
        });
        Ok(self)
    }

    /// Add a change-trust authorizing the source to hold `asset`.
    ///
    /// The limit is the ledger maximum; re-establishing an existing
    /// trustline with the same limit is a no-op on-chain, which is what
    /// makes the self-service repair path safely repeatable.
    pub fn change_trust(mut self, asset: &RewardAsset) -> Result<Self, TxError> {
        self.operations.push(Operation {
            source_account: None,
            body: OperationBody::ChangeTrust(ChangeTrustOp {
                line: asset.to_change_trust_xdr(),
                limit: i64::MAX,
            }),
        });
        Ok(self)
    }

    /// Add a set-options installing `signer_public_key` at `weight`.
    pub fn add_signer(mut self, signer_public_key: &str, weight: u32) -> Result<Self, TxError> {
        let signer = decode_public_key(signer_public_key)?;
        self.operations.push(Operation {
            source_account: None,
            body: OperationBody::SetOptions(SetOptionsOp {
                inflation_dest: None,
                clear_flags: None,
                set_flags: None,
                master_weight: None,
                low_threshold: None,
                med_threshold: None,
                high_threshold: None,
                home_domain: None,
                signer: Some(Signer {
                    key: SignerKey::Ed25519(Uint256(signer)),
                    weight,
                }),
            }),
        });
        Ok(self)
    }

    /// Add a set-options rewriting the master weight and signing thresholds.
    pub fn set_thresholds(mut self, master_weight: u32, low: u32, medium: u32, high: u32) -> Self {
        self.operations.push(Operation {
            source_account: None,
            body: OperationBody::SetOptions(SetOptionsOp {
                inflation_dest: None,
                clear_flags: None,
                set_flags: None,
                master_weight: Some(master_weight),
                low_threshold: Some(low),
                med_threshold: Some(medium),
                high_threshold: Some(high),
                home_domain: None,
                signer: None,
            }),
        });
        self
    }

    /// Sign with `keypair` and seal the envelope.
    pub fn sign(self, keypair: &Keypair) -> Result<SignedEnvelope, TxError> {
        let fee = BASE_FEE
            .checked_mul(self.operations.len() as u32)
            .ok_or(TxError::TooManyOperations)?;

        let tx = Transaction {
            source_account: MuxedAccount::Ed25519(Uint256(self.source)),
            fee,
            seq_num: SequenceNumber(self.seq_num),
            cond: Preconditions::None,
            memo: self.memo,
            operations: self
                .operations
                .try_into()
                .map_err(|_| TxError::TooManyOperations)?,
            ext: TransactionExt::V0,
        };

        let payload = TransactionSignaturePayload {
            network_id: stellar_xdr::curr::Hash(self.network_id),
            tagged_transaction: TransactionSignaturePayloadTaggedTransaction::Tx(tx.clone()),
        };
        let payload_bytes = payload
            .to_xdr(Limits::none())
            .map_err(|e| TxError::Encoding(e.to_string()))?;
        let hash: [u8; 32] = Sha256::digest(&payload_bytes).into();

        let signature = DecoratedSignature {
            hint: SignatureHint(keypair.signature_hint()),
            signature: Signature(
                keypair
                    .sign(&hash)
                    .to_vec()
                    .try_into()
                    .map_err(|_| TxError::Encoding("signature length".to_string()))?,
            ),
        };

        Ok(SignedEnvelope {
            hash,
            envelope: TransactionEnvelope::Tx(TransactionV1Envelope {
                tx,
                signatures: vec![signature]
                    .try_into()
                    .map_err(|_| TxError::Encoding("signature count".to_string()))?,
            }),
        })
    }
}

/// A signed transaction ready for submission.
pub struct SignedEnvelope {
    hash: [u8; 32],
    envelope: TransactionEnvelope,
}

impl SignedEnvelope {
    /// Base64-encoded XDR form, the wire format `POST /transactions` takes.
    pub fn to_base64(&self) -> Result<String, TxError> {
        self.envelope
            .to_xdr_base64(Limits::none())
            .map_err(|e| TxError::Encoding(e.to_string()))
    }

    /// Transaction hash in hex, as Horizon reports it.
    pub fn hash_hex(&self) -> String {
        self.hash.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[cfg(test)]
    pub(crate) fn envelope(&self) -> &TransactionEnvelope {
        &self.envelope
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stellar::network::STELLAR_TESTNET;
    use stellar_xdr::curr::OperationBody;

    fn test_asset(issuer: &Keypair) -> RewardAsset {
        RewardAsset::new("E4C", &issuer.public_key()).unwrap()
    }

    #[test]
    fn tokens_to_stroops_scales_and_checks() {
        assert_eq!(tokens_to_stroops(1).unwrap(), 10_000_000);
        assert_eq!(tokens_to_stroops(15).unwrap(), 150_000_000);
        assert!(tokens_to_stroops(0).is_err());
        assert!(tokens_to_stroops(-3).is_err());
        assert!(tokens_to_stroops(i64::MAX).is_err());
    }

    #[test]
    fn payment_envelope_carries_amount_and_fee() {
        let issuer = Keypair::generate();
        let distributor = Keypair::generate();
        let student = Keypair::generate();
        let asset = test_asset(&issuer);

        let envelope = TxBuilder::new(STELLAR_TESTNET.passphrase, &distributor.public_key(), 7)
            .unwrap()
            .payment(&student.public_key(), &asset, 15)
            .unwrap()
            .sign(&distributor)
            .unwrap();

        let TransactionEnvelope::Tx(v1) = envelope.envelope() else {
            panic!("expected v1 envelope");
        };
        assert_eq!(v1.tx.fee, BASE_FEE);
        assert_eq!(v1.tx.seq_num.0, 7);
        assert_eq!(v1.tx.operations.len(), 1);
        match &v1.tx.operations[0].body {
            OperationBody::Payment(op) => assert_eq!(op.amount, 150_000_000),
            other => panic!("unexpected operation: {other:?}"),
        }
        assert_eq!(v1.signatures.len(), 1);
        assert_eq!(v1.signatures[0].hint.0, distributor.signature_hint());
    }

    #[test]
    fn hardening_transaction_has_expected_shape() {
        let master = Keypair::generate();
        let device = Keypair::generate();
        let recovery_one = Keypair::generate();
        let recovery_two = Keypair::generate();

        let envelope = TxBuilder::new(STELLAR_TESTNET.passphrase, &master.public_key(), 2)
            .unwrap()
            .add_signer(&device.public_key(), 1)
            .unwrap()
            .add_signer(&recovery_one.public_key(), 1)
            .unwrap()
            .add_signer(&recovery_two.public_key(), 1)
            .unwrap()
            .set_thresholds(0, 1, 2, 2)
            .sign(&master)
            .unwrap();

        let TransactionEnvelope::Tx(v1) = envelope.envelope() else {
            panic!("expected v1 envelope");
        };
        assert_eq!(v1.tx.operations.len(), 4);
        assert_eq!(v1.tx.fee, BASE_FEE * 4);

        // First three install weight-1 signers.
        for op in v1.tx.operations.iter().take(3) {
            match &op.body {
                OperationBody::SetOptions(set) => {
                    let signer = set.signer.as_ref().expect("signer present");
                    assert_eq!(signer.weight, 1);
                    assert!(set.master_weight.is_none());
                }
                other => panic!("unexpected operation: {other:?}"),
            }
        }
        // Last op demotes the master key and sets thresholds.
        match &v1.tx.operations[3].body {
            OperationBody::SetOptions(set) => {
                assert_eq!(set.master_weight, Some(0));
                assert_eq!(set.low_threshold, Some(1));
                assert_eq!(set.med_threshold, Some(2));
                assert_eq!(set.high_threshold, Some(2));
            }
            other => panic!("unexpected operation: {other:?}"),
        }
    }

    #[test]
    fn memo_is_bounded() {
        let source = Keypair::generate();
        let builder = TxBuilder::new(STELLAR_TESTNET.passphrase, &source.public_key(), 1).unwrap();
        assert!(matches!(
            builder.with_memo_text("this memo is far too long for the ledger"),
            Err(TxError::MemoTooLong(_))
        ));
    }

    #[test]
    fn envelope_base64_round_trips() {
        use stellar_xdr::curr::ReadXdr;

        let issuer = Keypair::generate();
        let distributor = Keypair::generate();
        let asset = test_asset(&issuer);

        let envelope = TxBuilder::new(STELLAR_TESTNET.passphrase, &issuer.public_key(), 1)
            .unwrap()
            .payment(&distributor.public_key(), &asset, 1_000_000)
            .unwrap()
            .sign(&issuer)
            .unwrap();

        let encoded = envelope.to_base64().unwrap();
        let decoded = TransactionEnvelope::from_xdr_base64(&encoded, Limits::none()).unwrap();
        assert_eq!(&decoded, envelope.envelope());
    }

    #[test]
    fn hash_depends_on_network() {
        let issuer = Keypair::generate();
        let distributor = Keypair::generate();
        let asset = test_asset(&issuer);

        let build = |passphrase: &str| {
            TxBuilder::new(passphrase, &issuer.public_key(), 1)
                .unwrap()
                .payment(&distributor.public_key(), &asset, 5)
                .unwrap()
                .sign(&issuer)
                .unwrap()
                .hash_hex()
        };

        assert_ne!(
            build(crate::stellar::network::STELLAR_TESTNET.passphrase),
            build(crate::stellar::network::STELLAR_PUBLIC.passphrase)
        );
    }
}
