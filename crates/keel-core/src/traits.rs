//! Collaborator contracts for the signing/serialization primitives the
//! engine does not implement itself.
//!
//! The engine assembles a complete transfer spec (inputs, amounts, fee,
//! chain parameters) and a raw signing key; the collaborator produces the
//! chain-specific serialized, signed transaction bytes ready for
//! broadcast. Script/RLP encoding and elliptic-curve signing live behind
//! these traits.

use crate::error::SignError;
use crate::types::{AccountTransferSpec, UtxoTransferSpec};

/// Builds and signs transactions for UTXO-model chains.
pub trait UtxoSigner: Send + Sync {
    /// Assemble, sign, and serialize a transfer. `signing_key` is the
    /// raw 32-byte secp256k1 secret for the sender's address.
    fn build_and_sign(&self, spec: &UtxoTransferSpec, signing_key: &[u8])
    -> Result<Vec<u8>, SignError>;
}

/// Builds and signs transactions for account-model (fee-market) chains.
pub trait AccountSigner: Send + Sync {
    /// Assemble, sign, and serialize a transaction. `signing_key` is the
    /// raw 32-byte secp256k1 secret for the sender's address.
    fn build_and_sign(
        &self,
        spec: &AccountTransferSpec,
        signing_key: &[u8],
    ) -> Result<Vec<u8>, SignError>;
}
