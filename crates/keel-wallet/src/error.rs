//! Wallet error types.

use keel_core::error::{AmountError, SignError};
use keel_gateway::error::ApiError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur in wallet operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The password does not decrypt the secret container.
    #[error("incorrect password")]
    IncorrectPassword,

    /// A key operation needed plaintext secret material while the wallet
    /// is encrypted.
    #[error(
        "wallet is currently encrypted; run operations that use the \
         private key inside run_unencrypted(password, ...)"
    )]
    WalletIsEncrypted,

    /// `run_unencrypted` called on a container that is already plaintext.
    #[error("wallet is not encrypted")]
    NotEncrypted,

    /// `encrypt` called on a container that is already encrypted.
    #[error("wallet is already encrypted")]
    AlreadyEncrypted,

    /// Derivation requested from an imported raw private key.
    #[error("derivation paths are not supported (imported private key?)")]
    CannotDerive,

    /// The balance or UTXO set cannot cover the requested amount.
    #[error("not enough funds: {missing} {currency} more needed")]
    NotEnoughFunds {
        /// Base-unit symbol of the currency.
        currency: String,
        /// Shortfall in base units.
        missing: Decimal,
    },

    /// Malformed imported key material (hex, WIF, phrase, seed).
    #[error("invalid encoding: {0}")]
    Encoding(String),

    /// The engine cannot produce or spend to this address format yet.
    #[error("unsupported address: {0}")]
    UnsupportedAddress(String),

    /// The selected fee kind does not apply to this chain family.
    #[error("unsupported fee kind for {0}")]
    UnsupportedFee(String),

    /// Hierarchical key derivation failed.
    #[error("key derivation: {0}")]
    KeyDerivation(String),

    /// Encrypting the secret container failed.
    #[error("encryption: {0}")]
    Encryption(String),

    /// The gateway answered with data the engine cannot interpret.
    #[error("malformed gateway response: {0}")]
    MalformedResponse(String),

    /// Amount construction or arithmetic error.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// Signing collaborator error.
    #[error(transparent)]
    Sign(#[from] SignError),

    /// Classified API-layer error.
    #[error(transparent)]
    Api(#[from] ApiError),
}
