//! Core error types.

use thiserror::Error;

/// Errors from amount construction and arithmetic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The input does not match the amount grammar or names an unknown
    /// unit symbol.
    #[error("cannot parse amount: {0}")]
    CannotParse(String),

    /// Arithmetic or comparison between different currencies.
    #[error("currency mismatch: {left} vs {right}")]
    CurrencyMismatch { left: String, right: String },

    /// The value does not land on a whole minimal unit.
    #[error("not a whole number of minimal units: {0}")]
    NotRepresentable(String),
}

/// Errors from signing collaborators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    /// The signing key bytes are not a valid secret key.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// Transaction assembly or serialization failed.
    #[error("transaction assembly: {0}")]
    Assembly(String),
}
