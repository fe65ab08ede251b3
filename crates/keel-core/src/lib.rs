//! # keel-core
//! Foundation types for the Keel wallet engine.
//!
//! - [`currency`] — static currency descriptors
//! - [`amount`] — currency-scoped exact-decimal amounts
//! - [`fee`] — fee model and four-grade fee quotes
//! - [`types`] — UTXOs and the transfer specs handed to signers
//! - [`traits`] — signing/serialization collaborator contracts
//! - [`error`] — `AmountError`, `SignError`

pub mod amount;
pub mod currency;
pub mod error;
pub mod fee;
pub mod traits;
pub mod types;

pub use amount::Amount;
pub use currency::CurrencyInfo;
pub use error::{AmountError, SignError};
pub use fee::{Fee, FeeGrade, FeeQuote, FeeSelection};
pub use traits::{AccountSigner, UtxoSigner};
pub use types::{AccountTransferSpec, Utxo, UtxoFee, UtxoInput, UtxoTransferSpec};
