//! # keel-wallet — multi-currency HD wallet engine.
//!
//! Manages secret key material under encryption-at-rest, derives
//! per-currency signing keys from a single phrase, seed, or imported key,
//! assembles transfers against gateway-supplied chain state, and tracks
//! submitted transactions to confirmation.
//!
//! # Modules
//!
//! - [`error`] — `WalletError` enum
//! - [`encryption`] — PBKDF2 + AES-256-GCM sealing
//! - [`vault`] — the encrypted secret container with scoped decryption
//! - [`mnemonic`] — phrase generation, validation, seed derivation
//! - [`keys`] — key sources and BIP-32 derivation
//! - [`coin_selection`] — greedy paged UTXO selection
//! - [`currency`] — the per-currency capability trait and lifecycle types
//! - [`currencies`] — the chain families and the default registry
//! - [`wallet`] — wallet composition and constructors
//! - [`config`] — `WalletConfig`

pub mod coin_selection;
pub mod config;
pub mod currencies;
pub mod currency;
pub mod encryption;
pub mod error;
pub mod keys;
pub mod mnemonic;
pub mod vault;
pub mod wallet;

#[cfg(test)]
mod testutil;

// Re-exports for convenient access
pub use config::WalletConfig;
pub use currencies::Currencies;
pub use currencies::bitcoin::{AddressKind, BitcoinCurrency, PreparedUtxoTransfer};
pub use currencies::evm::{EvmCurrency, PreparedAccountTransfer};
pub use currency::{BalancePair, ConfirmedTransaction, Currency, PreparedTransfer};
pub use error::WalletError;
pub use keys::{DerivationPath, KeySource, Language, Phrase, PrivateKeyMaterial, PublicKey, Seed};
pub use mnemonic::PhraseLength;
pub use vault::SecretVault;
pub use wallet::{Wallet, WalletContext};
