//! Wallet composition.
//!
//! A [`Wallet`] ties one [`KeySource`] to the currency registry, the
//! gateway, and the configured invoker. Constructors cover the four ways
//! key material arrives: freshly generated phrase, recovered phrase,
//! master seed, and imported private key (hex or WIF).

use std::sync::Arc;

use zeroize::Zeroizing;

use keel_core::currency::CurrencyInfo;
use keel_core::traits::{AccountSigner, UtxoSigner};
use keel_gateway::gateway::ChainGateway;

use crate::config::WalletConfig;
use crate::currencies::Currencies;
use crate::currency::BalancePair;
use crate::error::WalletError;
use crate::keys::{KeySource, Language, Phrase, PrivateKeyMaterial, Seed};
use crate::mnemonic::PhraseLength;

/// External collaborators and configuration a wallet is built against.
#[derive(Clone)]
pub struct WalletContext {
    pub gateway: Arc<dyn ChainGateway>,
    pub utxo_signer: Arc<dyn UtxoSigner>,
    pub account_signer: Arc<dyn AccountSigner>,
    pub config: WalletConfig,
}

/// A multi-currency wallet over a single key source.
pub struct Wallet {
    key_source: Arc<KeySource>,
    currencies: Currencies,
    config: WalletConfig,
}

impl Wallet {
    /// Create a wallet with a freshly generated recovery phrase.
    pub fn generate(
        context: WalletContext,
        language: Language,
        length: PhraseLength,
    ) -> Result<Self, WalletError> {
        Self::build(context, KeySource::Phrase(Phrase::generate(language, length)))
    }

    /// Recover a wallet from an existing phrase.
    ///
    /// The phrase must checksum in a supported language.
    pub fn from_phrase(context: WalletContext, phrase: &str) -> Result<Self, WalletError> {
        if !Phrase::is_valid(phrase) {
            return Err(WalletError::Encoding("invalid phrase".into()));
        }
        Self::build(context, KeySource::Phrase(Phrase::new(phrase)))
    }

    /// Create a wallet from raw master-seed bytes.
    pub fn from_seed(
        context: WalletContext,
        seed: impl Into<Vec<u8>>,
    ) -> Result<Self, WalletError> {
        Self::build(context, KeySource::Seed(Seed::new(seed)))
    }

    /// Create a wallet from a hex-encoded master seed.
    pub fn from_seed_hex(context: WalletContext, seed: &str) -> Result<Self, WalletError> {
        Self::build(context, KeySource::Seed(Seed::from_hex(seed)?))
    }

    /// Import a wallet from a raw private key, hex or WIF encoded.
    pub fn from_private_key(context: WalletContext, key: &str) -> Result<Self, WalletError> {
        let material = if looks_like_hex(key) {
            PrivateKeyMaterial::from_hex(key)?
        } else if looks_like_base58(key) {
            PrivateKeyMaterial::from_wif(key)?
        } else {
            return Err(WalletError::Encoding(
                "private key is invalid or the format is unrecognized".into(),
            ));
        };
        Self::build(context, KeySource::PrivateKey(material))
    }

    fn build(context: WalletContext, source: KeySource) -> Result<Self, WalletError> {
        let key_source = Arc::new(source);
        let invoker = Arc::new(context.config.invoker());
        let currencies = Currencies::new(
            context.gateway,
            invoker,
            key_source.clone(),
            context.utxo_signer,
            context.account_signer,
            context.config.confirmation_poll_interval,
        )?;

        // Public keys are cached; from here on, plaintext key use is a
        // deliberate choice the configuration may acknowledge.
        key_source
            .vault()
            .set_plaintext_warning(!context.config.acknowledge_unencrypted);

        Ok(Self {
            key_source,
            currencies,
            config: context.config,
        })
    }

    /// The currency registry.
    pub fn currencies(&self) -> &Currencies {
        &self.currencies
    }

    /// The wallet's key source.
    pub fn key_source(&self) -> &KeySource {
        &self.key_source
    }

    /// The configuration this wallet was built with.
    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    /// The recovery phrase, for phrase-backed wallets.
    pub fn recovery_phrase(&self) -> Result<Option<Zeroizing<String>>, WalletError> {
        match &*self.key_source {
            KeySource::Phrase(phrase) => Ok(Some(phrase.phrase()?)),
            KeySource::Seed(_) | KeySource::PrivateKey(_) => Ok(None),
        }
    }

    /// Whether the key material is currently encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.key_source.vault().is_encrypted()
    }

    /// Encrypt the key material at rest.
    pub async fn encrypt(&self, password: &str) -> Result<(), WalletError> {
        self.key_source.vault().encrypt(password).await
    }

    /// Run `operation` with the key material temporarily decrypted,
    /// re-encrypting before this call returns.
    pub async fn run_unencrypted<T, F, Fut>(
        &self,
        password: &str,
        operation: F,
    ) -> Result<T, WalletError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, WalletError>>,
    {
        self.key_source
            .vault()
            .run_unencrypted(password, operation)
            .await
    }

    /// Fetch the balance of every registered currency.
    pub async fn all_balances(&self) -> Result<Vec<(CurrencyInfo, BalancePair)>, WalletError> {
        let mut balances = Vec::new();
        for currency in self.currencies.all() {
            let pair = currency.balance(None).await?;
            balances.push((currency.info().clone(), pair));
        }
        Ok(balances)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &*self.key_source {
            KeySource::Phrase(_) => "phrase",
            KeySource::Seed(_) => "seed",
            KeySource::PrivateKey(_) => "private-key",
        };
        f.debug_struct("Wallet")
            .field("key_source", &kind)
            .field("encrypted", &self.is_encrypted())
            .finish()
    }
}

fn looks_like_hex(text: &str) -> bool {
    let stripped = text.strip_prefix("0x").unwrap_or(text);
    !stripped.is_empty()
        && stripped.len() % 2 == 0
        && stripped.chars().all(|c| c.is_ascii_hexdigit())
}

fn looks_like_base58(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l'))
}
