//! The per-currency capability surface and shared plumbing.
//!
//! Chain families implement the [`Currency`] trait over a shared
//! [`CurrencyCore`]: static descriptor, gateway access through the
//! invoker, and the cached public key for the currently configured
//! derivation path. Chain-specific knowledge (networks, chain ids) stays
//! in the family modules and arrives as configuration.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::time::sleep;

use keel_core::amount::Amount;
use keel_core::currency::CurrencyInfo;
use keel_core::fee::{FeeQuote, FeeSelection};
use keel_gateway::gateway::{ChainGateway, FeeRatesDto};
use keel_gateway::invoker::Invoker;

use crate::currencies::bitcoin::PreparedUtxoTransfer;
use crate::currencies::evm::PreparedAccountTransfer;
use crate::error::WalletError;
use crate::keys::{DerivationPath, KeySource, PublicKey, parse_derivation_path};

/// Confirmed and unconfirmed balance of one address.
#[derive(Debug, Clone, PartialEq)]
pub struct BalancePair {
    pub confirmed: Amount,
    pub unconfirmed: Amount,
}

/// Operations every supported currency exposes.
#[async_trait]
pub trait Currency: Send + Sync {
    /// Static descriptor of this currency.
    fn info(&self) -> &CurrencyInfo;

    /// The currently configured derivation path.
    fn derivation_path(&self) -> String;

    /// Reconfigure the derivation path, invalidating the cached public
    /// key. Concurrent calls race; the last write wins — callers
    /// serialize if they care.
    fn set_derivation_path(&self, path: &str) -> Result<(), WalletError>;

    /// The receive address for the current public key.
    fn address(&self) -> Result<String, WalletError>;

    /// Balance of `address`, or of the wallet's own address when `None`.
    async fn balance(&self, address: Option<&str>) -> Result<BalancePair, WalletError>;

    /// Assemble an unsigned transfer with a fresh fee quote.
    async fn prepare_transfer(
        &self,
        to_address: &str,
        amount: Amount,
    ) -> Result<PreparedTransfer, WalletError>;
}

/// A prepared transfer of either chain family.
///
/// Consumed exactly once by [`confirm`](PreparedTransfer::confirm);
/// the amount/fee/input snapshot it holds is immutable.
#[derive(Debug)]
pub enum PreparedTransfer {
    Utxo(PreparedUtxoTransfer),
    Account(PreparedAccountTransfer),
}

impl PreparedTransfer {
    /// The fee quote fetched when this transfer was prepared.
    pub fn fee_quote(&self) -> &FeeQuote {
        match self {
            PreparedTransfer::Utxo(t) => t.fee_quote(),
            PreparedTransfer::Account(t) => t.fee_quote(),
        }
    }

    /// Sign, broadcast, and return the confirmed handle.
    pub async fn confirm(
        self,
        selection: impl Into<FeeSelection> + Send,
    ) -> Result<ConfirmedTransaction, WalletError> {
        match self {
            PreparedTransfer::Utxo(t) => t.confirm(selection).await,
            PreparedTransfer::Account(t) => t.confirm(selection).await,
        }
    }
}

/// A broadcast transaction being tracked to finality.
///
/// Holds only the transaction id; every confirmation check is a fresh
/// gateway query, never cached.
pub struct ConfirmedTransaction {
    tx_id: String,
    currency_id: String,
    gateway: Arc<dyn ChainGateway>,
    invoker: Arc<Invoker>,
    poll_interval: Duration,
}

impl ConfirmedTransaction {
    pub(crate) fn new(core: &CurrencyCore, tx_id: String) -> Self {
        Self {
            tx_id,
            currency_id: core.info.id.clone(),
            gateway: core.gateway.clone(),
            invoker: core.invoker.clone(),
            poll_interval: core.poll_interval,
        }
    }

    /// The chain-assigned transaction id.
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Query whether the transaction has been included in a block.
    pub async fn is_confirmed(&self) -> Result<bool, WalletError> {
        let details = self
            .invoker
            .invoke(|| {
                self.gateway
                    .transaction_details(&self.currency_id, &self.tx_id)
            })
            .await?;
        Ok(details.block_height.is_some())
    }

    /// Poll [`is_confirmed`](Self::is_confirmed) until it reports true,
    /// checking once immediately and then at the configured interval.
    ///
    /// There is no internal timeout — the wait is unbounded by design.
    /// Cancellation is cooperative: drop the future; no partial state is
    /// left behind since the check is a pure read. Callers needing a
    /// deadline impose one externally.
    pub async fn wait_until_confirmed(&self) -> Result<(), WalletError> {
        loop {
            if self.is_confirmed().await? {
                return Ok(());
            }
            sleep(self.poll_interval).await;
        }
    }
}

impl fmt::Debug for ConfirmedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfirmedTransaction")
            .field("tx_id", &self.tx_id)
            .field("currency_id", &self.currency_id)
            .finish()
    }
}

struct KeyState {
    path_text: String,
    path: DerivationPath,
    public_key: PublicKey,
}

/// Plumbing shared by every currency implementation.
pub(crate) struct CurrencyCore {
    pub(crate) info: CurrencyInfo,
    pub(crate) gateway: Arc<dyn ChainGateway>,
    pub(crate) invoker: Arc<Invoker>,
    pub(crate) key_source: Arc<KeySource>,
    pub(crate) poll_interval: Duration,
    key_state: RwLock<KeyState>,
}

impl CurrencyCore {
    /// Build the core and derive the initial public key at the
    /// currency's default path. Requires the key source to be plaintext,
    /// which is the case during wallet construction.
    pub(crate) fn new(
        info: CurrencyInfo,
        gateway: Arc<dyn ChainGateway>,
        invoker: Arc<Invoker>,
        key_source: Arc<KeySource>,
        poll_interval: Duration,
    ) -> Result<Self, WalletError> {
        let path_text = info.default_derivation_path.clone();
        let path = parse_derivation_path(&path_text)?;
        let public_key = key_source.public_key(&path)?;
        Ok(Self {
            info,
            gateway,
            invoker,
            key_source,
            poll_interval,
            key_state: RwLock::new(KeyState {
                path_text,
                path,
                public_key,
            }),
        })
    }

    pub(crate) fn derivation_path(&self) -> String {
        self.read_keys().path_text.clone()
    }

    /// Derive at the new path first, then swap path and cached key
    /// together; a failing derivation leaves the old state intact.
    pub(crate) fn set_derivation_path(&self, path_text: &str) -> Result<(), WalletError> {
        let path = parse_derivation_path(path_text)?;
        let public_key = self.key_source.public_key(&path)?;
        let mut state = self.write_keys();
        state.path_text = path_text.to_owned();
        state.path = path;
        state.public_key = public_key;
        Ok(())
    }

    /// The cached public key for the current path.
    pub(crate) fn public_key(&self) -> PublicKey {
        self.read_keys().public_key.clone()
    }

    /// Snapshot of the current derivation path.
    pub(crate) fn path_snapshot(&self) -> DerivationPath {
        self.read_keys().path.clone()
    }

    /// Fetch and parse a balance pair.
    pub(crate) async fn balance(&self, address: &str) -> Result<BalancePair, WalletError> {
        let dto = self
            .invoker
            .invoke(|| self.gateway.balance(&self.info.id, address))
            .await?;
        Ok(BalancePair {
            confirmed: self.parse_base_amount(&dto.confirmed)?,
            unconfirmed: self.parse_base_amount(&dto.unconfirmed)?,
        })
    }

    /// Fetch the raw fee-rate table; family modules turn it into a quote.
    pub(crate) async fn fee_rates(&self) -> Result<FeeRatesDto, WalletError> {
        Ok(self
            .invoker
            .invoke(|| self.gateway.fee_rates(&self.info.id))
            .await?)
    }

    /// Submit a raw transaction and wrap the id for tracking.
    pub(crate) async fn broadcast(&self, raw: &[u8]) -> Result<ConfirmedTransaction, WalletError> {
        let dto = self
            .invoker
            .invoke(|| self.gateway.broadcast(&self.info.id, raw))
            .await?;
        Ok(ConfirmedTransaction::new(self, dto.tx_id))
    }

    /// Interpret a base-unit decimal string from the gateway.
    pub(crate) fn parse_base_amount(&self, text: &str) -> Result<Amount, WalletError> {
        let value = Decimal::from_str(text).map_err(|_| {
            WalletError::MalformedResponse(format!("decimal amount {text:?}"))
        })?;
        Ok(Amount::new(self.info.clone(), value))
    }

    fn read_keys(&self) -> std::sync::RwLockReadGuard<'_, KeyState> {
        self.key_state.read().expect("currency key state poisoned")
    }

    fn write_keys(&self) -> std::sync::RwLockWriteGuard<'_, KeyState> {
        self.key_state.write().expect("currency key state poisoned")
    }
}

impl fmt::Debug for CurrencyCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrencyCore")
            .field("currency", &self.info.id)
            .field("derivation_path", &self.derivation_path())
            .finish()
    }
}
