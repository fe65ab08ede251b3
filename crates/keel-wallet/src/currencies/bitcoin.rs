//! Bitcoin-family currencies (UTXO model).
//!
//! Addresses come from the configured network and key; transfers select
//! inputs greedily, quote per-vbyte fees, and hand a complete spec to the
//! [`UtxoSigner`] collaborator for script assembly and signing.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bitcoin::key::{CompressedPublicKey, PublicKey as BitcoinPublicKey};
use bitcoin::secp256k1::{PublicKey as SecpPublicKey, Secp256k1, XOnlyPublicKey};
use bitcoin::{Address, Network};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use keel_core::amount::Amount;
use keel_core::currency::CurrencyInfo;
use keel_core::error::AmountError;
use keel_core::fee::{Fee, FeeQuote, FeeSelection};
use keel_core::traits::UtxoSigner;
use keel_core::types::{Utxo, UtxoFee, UtxoInput, UtxoTransferSpec};
use keel_gateway::gateway::{ChainGateway, FeeRateDto};
use keel_gateway::invoker::Invoker;

use crate::coin_selection::select_utxos;
use crate::currency::{BalancePair, ConfirmedTransaction, Currency, CurrencyCore, PreparedTransfer};
use crate::error::WalletError;
use crate::keys::{DerivationPath, KeySource};

/// Address encodings the engine can produce for its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// P2PKH, base58.
    Legacy,
    /// P2WPKH, bech32. The default receive format.
    SegWit,
    /// P2TR, bech32m.
    Taproot,
    /// P2SH — no script to wrap, unsupported.
    ScriptHash,
    /// P2WSH — no script to wrap, unsupported.
    WitnessScriptHash,
}

/// A Bitcoin-family currency instance.
pub struct BitcoinCurrency {
    core: Arc<CurrencyCore>,
    network: Network,
    signer: Arc<dyn UtxoSigner>,
}

impl BitcoinCurrency {
    /// Descriptor for the given network.
    pub fn info_for(network: Network) -> CurrencyInfo {
        let mainnet = network == Network::Bitcoin;
        CurrencyInfo {
            id: if mainnet { "bitcoin" } else { "bitcoin-testnet" }.into(),
            name: "Bitcoin".into(),
            symbol: if mainnet { "BTC" } else { "BTC-TESTNET" }.into(),
            minimal_unit_symbol: "satoshi".into(),
            decimals: 8,
            default_derivation_path: if mainnet {
                "m/84'/0'/0'/0/0"
            } else {
                "m/84'/1'/0'/0/0"
            }
            .into(),
        }
    }

    pub fn new(
        network: Network,
        gateway: Arc<dyn ChainGateway>,
        invoker: Arc<Invoker>,
        key_source: Arc<KeySource>,
        signer: Arc<dyn UtxoSigner>,
        poll_interval: Duration,
    ) -> Result<Self, WalletError> {
        let core = CurrencyCore::new(
            Self::info_for(network),
            gateway,
            invoker,
            key_source,
            poll_interval,
        )?;
        Ok(Self {
            core: Arc::new(core),
            network,
            signer,
        })
    }

    /// Encode the current public key as an address of the given kind.
    pub fn address_of_kind(&self, kind: AddressKind) -> Result<String, WalletError> {
        let public_key = self.core.public_key();
        let full = SecpPublicKey::from_slice(&public_key.compressed)
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;
        let compressed = CompressedPublicKey::try_from(BitcoinPublicKey::new(full))
            .map_err(|e| WalletError::KeyDerivation(e.to_string()))?;

        let address = match kind {
            AddressKind::Legacy => Address::p2pkh(compressed.pubkey_hash(), self.network),
            AddressKind::SegWit => Address::p2wpkh(&compressed, self.network),
            AddressKind::Taproot => {
                let secp = Secp256k1::new();
                Address::p2tr(&secp, XOnlyPublicKey::from(full), None, self.network)
            }
            AddressKind::ScriptHash | AddressKind::WitnessScriptHash => {
                return Err(WalletError::UnsupportedAddress(
                    "generating script addresses is currently unsupported".into(),
                ));
            }
        };
        Ok(address.to_string())
    }

    /// Prepare a transfer: select inputs for the amount, then fetch a
    /// fresh per-vbyte fee quote.
    pub async fn prepare(
        &self,
        to_address: &str,
        amount: Amount,
    ) -> Result<PreparedUtxoTransfer, WalletError> {
        if to_address.starts_with("bc1p") || to_address.starts_with("tb1p") {
            return Err(WalletError::UnsupportedAddress(
                "taproot destinations are not yet supported".into(),
            ));
        }

        let from_address = self.address()?;
        let inputs = select_utxos(
            self.core.gateway.as_ref(),
            &self.core.invoker,
            &self.core.info,
            &from_address,
            &amount,
        )
        .await?;
        let fee_quote = self.fee_quote().await?;

        Ok(PreparedUtxoTransfer {
            core: self.core.clone(),
            signer: self.signer.clone(),
            path: self.core.path_snapshot(),
            from_address,
            to_address: to_address.to_owned(),
            amount,
            inputs,
            fee_quote,
        })
    }

    async fn fee_quote(&self) -> Result<FeeQuote, WalletError> {
        let rates = self.core.fee_rates().await?;
        let per_vbyte = |dto: &FeeRateDto| -> Result<Fee, WalletError> {
            let text = dto.fee_per_byte.as_ref().ok_or_else(|| {
                WalletError::MalformedResponse("fee rate without feePerByte".into())
            })?;
            Ok(Fee::PerVbyte(self.core.parse_base_amount(text)?))
        };
        Ok(FeeQuote::new(
            per_vbyte(&rates.low)?,
            per_vbyte(&rates.normal)?,
            per_vbyte(&rates.high)?,
            per_vbyte(&rates.maximum)?,
        ))
    }
}

#[async_trait]
impl Currency for BitcoinCurrency {
    fn info(&self) -> &CurrencyInfo {
        &self.core.info
    }

    fn derivation_path(&self) -> String {
        self.core.derivation_path()
    }

    fn set_derivation_path(&self, path: &str) -> Result<(), WalletError> {
        self.core.set_derivation_path(path)
    }

    fn address(&self) -> Result<String, WalletError> {
        self.address_of_kind(AddressKind::SegWit)
    }

    async fn balance(&self, address: Option<&str>) -> Result<BalancePair, WalletError> {
        let own;
        let address = match address {
            Some(addr) => addr,
            None => {
                own = self.address()?;
                &own
            }
        };
        self.core.balance(address).await
    }

    async fn prepare_transfer(
        &self,
        to_address: &str,
        amount: Amount,
    ) -> Result<PreparedTransfer, WalletError> {
        Ok(PreparedTransfer::Utxo(self.prepare(to_address, amount).await?))
    }
}

impl std::fmt::Debug for BitcoinCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BitcoinCurrency")
            .field("network", &self.network)
            .field("derivation_path", &self.core.derivation_path())
            .finish()
    }
}

/// An assembled, unsigned UTXO transfer awaiting fee selection.
///
/// The snapshot (sender, destination, amount, inputs, quote) is immutable
/// and consumed exactly once by [`confirm`](Self::confirm).
pub struct PreparedUtxoTransfer {
    core: Arc<CurrencyCore>,
    signer: Arc<dyn UtxoSigner>,
    path: DerivationPath,
    from_address: String,
    to_address: String,
    amount: Amount,
    inputs: Vec<Utxo>,
    fee_quote: FeeQuote,
}

impl PreparedUtxoTransfer {
    pub fn fee_quote(&self) -> &FeeQuote {
        &self.fee_quote
    }

    pub fn from_address(&self) -> &str {
        &self.from_address
    }

    pub fn to_address(&self) -> &str {
        &self.to_address
    }

    pub fn amount(&self) -> &Amount {
        &self.amount
    }

    /// The exclusive input set of this transfer.
    pub fn inputs(&self) -> &[Utxo] {
        &self.inputs
    }

    /// Resolve the fee, sign, and broadcast.
    pub async fn confirm(
        self,
        selection: impl Into<FeeSelection> + Send,
    ) -> Result<ConfirmedTransaction, WalletError> {
        let fee = match selection.into().resolve(&self.fee_quote) {
            Fee::PerVbyte(rate) => UtxoFee::PerVbyte(sats_per_vbyte(&rate)?),
            Fee::Total(total) => UtxoFee::Total(sats(&total)?),
            Fee::FeeMarket { .. } => {
                return Err(WalletError::UnsupportedFee(self.core.info.symbol.clone()));
            }
        };

        let signing_key = self.core.key_source.signing_key(&self.path)?;

        let inputs = self
            .inputs
            .iter()
            .map(|utxo| {
                Ok(UtxoInput {
                    txid: utxo.txid.clone(),
                    vout: utxo.vout,
                    value: sats(&Amount::new(self.core.info.clone(), utxo.amount))?,
                    script: utxo.script.clone(),
                })
            })
            .collect::<Result<Vec<_>, WalletError>>()?;

        let spec = UtxoTransferSpec {
            from_address: self.from_address.clone(),
            to_address: self.to_address.clone(),
            change_address: self.from_address.clone(),
            amount: sats(&self.amount)?,
            inputs,
            fee,
        };

        let raw = self.signer.build_and_sign(&spec, &signing_key[..])?;
        self.core.broadcast(&raw).await
    }
}

impl std::fmt::Debug for PreparedUtxoTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedUtxoTransfer")
            .field("from", &self.from_address)
            .field("to", &self.to_address)
            .field("amount", &self.amount)
            .field("inputs", &self.inputs.len())
            .finish()
    }
}

/// Whole satoshis of an amount.
fn sats(amount: &Amount) -> Result<u64, WalletError> {
    let minimal = amount.minimal_integer()?;
    u64::try_from(minimal)
        .map_err(|_| AmountError::NotRepresentable(minimal.to_string()).into())
}

/// Satoshis per vbyte, rounded up so the paid rate never undercuts the
/// quoted one.
fn sats_per_vbyte(rate: &Amount) -> Result<u64, WalletError> {
    let minimal: Decimal = rate.minimal_units().ceil();
    minimal
        .to_u64()
        .ok_or_else(|| AmountError::NotRepresentable(minimal.to_string()).into())
}
