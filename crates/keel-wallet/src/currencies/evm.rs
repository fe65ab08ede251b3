//! EVM-family currencies (account model, fee-market pricing).
//!
//! One implementation serves every EVM chain; the chain id and descriptor
//! arrive as configuration. Addresses are Keccak-256 of the uncompressed
//! public key with EIP-55 checksum casing. Transfer preparation fails
//! fast on insufficient confirmed balance — before any fee-rate call —
//! and `confirm` fetches the nonce and gas estimate at submission time.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use sha3::{Digest, Keccak256};

use keel_core::amount::Amount;
use keel_core::currency::CurrencyInfo;
use keel_core::error::AmountError;
use keel_core::fee::{Fee, FeeQuote, FeeSelection};
use keel_core::traits::AccountSigner;
use keel_core::types::AccountTransferSpec;
use keel_gateway::gateway::{ChainGateway, FeeRateDto, GasEstimateRequest};
use keel_gateway::invoker::Invoker;

use crate::currency::{BalancePair, ConfirmedTransaction, Currency, CurrencyCore, PreparedTransfer};
use crate::error::WalletError;
use crate::keys::{DerivationPath, KeySource, PublicKey};

/// An EVM-family currency instance.
pub struct EvmCurrency {
    core: Arc<CurrencyCore>,
    chain_id: u64,
    signer: Arc<dyn AccountSigner>,
}

impl EvmCurrency {
    pub fn new(
        info: CurrencyInfo,
        chain_id: u64,
        gateway: Arc<dyn ChainGateway>,
        invoker: Arc<Invoker>,
        key_source: Arc<KeySource>,
        signer: Arc<dyn AccountSigner>,
        poll_interval: Duration,
    ) -> Result<Self, WalletError> {
        let core = CurrencyCore::new(info, gateway, invoker, key_source, poll_interval)?;
        Ok(Self {
            core: Arc::new(core),
            chain_id,
            signer,
        })
    }

    /// The EIP-155 chain id this instance signs for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Prepare a plain value transfer.
    pub async fn prepare(
        &self,
        to_address: &str,
        amount: Amount,
    ) -> Result<PreparedAccountTransfer, WalletError> {
        self.prepare_contract_call(to_address, amount, Vec::new()).await
    }

    /// Prepare a transaction carrying call data (contract interaction).
    ///
    /// Checks the confirmed balance against the amount first and fails
    /// with [`WalletError::NotEnoughFunds`] before any fee-rate call.
    pub async fn prepare_contract_call(
        &self,
        to_address: &str,
        amount: Amount,
        data: Vec<u8>,
    ) -> Result<PreparedAccountTransfer, WalletError> {
        let from_address = self.address()?;
        let balance = self.core.balance(&from_address).await?;
        if balance.confirmed.compare(&amount)? == std::cmp::Ordering::Less {
            let missing = amount.checked_sub(&balance.confirmed)?;
            return Err(WalletError::NotEnoughFunds {
                currency: self.core.info.symbol.clone(),
                missing: missing.base_units(),
            });
        }

        let fee_quote = self.fee_quote().await?;

        Ok(PreparedAccountTransfer {
            core: self.core.clone(),
            signer: self.signer.clone(),
            path: self.core.path_snapshot(),
            chain_id: self.chain_id,
            from_address,
            to_address: to_address.to_owned(),
            amount,
            data,
            fee_quote,
        })
    }

    /// Execute a read-only contract call, returning the result data.
    pub async fn call_contract(
        &self,
        contract: &str,
        data: &[u8],
    ) -> Result<Vec<u8>, WalletError> {
        let dto = self
            .core
            .invoker
            .invoke(|| self.core.gateway.call_contract(&self.core.info.id, contract, data))
            .await?;
        hex::decode(dto.result.trim_start_matches("0x"))
            .map_err(|_| WalletError::MalformedResponse(format!("call result {:?}", dto.result)))
    }

    async fn fee_quote(&self) -> Result<FeeQuote, WalletError> {
        let rates = self.core.fee_rates().await?;
        let market = |dto: &FeeRateDto| -> Result<Fee, WalletError> {
            let max = dto.max_fee_per_gas.as_ref().ok_or_else(|| {
                WalletError::MalformedResponse("fee rate without maxFeePerGas".into())
            })?;
            let priority = dto.max_priority_fee_per_gas.as_ref().ok_or_else(|| {
                WalletError::MalformedResponse("fee rate without maxPriorityFeePerGas".into())
            })?;
            Ok(Fee::FeeMarket {
                max_fee_per_unit: self.core.parse_base_amount(max)?,
                max_priority_fee_per_unit: self.core.parse_base_amount(priority)?,
            })
        };
        Ok(FeeQuote::new(
            market(&rates.low)?,
            market(&rates.normal)?,
            market(&rates.high)?,
            market(&rates.maximum)?,
        ))
    }
}

#[async_trait]
impl Currency for EvmCurrency {
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
        Ok(evm_address(&self.core.public_key()))
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
        Ok(PreparedTransfer::Account(
            self.prepare(to_address, amount).await?,
        ))
    }
}

impl std::fmt::Debug for EvmCurrency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvmCurrency")
            .field("currency", &self.core.info.id)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// An assembled account-model transaction awaiting fee selection.
///
/// The snapshot is immutable and consumed exactly once by
/// [`confirm`](Self::confirm); the nonce and gas limit are fetched fresh
/// at confirmation time.
pub struct PreparedAccountTransfer {
    core: Arc<CurrencyCore>,
    signer: Arc<dyn AccountSigner>,
    path: DerivationPath,
    chain_id: u64,
    from_address: String,
    to_address: String,
    amount: Amount,
    data: Vec<u8>,
    fee_quote: FeeQuote,
}

impl PreparedAccountTransfer {
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

    /// Resolve the fee, fetch nonce and gas, sign, and broadcast.
    pub async fn confirm(
        self,
        selection: impl Into<FeeSelection> + Send,
    ) -> Result<ConfirmedTransaction, WalletError> {
        let (max_fee, max_priority) = match selection.into().resolve(&self.fee_quote) {
            Fee::FeeMarket {
                max_fee_per_unit,
                max_priority_fee_per_unit,
            } => (max_fee_per_unit, max_priority_fee_per_unit),
            Fee::PerVbyte(_) | Fee::Total(_) => {
                return Err(WalletError::UnsupportedFee(self.core.info.symbol.clone()));
            }
        };

        let signing_key = self.core.key_source.signing_key(&self.path)?;

        let nonce = self
            .core
            .invoker
            .invoke(|| {
                self.core
                    .gateway
                    .transaction_count(&self.core.info.id, &self.from_address)
            })
            .await?;

        let request = GasEstimateRequest {
            from: self.from_address.clone(),
            to: self.to_address.clone(),
            nonce,
            value: self.amount.base_units().to_string(),
            data: format!("0x{}", hex::encode(&self.data)),
        };
        let gas_limit = self
            .core
            .invoker
            .invoke(|| self.core.gateway.estimate_gas(&self.core.info.id, &request))
            .await?;

        let spec = AccountTransferSpec {
            from_address: self.from_address.clone(),
            to_address: self.to_address.clone(),
            value: self.amount.minimal_integer()?,
            nonce,
            gas_limit,
            max_fee_per_unit: wei(&max_fee)?,
            max_priority_fee_per_unit: wei(&max_priority)?,
            chain_id: self.chain_id,
            data: self.data.clone(),
        };

        let raw = self.signer.build_and_sign(&spec, &signing_key[..])?;
        self.core.broadcast(&raw).await
    }
}

impl std::fmt::Debug for PreparedAccountTransfer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedAccountTransfer")
            .field("from", &self.from_address)
            .field("to", &self.to_address)
            .field("amount", &self.amount)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// EIP-55 checksummed address of a public key.
pub(crate) fn evm_address(public_key: &PublicKey) -> String {
    let hash = Keccak256::digest(&public_key.uncompressed[1..]);
    checksum_address(&hash[12..])
}

/// Apply EIP-55 casing to 20 address bytes.
fn checksum_address(address: &[u8]) -> String {
    let lower = hex::encode(address);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut result = String::with_capacity(42);
    result.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let byte = hash[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            result.push(ch.to_ascii_uppercase());
        } else {
            result.push(ch);
        }
    }
    result
}

/// Whole wei of an amount.
fn wei(amount: &Amount) -> Result<u128, WalletError> {
    let minimal = amount.minimal_units();
    minimal
        .to_u128()
        .filter(|_| minimal.fract().is_zero() && !minimal.is_sign_negative())
        .ok_or_else(|| AmountError::NotRepresentable(minimal.to_string()).into())
}
