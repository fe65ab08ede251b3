//! Currency implementations and the default registry.
//!
//! Bitcoin plus the supported EVM chains, every instance built from
//! configuration against the same gateway, invoker, and key source.

pub mod bitcoin;
pub mod evm;

use std::sync::Arc;
use std::time::Duration;

// Leading `::` keeps the crate distinct from the `bitcoin` child module.
use ::bitcoin::Network;

use keel_core::currency::CurrencyInfo;
use keel_core::traits::{AccountSigner, UtxoSigner};
use keel_gateway::gateway::ChainGateway;
use keel_gateway::invoker::Invoker;

use self::bitcoin::BitcoinCurrency;
use self::evm::EvmCurrency;
use crate::currency::Currency;
use crate::error::WalletError;
use crate::keys::KeySource;

const EVM_DERIVATION_PATH: &str = "m/44'/60'/0'/0/0";

fn evm_info(id: &str, name: &str, symbol: &str) -> CurrencyInfo {
    CurrencyInfo {
        id: id.into(),
        name: name.into(),
        symbol: symbol.into(),
        minimal_unit_symbol: "wei".into(),
        decimals: 18,
        default_derivation_path: EVM_DERIVATION_PATH.into(),
    }
}

/// Descriptor and chain id of every supported EVM chain.
pub fn evm_chains() -> Vec<(CurrencyInfo, u64)> {
    vec![
        (evm_info("arbitrum", "Arbitrum One", "ARB"), 0xa4b1),
        (evm_info("avalanche", "Avalanche C-Chain", "AVAX"), 0xa86a),
        (evm_info("binanceSmartChain", "Binance Smart Chain", "BSC"), 0x38),
        (evm_info("boba", "Boba Network", "BOBA"), 0x120),
        (evm_info("ethereum", "Ethereum", "ETH"), 0x01),
        (evm_info("polygon", "Polygon", "MATIC"), 0x89),
    ]
}

/// Every currency a wallet serves.
#[derive(Debug)]
pub struct Currencies {
    pub bitcoin: Arc<BitcoinCurrency>,
    pub arbitrum: Arc<EvmCurrency>,
    pub avalanche: Arc<EvmCurrency>,
    pub binance_smart_chain: Arc<EvmCurrency>,
    pub boba: Arc<EvmCurrency>,
    pub ethereum: Arc<EvmCurrency>,
    pub polygon: Arc<EvmCurrency>,
}

impl Currencies {
    pub(crate) fn new(
        gateway: Arc<dyn ChainGateway>,
        invoker: Arc<Invoker>,
        key_source: Arc<KeySource>,
        utxo_signer: Arc<dyn UtxoSigner>,
        account_signer: Arc<dyn AccountSigner>,
        poll_interval: Duration,
    ) -> Result<Self, WalletError> {
        let bitcoin = Arc::new(BitcoinCurrency::new(
            Network::Bitcoin,
            gateway.clone(),
            invoker.clone(),
            key_source.clone(),
            utxo_signer,
            poll_interval,
        )?);

        let mut evms = evm_chains()
            .into_iter()
            .map(|(info, chain_id)| {
                Ok(Arc::new(EvmCurrency::new(
                    info,
                    chain_id,
                    gateway.clone(),
                    invoker.clone(),
                    key_source.clone(),
                    account_signer.clone(),
                    poll_interval,
                )?))
            })
            .collect::<Result<Vec<_>, WalletError>>()?
            .into_iter();

        // Same order as `evm_chains`.
        Ok(Self {
            bitcoin,
            arbitrum: evms.next().expect("arbitrum configured"),
            avalanche: evms.next().expect("avalanche configured"),
            binance_smart_chain: evms.next().expect("binance smart chain configured"),
            boba: evms.next().expect("boba configured"),
            ethereum: evms.next().expect("ethereum configured"),
            polygon: evms.next().expect("polygon configured"),
        })
    }

    /// Every registered currency.
    pub fn all(&self) -> Vec<Arc<dyn Currency>> {
        vec![
            self.bitcoin.clone(),
            self.arbitrum.clone(),
            self.avalanche.clone(),
            self.binance_smart_chain.clone(),
            self.boba.clone(),
            self.ethereum.clone(),
            self.polygon.clone(),
        ]
    }
}
