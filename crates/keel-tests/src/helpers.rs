//! Shared test helpers: a scripted gateway and recording signers.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use keel_core::error::SignError;
use keel_core::traits::{AccountSigner, UtxoSigner};
use keel_core::types::{AccountTransferSpec, UtxoTransferSpec};
use keel_gateway::error::GatewayError;
use keel_gateway::gateway::{
    BalanceDto, BroadcastDto, ChainGateway, ContractCallDto, FeeRateDto, FeeRatesDto,
    GasEstimateRequest, TransactionDetailsDto, UtxoDto, UtxoPageDto,
};
use keel_wallet::{WalletConfig, WalletContext};

/// The BIP-39 reference phrase used across the suite.
pub const REFERENCE_PHRASE: &str =
    "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// BIP-84 address of the reference phrase at the default path.
pub const REFERENCE_BITCOIN_ADDRESS: &str = "bc1qcr8te4kr609gcawutmrza0j4xv80jy8z306fyu";

/// EIP-55 address of the reference phrase at the default EVM path.
pub const REFERENCE_ETHEREUM_ADDRESS: &str = "0x9858EfFD232B4033E47d90003D41EC34EcaEda94";

/// Install a test-friendly tracing subscriber (idempotent).
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// HTTP-status failure shorthand.
pub fn http(status: u16) -> GatewayError {
    GatewayError::Http {
        status,
        retry_after: None,
    }
}

/// Rate-limit failure with a retry-after.
pub fn rate_limited(secs: u64) -> GatewayError {
    GatewayError::Http {
        status: 429,
        retry_after: Some(Duration::from_secs(secs)),
    }
}

/// A scripted gateway: canned responses, per-method failure queues, and
/// call counters.
pub struct ScriptedGateway {
    balance: Mutex<BalanceDto>,
    utxo_pages: Mutex<Vec<Vec<UtxoDto>>>,
    fee_rates: Mutex<FeeRatesDto>,
    tx_count: AtomicU64,
    gas_estimate: AtomicU64,
    /// Block heights returned per details call; the last entry repeats.
    block_heights: Mutex<VecDeque<Option<u64>>>,
    /// Failures popped (per method) before the canned response is served.
    failures: Mutex<HashMap<&'static str, VecDeque<GatewayError>>>,
    pub last_broadcast: Mutex<Option<Vec<u8>>>,

    pub balance_calls: AtomicUsize,
    pub utxo_calls: AtomicUsize,
    pub fee_calls: AtomicUsize,
    pub tx_count_calls: AtomicUsize,
    pub gas_calls: AtomicUsize,
    pub broadcast_calls: AtomicUsize,
    pub details_calls: AtomicUsize,
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self {
            balance: Mutex::new(BalanceDto {
                confirmed: "0".into(),
                unconfirmed: "0".into(),
            }),
            utxo_pages: Mutex::new(vec![Vec::new()]),
            fee_rates: Mutex::new(utxo_fee_rates(["0.00000001"; 4])),
            tx_count: AtomicU64::new(0),
            gas_estimate: AtomicU64::new(21_000),
            block_heights: Mutex::new(VecDeque::from([Some(1)])),
            failures: Mutex::new(HashMap::new()),
            last_broadcast: Mutex::new(None),
            balance_calls: AtomicUsize::new(0),
            utxo_calls: AtomicUsize::new(0),
            fee_calls: AtomicUsize::new(0),
            tx_count_calls: AtomicUsize::new(0),
            gas_calls: AtomicUsize::new(0),
            broadcast_calls: AtomicUsize::new(0),
            details_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_balance(&self, confirmed: &str, unconfirmed: &str) {
        *self.balance.lock().unwrap() = BalanceDto {
            confirmed: confirmed.into(),
            unconfirmed: unconfirmed.into(),
        };
    }

    pub fn set_utxo_pages(&self, pages: Vec<Vec<UtxoDto>>) {
        *self.utxo_pages.lock().unwrap() = pages;
    }

    pub fn set_fee_rates(&self, rates: FeeRatesDto) {
        *self.fee_rates.lock().unwrap() = rates;
    }

    pub fn set_tx_count(&self, count: u64) {
        self.tx_count.store(count, Ordering::SeqCst);
    }

    pub fn set_gas_estimate(&self, gas: u64) {
        self.gas_estimate.store(gas, Ordering::SeqCst);
    }

    pub fn script_block_heights(&self, heights: Vec<Option<u64>>) {
        *self.block_heights.lock().unwrap() = heights.into();
    }

    /// Queue a failure for one method; each call pops one failure before
    /// the canned response is served again.
    pub fn queue_failure(&self, method: &'static str, error: GatewayError) {
        self.failures
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back(error);
    }

    fn pop_failure(&self, method: &'static str) -> Option<GatewayError> {
        self.failures
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front)
    }
}

#[async_trait]
impl ChainGateway for ScriptedGateway {
    async fn balance(&self, _: &str, _: &str) -> Result<BalanceDto, GatewayError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.pop_failure("balance") {
            return Err(failure);
        }
        Ok(self.balance.lock().unwrap().clone())
    }

    async fn utxos(&self, _: &str, _: &str, page: u32) -> Result<UtxoPageDto, GatewayError> {
        self.utxo_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.pop_failure("utxos") {
            return Err(failure);
        }
        let pages = self.utxo_pages.lock().unwrap();
        Ok(UtxoPageDto {
            utxos: pages[page as usize].clone(),
            page,
            last_page: (pages.len() - 1) as u32,
        })
    }

    async fn fee_rates(&self, _: &str) -> Result<FeeRatesDto, GatewayError> {
        self.fee_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.pop_failure("fee_rates") {
            return Err(failure);
        }
        Ok(self.fee_rates.lock().unwrap().clone())
    }

    async fn transaction_count(&self, _: &str, _: &str) -> Result<u64, GatewayError> {
        self.tx_count_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.pop_failure("transaction_count") {
            return Err(failure);
        }
        Ok(self.tx_count.load(Ordering::SeqCst))
    }

    async fn estimate_gas(&self, _: &str, _: &GasEstimateRequest) -> Result<u64, GatewayError> {
        self.gas_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.pop_failure("estimate_gas") {
            return Err(failure);
        }
        Ok(self.gas_estimate.load(Ordering::SeqCst))
    }

    async fn broadcast(&self, _: &str, raw: &[u8]) -> Result<BroadcastDto, GatewayError> {
        self.broadcast_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.pop_failure("broadcast") {
            return Err(failure);
        }
        *self.last_broadcast.lock().unwrap() = Some(raw.to_vec());
        Ok(BroadcastDto {
            tx_id: "scripted-tx-id".into(),
        })
    }

    async fn transaction_details(
        &self,
        _: &str,
        _: &str,
    ) -> Result<TransactionDetailsDto, GatewayError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.pop_failure("transaction_details") {
            return Err(failure);
        }
        let mut heights = self.block_heights.lock().unwrap();
        let height = if heights.len() > 1 {
            heights.pop_front().unwrap_or(None)
        } else {
            heights.front().copied().flatten()
        };
        Ok(TransactionDetailsDto {
            block_height: height,
        })
    }

    async fn call_contract(
        &self,
        _: &str,
        _: &str,
        data: &[u8],
    ) -> Result<ContractCallDto, GatewayError> {
        Ok(ContractCallDto {
            result: format!("0x{}", hex::encode(data)),
        })
    }
}

/// UTXO-chain fee-rate table: `[low, normal, high, maximum]` per byte.
pub fn utxo_fee_rates(per_byte: [&str; 4]) -> FeeRatesDto {
    let rate = |value: &str| FeeRateDto {
        fee_per_byte: Some(value.into()),
        ..FeeRateDto::default()
    };
    FeeRatesDto {
        low: rate(per_byte[0]),
        normal: rate(per_byte[1]),
        high: rate(per_byte[2]),
        maximum: rate(per_byte[3]),
    }
}

/// Fee-market fee-rate table: `[(max_fee, max_priority); 4]` per gas.
pub fn market_fee_rates(per_gas: [(&str, &str); 4]) -> FeeRatesDto {
    let rate = |(max, priority): (&str, &str)| FeeRateDto {
        max_fee_per_gas: Some(max.into()),
        max_priority_fee_per_gas: Some(priority.into()),
        ..FeeRateDto::default()
    };
    FeeRatesDto {
        low: rate(per_gas[0]),
        normal: rate(per_gas[1]),
        high: rate(per_gas[2]),
        maximum: rate(per_gas[3]),
    }
}

/// A UTXO DTO with a standard P2WPKH-looking script.
pub fn utxo(txid: &str, amount: &str) -> UtxoDto {
    UtxoDto {
        txid: txid.into(),
        n: 0,
        amount: amount.into(),
        script: "0014ab".into(),
    }
}

/// Signer stub recording the spec it was handed.
#[derive(Default)]
pub struct RecordingUtxoSigner {
    pub last_spec: Mutex<Option<UtxoTransferSpec>>,
}

impl UtxoSigner for RecordingUtxoSigner {
    fn build_and_sign(
        &self,
        spec: &UtxoTransferSpec,
        _signing_key: &[u8],
    ) -> Result<Vec<u8>, SignError> {
        *self.last_spec.lock().unwrap() = Some(spec.clone());
        Ok(b"signed-utxo-tx".to_vec())
    }
}

/// Signer stub recording the spec it was handed.
#[derive(Default)]
pub struct RecordingAccountSigner {
    pub last_spec: Mutex<Option<AccountTransferSpec>>,
}

impl AccountSigner for RecordingAccountSigner {
    fn build_and_sign(
        &self,
        spec: &AccountTransferSpec,
        _signing_key: &[u8],
    ) -> Result<Vec<u8>, SignError> {
        *self.last_spec.lock().unwrap() = Some(spec.clone());
        Ok(b"signed-account-tx".to_vec())
    }
}

/// Everything a wallet needs, wired to the scripted gateway.
pub struct TestHarness {
    pub gateway: Arc<ScriptedGateway>,
    pub utxo_signer: Arc<RecordingUtxoSigner>,
    pub account_signer: Arc<RecordingAccountSigner>,
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            gateway: Arc::new(ScriptedGateway::new()),
            utxo_signer: Arc::new(RecordingUtxoSigner::default()),
            account_signer: Arc::new(RecordingAccountSigner::default()),
        }
    }

    /// A wallet context over this harness with the given configuration.
    pub fn context_with(&self, config: WalletConfig) -> WalletContext {
        WalletContext {
            gateway: self.gateway.clone(),
            utxo_signer: self.utxo_signer.clone(),
            account_signer: self.account_signer.clone(),
            config,
        }
    }

    /// A wallet context over this harness with default configuration.
    pub fn context(&self) -> WalletContext {
        self.context_with(WalletConfig::default())
    }
}
