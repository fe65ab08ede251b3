//! Scripted gateway and signer stubs shared by the crate's tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;

use keel_core::error::SignError;
use keel_core::traits::{AccountSigner, UtxoSigner};
use keel_core::types::{AccountTransferSpec, UtxoTransferSpec};
use keel_gateway::error::GatewayError;
use keel_gateway::gateway::{
    BalanceDto, BroadcastDto, ChainGateway, ContractCallDto, FeeRateDto, FeeRatesDto,
    GasEstimateRequest, TransactionDetailsDto, UtxoDto, UtxoPageDto,
};

/// A scripted gateway with per-method call counters.
pub(crate) struct MockGateway {
    balance: Mutex<BalanceDto>,
    utxo_pages: Mutex<Vec<Vec<UtxoDto>>>,
    fee_rates: Mutex<FeeRatesDto>,
    tx_count: AtomicU64,
    gas_estimate: AtomicU64,
    /// Block heights returned per details call; the last entry repeats.
    block_heights: Mutex<VecDeque<Option<u64>>>,
    details_failure: Mutex<Option<GatewayError>>,
    pub(crate) last_broadcast: Mutex<Option<Vec<u8>>>,

    pub(crate) balance_calls: AtomicUsize,
    pub(crate) utxo_calls: AtomicUsize,
    pub(crate) fee_calls: AtomicUsize,
    pub(crate) tx_count_calls: AtomicUsize,
    pub(crate) gas_calls: AtomicUsize,
    pub(crate) broadcast_calls: AtomicUsize,
    pub(crate) details_calls: AtomicUsize,
}

impl MockGateway {
    pub(crate) fn new() -> Self {
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
            details_failure: Mutex::new(None),
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

    pub(crate) fn set_balance(&self, confirmed: &str, unconfirmed: &str) {
        *self.balance.lock().unwrap() = BalanceDto {
            confirmed: confirmed.into(),
            unconfirmed: unconfirmed.into(),
        };
    }

    pub(crate) fn set_utxo_pages(&self, pages: Vec<Vec<UtxoDto>>) {
        *self.utxo_pages.lock().unwrap() = pages;
    }

    pub(crate) fn set_fee_rates(&self, rates: FeeRatesDto) {
        *self.fee_rates.lock().unwrap() = rates;
    }

    pub(crate) fn set_tx_count(&self, count: u64) {
        self.tx_count.store(count, Ordering::SeqCst);
    }

    pub(crate) fn set_gas_estimate(&self, gas: u64) {
        self.gas_estimate.store(gas, Ordering::SeqCst);
    }

    pub(crate) fn script_block_heights(&self, heights: Vec<Option<u64>>) {
        *self.block_heights.lock().unwrap() = heights.into();
    }

    pub(crate) fn fail_details_with_status(&self, status: u16) {
        *self.details_failure.lock().unwrap() = Some(GatewayError::Http {
            status,
            retry_after: None,
        });
    }
}

#[async_trait]
impl ChainGateway for MockGateway {
    async fn balance(&self, _: &str, _: &str) -> Result<BalanceDto, GatewayError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance.lock().unwrap().clone())
    }

    async fn utxos(&self, _: &str, _: &str, page: u32) -> Result<UtxoPageDto, GatewayError> {
        self.utxo_calls.fetch_add(1, Ordering::SeqCst);
        let pages = self.utxo_pages.lock().unwrap();
        Ok(UtxoPageDto {
            utxos: pages[page as usize].clone(),
            page,
            last_page: (pages.len() - 1) as u32,
        })
    }

    async fn fee_rates(&self, _: &str) -> Result<FeeRatesDto, GatewayError> {
        self.fee_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.fee_rates.lock().unwrap().clone())
    }

    async fn transaction_count(&self, _: &str, _: &str) -> Result<u64, GatewayError> {
        self.tx_count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tx_count.load(Ordering::SeqCst))
    }

    async fn estimate_gas(&self, _: &str, _: &GasEstimateRequest) -> Result<u64, GatewayError> {
        self.gas_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.gas_estimate.load(Ordering::SeqCst))
    }

    async fn broadcast(&self, _: &str, raw: &[u8]) -> Result<BroadcastDto, GatewayError> {
        self.broadcast_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_broadcast.lock().unwrap() = Some(raw.to_vec());
        Ok(BroadcastDto {
            tx_id: "mock-tx-id".into(),
        })
    }

    async fn transaction_details(
        &self,
        _: &str,
        _: &str,
    ) -> Result<TransactionDetailsDto, GatewayError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(failure) = self.details_failure.lock().unwrap().clone() {
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
        // Echo the call data back so tests can assert plumbing.
        Ok(ContractCallDto {
            result: format!("0x{}", hex::encode(data)),
        })
    }
}

/// UTXO-chain fee-rate table: `[low, normal, high, maximum]` per byte.
pub(crate) fn utxo_fee_rates(per_byte: [&str; 4]) -> FeeRatesDto {
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
pub(crate) fn market_fee_rates(per_gas: [(&str, &str); 4]) -> FeeRatesDto {
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

/// Signer stub that records the spec and returns canned bytes.
pub(crate) struct StubUtxoSigner {
    pub(crate) last_spec: Mutex<Option<UtxoTransferSpec>>,
}

impl StubUtxoSigner {
    pub(crate) fn new() -> Self {
        Self {
            last_spec: Mutex::new(None),
        }
    }
}

impl UtxoSigner for StubUtxoSigner {
    fn build_and_sign(
        &self,
        spec: &UtxoTransferSpec,
        _signing_key: &[u8],
    ) -> Result<Vec<u8>, SignError> {
        *self.last_spec.lock().unwrap() = Some(spec.clone());
        Ok(b"signed-utxo-tx".to_vec())
    }
}

/// Signer stub that records the spec and returns canned bytes.
pub(crate) struct StubAccountSigner {
    pub(crate) last_spec: Mutex<Option<AccountTransferSpec>>,
}

impl StubAccountSigner {
    pub(crate) fn new() -> Self {
        Self {
            last_spec: Mutex::new(None),
        }
    }
}

impl AccountSigner for StubAccountSigner {
    fn build_and_sign(
        &self,
        spec: &AccountTransferSpec,
        _signing_key: &[u8],
    ) -> Result<Vec<u8>, SignError> {
        *self.last_spec.lock().unwrap() = Some(spec.clone());
        Ok(b"signed-account-tx".to_vec())
    }
}
