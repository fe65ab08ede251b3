//! The chain-data collaborator contract.
//!
//! One object serves every supported currency; the currency id routes the
//! call. The engine mandates no wire format — implementations may speak
//! REST, JSON-RPC, or anything else — only these shapes and the error
//! taxonomy of [`GatewayError`](crate::error::GatewayError).
//!
//! All monetary fields are decimal strings in **base units** (whole
//! coins), preserving precision across the boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GatewayError;

/// Confirmed/unconfirmed balance of an address, base-unit decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDto {
    pub confirmed: String,
    pub unconfirmed: String,
}

/// One unspent output as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoDto {
    /// Creating transaction id.
    pub txid: String,
    /// Output index.
    pub n: u32,
    /// Value in base units.
    pub amount: String,
    /// Locking script, hex-encoded.
    pub script: String,
}

/// One page of an address's UTXO set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UtxoPageDto {
    pub utxos: Vec<UtxoDto>,
    /// The page this response covers.
    pub page: u32,
    /// Index of the final page for this address.
    pub last_page: u32,
}

/// One fee grade's rates. Which fields are present depends on the chain
/// family: UTXO chains fill `fee_per_byte`, fee-market chains fill the
/// gas-rate pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeRateDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_per_byte: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
}

/// Current network fee rates by grade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeRatesDto {
    pub low: FeeRateDto,
    pub normal: FeeRateDto,
    pub high: FeeRateDto,
    pub maximum: FeeRateDto,
}

/// Parameters for a gas estimate on an account-model chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasEstimateRequest {
    pub from: String,
    pub to: String,
    pub nonce: u64,
    /// Transfer value, base-unit decimal string.
    pub value: String,
    /// Call data, `0x`-prefixed hex; `0x` for a plain transfer.
    pub data: String,
}

/// Result of submitting a raw transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BroadcastDto {
    pub tx_id: String,
}

/// On-chain details of a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDetailsDto {
    /// Height of the including block; `None` while unconfirmed.
    pub block_height: Option<u64>,
}

/// Result of a read-only contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCallDto {
    /// Returned data, `0x`-prefixed hex.
    pub result: String,
}

/// External chain-data and broadcast service.
///
/// Every method may fail with the auth/rate-limit signals classified by
/// [`Invoker`](crate::invoker::Invoker); engine code never calls a
/// gateway method without going through the invoker.
#[async_trait]
pub trait ChainGateway: Send + Sync {
    /// Confirmed and unconfirmed balance of `address`.
    async fn balance(&self, currency: &str, address: &str) -> Result<BalanceDto, GatewayError>;

    /// One page of the address's UTXO set, ascending page index from 0.
    async fn utxos(
        &self,
        currency: &str,
        address: &str,
        page: u32,
    ) -> Result<UtxoPageDto, GatewayError>;

    /// Current fee rates by grade.
    async fn fee_rates(&self, currency: &str) -> Result<FeeRatesDto, GatewayError>;

    /// Number of transactions sent from `address` (account-model nonce).
    async fn transaction_count(&self, currency: &str, address: &str)
    -> Result<u64, GatewayError>;

    /// Gas required for the described transaction (account model).
    async fn estimate_gas(
        &self,
        currency: &str,
        request: &GasEstimateRequest,
    ) -> Result<u64, GatewayError>;

    /// Submit a signed raw transaction.
    ///
    /// The invoker retries this like any read when the service reports a
    /// retryable rate limit; the service's retry-after contract is
    /// assumed to prevent duplicate acceptance. No idempotency token is
    /// added at this layer — a 429 after partial acceptance could
    /// double-submit. Known, unresolved.
    async fn broadcast(
        &self,
        currency: &str,
        raw_transaction: &[u8],
    ) -> Result<BroadcastDto, GatewayError>;

    /// Details of a transaction by id.
    async fn transaction_details(
        &self,
        currency: &str,
        tx_id: &str,
    ) -> Result<TransactionDetailsDto, GatewayError>;

    /// Execute a read-only contract call.
    async fn call_contract(
        &self,
        currency: &str,
        contract: &str,
        data: &[u8],
    ) -> Result<ContractCallDto, GatewayError>;
}
