//! UTXOs and the transfer specs handed to signing collaborators.

use rust_decimal::Decimal;

/// An unspent transaction output selected as a transfer input.
///
/// Immutable once selected; the selected set is the exclusive input set
/// of one prepared transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utxo {
    /// Transaction id that created this output.
    pub txid: String,
    /// Output index within that transaction.
    pub vout: u32,
    /// Output value in base units.
    pub amount: Decimal,
    /// Locking script bytes.
    pub script: Vec<u8>,
}

/// A transfer input in the form signers consume: minimal-unit value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoInput {
    pub txid: String,
    pub vout: u32,
    /// Value in minimal units (satoshis).
    pub value: u64,
    pub script: Vec<u8>,
}

/// Fee instruction for a UTXO-chain signer, in minimal units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtxoFee {
    /// Satoshis per virtual byte.
    PerVbyte(u64),
    /// Fixed total in satoshis.
    Total(u64),
}

/// Everything a UTXO-chain signer needs to assemble and sign a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtxoTransferSpec {
    pub from_address: String,
    pub to_address: String,
    /// Where the remainder above amount + fee goes; the sender address.
    pub change_address: String,
    /// Transfer amount in minimal units.
    pub amount: u64,
    pub inputs: Vec<UtxoInput>,
    pub fee: UtxoFee,
}

/// Everything an account-chain signer needs to assemble and sign a
/// transaction. Rates and value are in minimal units (wei).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTransferSpec {
    pub from_address: String,
    pub to_address: String,
    pub value: u128,
    pub nonce: u64,
    pub gas_limit: u64,
    pub max_fee_per_unit: u128,
    pub max_priority_fee_per_unit: u128,
    pub chain_id: u64,
    /// Contract call data; empty for a plain value transfer.
    pub data: Vec<u8>,
}
