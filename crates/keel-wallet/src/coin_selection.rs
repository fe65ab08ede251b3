//! Greedy paged UTXO selection.
//!
//! Walks the address's UTXO pages in ascending order, appending every
//! output in the order the gateway supplies it, and stops as soon as the
//! running total reaches the target — the selection is the first prefix
//! whose sum covers the amount. This favors few gateway round-trips over
//! minimal input count or minimal change; it never reorders by value and
//! makes no attempt at fee or dust optimization.

use std::str::FromStr;

use rust_decimal::Decimal;

use keel_core::amount::Amount;
use keel_core::currency::CurrencyInfo;
use keel_core::types::Utxo;
use keel_gateway::gateway::ChainGateway;
use keel_gateway::invoker::Invoker;

use crate::error::WalletError;

/// Select UTXOs covering `target`, or fail with
/// [`WalletError::NotEnoughFunds`] carrying the exact shortfall once
/// every page is exhausted.
pub async fn select_utxos(
    gateway: &dyn ChainGateway,
    invoker: &Invoker,
    currency: &CurrencyInfo,
    address: &str,
    target: &Amount,
) -> Result<Vec<Utxo>, WalletError> {
    let target_base = target.base_units();
    let mut picked: Vec<Utxo> = Vec::new();
    let mut total = Decimal::ZERO;

    let mut page = 0u32;
    loop {
        let response = invoker
            .invoke(|| gateway.utxos(&currency.id, address, page))
            .await?;

        for utxo in &response.utxos {
            let amount = Decimal::from_str(&utxo.amount).map_err(|_| {
                WalletError::MalformedResponse(format!("UTXO amount {:?}", utxo.amount))
            })?;
            let script = hex::decode(&utxo.script).map_err(|_| {
                WalletError::MalformedResponse(format!("UTXO script {:?}", utxo.script))
            })?;

            picked.push(Utxo {
                txid: utxo.txid.clone(),
                vout: utxo.n,
                amount,
                script,
            });
            total += amount;

            if total >= target_base {
                return Ok(picked);
            }
        }

        if response.page == response.last_page {
            break;
        }
        page += 1;
    }

    Err(WalletError::NotEnoughFunds {
        currency: currency.symbol.clone(),
        missing: target_base - total,
    })
}
