//! Rate-limit and failure-policy scenarios across the whole stack.
//!
//! The retry policy lives in the gateway invoker, but these tests drive
//! it through real wallet operations to pin the end-to-end behavior:
//! which calls are retried, which fail fast, and what never hits the
//! network at all.

use std::sync::atomic::Ordering;
use std::time::Duration;

use keel_core::amount::Amount;
use keel_gateway::error::{ApiError, GatewayError};
use keel_tests::helpers::*;
use keel_wallet::{Currency, Wallet, WalletError};

fn eth_amount(wallet: &Wallet, text: &str) -> Amount {
    Amount::parse(wallet.currencies().ethereum.info().clone(), text).unwrap()
}

#[tokio::test]
async fn overdrawn_transfer_never_asks_for_fee_rates() {
    init_tracing();
    let harness = TestHarness::new();
    harness.gateway.set_balance("0.25", "0");

    let wallet = Wallet::from_phrase(harness.context(), REFERENCE_PHRASE).unwrap();
    let amount = eth_amount(&wallet, "1");

    let err = wallet
        .currencies()
        .ethereum
        .prepare(REFERENCE_ETHEREUM_ADDRESS, amount)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        WalletError::NotEnoughFunds {
            currency: "ETH".into(),
            missing: Amount::parse(
                wallet.currencies().ethereum.info().clone(),
                "0.75"
            )
            .unwrap()
            .base_units(),
        }
    );
    assert_eq!(harness.gateway.balance_calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        harness.gateway.fee_calls.load(Ordering::SeqCst),
        0,
        "the fee-rate endpoint must not be contacted"
    );
}

#[tokio::test(start_paused = true)]
async fn retryable_rate_limit_sleeps_then_replays_the_call() {
    let harness = TestHarness::new();
    harness.gateway.set_balance("5", "0");
    harness.gateway.queue_failure("balance", rate_limited(5));

    let wallet = Wallet::from_phrase(harness.context(), REFERENCE_PHRASE).unwrap();

    let start = tokio::time::Instant::now();
    let pair = wallet
        .currencies()
        .ethereum
        .balance(None)
        .await
        .unwrap();

    assert_eq!(start.elapsed(), Duration::from_secs(5), "exactly one 5 s sleep");
    assert_eq!(
        harness.gateway.balance_calls.load(Ordering::SeqCst),
        2,
        "the identical call is replayed once"
    );
    assert_eq!(pair.confirmed.base_units().to_string(), "5");
}

#[tokio::test(start_paused = true)]
async fn over_ceiling_rate_limit_is_fatal_without_sleeping() {
    let harness = TestHarness::new();
    harness.gateway.queue_failure("balance", rate_limited(121));

    let wallet = Wallet::from_phrase(harness.context(), REFERENCE_PHRASE).unwrap();

    let start = tokio::time::Instant::now();
    let err = wallet
        .currencies()
        .ethereum
        .balance(None)
        .await
        .unwrap_err();

    assert_eq!(err, WalletError::Api(ApiError::ExhaustedApiKey));
    assert_eq!(start.elapsed(), Duration::ZERO, "no backoff sleep");
    assert_eq!(harness.gateway.balance_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unauthorized_is_fatal_everywhere() {
    let harness = TestHarness::new();
    harness.gateway.queue_failure("balance", http(401));

    let wallet = Wallet::from_phrase(harness.context(), REFERENCE_PHRASE).unwrap();
    let err = wallet
        .currencies()
        .bitcoin
        .balance(None)
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::Api(ApiError::InvalidApiKey));
    assert_eq!(harness.gateway.balance_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn other_gateway_failures_propagate_unchanged() {
    let harness = TestHarness::new();
    harness.gateway.queue_failure("balance", http(503));

    let wallet = Wallet::from_phrase(harness.context(), REFERENCE_PHRASE).unwrap();
    let err = wallet
        .currencies()
        .ethereum
        .balance(None)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        WalletError::Api(ApiError::Gateway(GatewayError::Http {
            status: 503,
            retry_after: None,
        }))
    );
}

#[tokio::test(start_paused = true)]
async fn custom_retry_ceiling_is_honored() {
    let mut config = keel_wallet::WalletConfig::default();
    config.max_retry_after = Duration::from_secs(3);

    let harness = TestHarness::new();
    harness.gateway.set_balance("5", "0");
    harness.gateway.queue_failure("balance", rate_limited(4));

    let wallet = Wallet::from_phrase(harness.context_with(config), REFERENCE_PHRASE).unwrap();
    let err = wallet
        .currencies()
        .ethereum
        .balance(None)
        .await
        .unwrap_err();
    assert_eq!(err, WalletError::Api(ApiError::ExhaustedApiKey));
}

#[tokio::test(start_paused = true)]
async fn repeated_rate_limits_keep_retrying_within_ceiling() {
    let harness = TestHarness::new();
    harness.gateway.set_balance("5", "0");
    harness.gateway.queue_failure("balance", rate_limited(2));
    harness.gateway.queue_failure("balance", rate_limited(3));
    harness.gateway.queue_failure("balance", rate_limited(4));

    let wallet = Wallet::from_phrase(harness.context(), REFERENCE_PHRASE).unwrap();

    let start = tokio::time::Instant::now();
    let pair = wallet
        .currencies()
        .ethereum
        .balance(None)
        .await
        .unwrap();

    assert_eq!(pair.confirmed.base_units().to_string(), "5");
    assert_eq!(start.elapsed(), Duration::from_secs(9));
    assert_eq!(harness.gateway.balance_calls.load(Ordering::SeqCst), 4);
}
