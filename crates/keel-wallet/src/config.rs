//! Wallet configuration.

use std::time::Duration;

use keel_gateway::invoker::{DEFAULT_MAX_RETRY_AFTER, DEFAULT_WARN_INTERVAL, Invoker};

/// Tunable behavior of a wallet instance.
///
/// Defaults match production policy; tests and development environments
/// override individual fields.
#[derive(Debug, Clone)]
pub struct WalletConfig {
    /// Ceiling on a server-indicated retry-after; beyond it a rate-limit
    /// response is treated as fatal capacity exhaustion.
    pub max_retry_after: Duration,

    /// Minimum interval between capacity-exhausted log warnings.
    pub rate_limit_warn_interval: Duration,

    /// Interval between confirmation polls in
    /// [`ConfirmedTransaction::wait_until_confirmed`](crate::currency::ConfirmedTransaction::wait_until_confirmed).
    pub confirmation_poll_interval: Duration,

    /// Acknowledge that using the wallet without encrypting its key
    /// material is intentional, silencing the development-only warning
    /// on plaintext key access. Has no effect on behavior otherwise.
    pub acknowledge_unencrypted: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            max_retry_after: DEFAULT_MAX_RETRY_AFTER,
            rate_limit_warn_interval: DEFAULT_WARN_INTERVAL,
            confirmation_poll_interval: Duration::from_secs(10),
            acknowledge_unencrypted: false,
        }
    }
}

impl WalletConfig {
    /// Build the call wrapper configured by this instance.
    pub(crate) fn invoker(&self) -> Invoker {
        Invoker::new(self.max_retry_after, self.rate_limit_warn_interval)
    }
}
