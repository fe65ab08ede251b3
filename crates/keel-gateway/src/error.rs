//! Gateway error taxonomy.

use std::time::Duration;
use thiserror::Error;

/// A failure reported by the gateway transport, before classification.
///
/// Implementations of [`ChainGateway`](crate::gateway::ChainGateway)
/// surface HTTP-level failures as [`GatewayError::Http`] so the invoker
/// can apply the auth/rate-limit policy; everything else passes through
/// untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The service answered with a non-success status code.
    #[error("gateway returned HTTP status {status}")]
    Http {
        status: u16,
        /// Server-indicated wait before retrying, if provided (429).
        retry_after: Option<Duration>,
    },

    /// The request never produced a response.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The response arrived but could not be decoded.
    #[error("malformed gateway response: {0}")]
    Decode(String),
}

/// A classified failure as seen by callers of the invoker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication rejected (HTTP 401). Fatal, never retried.
    #[error("the provided API key is invalid")]
    InvalidApiKey,

    /// The key's capacity is exhausted beyond the retry ceiling. Fatal.
    #[error("API key request capacity exhausted; upgrade to a higher tier")]
    ExhaustedApiKey,

    /// Any other gateway failure, propagated unchanged.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_http_status() {
        let e = GatewayError::Http {
            status: 503,
            retry_after: None,
        };
        assert_eq!(e.to_string(), "gateway returned HTTP status 503");
    }

    #[test]
    fn gateway_error_converts_to_api_error() {
        let raw = GatewayError::Transport("connection reset".into());
        let api: ApiError = raw.clone().into();
        assert_eq!(api, ApiError::Gateway(raw));
    }

    #[test]
    fn clone_and_eq() {
        let e = ApiError::InvalidApiKey;
        assert_eq!(e.clone(), e);
    }
}
