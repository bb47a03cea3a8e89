//! Shared HTTP client configuration for provider API calls.

use std::time::Duration;

use reqwest::{Client, Response};
use vouch_core::entities::ProviderKind;
use vouch_core::Error;

/// Default timeout for HTTP requests (30 seconds)
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default connect timeout (10 seconds)
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size for paginated listings; a shorter page is the last one
pub(crate) const PER_PAGE: usize = 100;

pub const USER_AGENT: &str = concat!("vouch-cli/", env!("CARGO_PKG_VERSION"));

/// Build a configured HTTP client for hosting provider APIs.
///
/// This client is configured with:
/// - vouch-cli user agent (GitHub rejects requests without one)
/// - Request and connect timeouts
pub fn build_api_client(timeout: Duration) -> Result<Client, Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
        .build()
        .map_err(|e| Error::Network(format!("failed to create API HTTP client: {}", e)))
}

/// Map a transport failure
pub(crate) fn transport_error(e: reqwest::Error) -> Error {
    Error::Network(e.to_string())
}

/// Pass a response through when its status is `expected`, otherwise turn
/// it into a provider error carrying status and body.
pub(crate) async fn expect_status(
    provider: ProviderKind,
    response: Response,
    expected: reqwest::StatusCode,
    action: &str,
) -> Result<Response, Error> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let body = body.trim();
    let message = if body.is_empty() {
        format!("{} failed (status: {})", action, status)
    } else {
        format!("{} failed (status: {}): {}", action, status, body)
    };
    Err(Error::Provider { provider, message })
}

pub(crate) async fn decode_json<T: serde::de::DeserializeOwned>(
    provider: ProviderKind,
    response: Response,
) -> Result<T, Error> {
    response.json().await.map_err(|e| Error::Provider {
        provider,
        message: format!("failed to decode response: {}", e),
    })
}
