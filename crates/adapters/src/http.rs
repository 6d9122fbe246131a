//! Shared HTTP plumbing for upstream clients

use devstats_domain::{FetchError, Platform};
use reqwest::{Client, Response, StatusCode};
use std::time::Duration;
use time::UtcOffset;

/// Browser-like user agent; the scraped sites reject obvious bots
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Settings shared by every upstream client
#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    /// Per-request timeout
    pub timeout: Duration,
    pub user_agent: String,
    /// Offset used to bucket timestamps into months
    pub utc_offset: UtcOffset,
}

impl Default for UpstreamSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            utc_offset: UtcOffset::UTC,
        }
    }
}

/// Build a reqwest client honoring the shared settings
pub fn build_client(settings: &UpstreamSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(&settings.user_agent)
        .timeout(settings.timeout)
        .build()
}

/// Map a transport-level reqwest failure
pub(crate) fn transport_error(platform: Platform, e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Upstream(format!("{} request timed out", platform.display_name()))
    } else {
        FetchError::Upstream(format!("{} request failed: {}", platform.display_name(), e))
    }
}

/// Turn non-success statuses into typed fetch errors
pub(crate) async fn check_status(
    platform: Platform,
    handle: &str,
    response: Response,
) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    tracing::debug!(platform = %platform, handle = %handle, status = %status, "Upstream returned error status");

    match status {
        StatusCode::NOT_FOUND => Err(FetchError::NotFound(format!(
            "{} user '{}' not found",
            platform.display_name(),
            handle
        ))),
        StatusCode::TOO_MANY_REQUESTS => Err(FetchError::RateLimited(format!(
            "{} rate limit exceeded, try again later",
            platform.display_name()
        ))),
        StatusCode::FORBIDDEN => Err(FetchError::Upstream(format!(
            "{} denied access",
            platform.display_name()
        ))),
        _ => {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            Err(FetchError::Upstream(format!(
                "{} returned {}: {}",
                platform.display_name(),
                status,
                snippet
            )))
        }
    }
}

/// Read a JSON body, mapping decode failures to upstream errors
pub(crate) async fn read_json(
    platform: Platform,
    response: Response,
) -> Result<serde_json::Value, FetchError> {
    response.json().await.map_err(|e| {
        FetchError::Upstream(format!(
            "{} returned an unreadable response: {}",
            platform.display_name(),
            e
        ))
    })
}

/// Read a text body
pub(crate) async fn read_text(platform: Platform, response: Response) -> Result<String, FetchError> {
    response
        .text()
        .await
        .map_err(|e| transport_error(platform, e))
}
