//! Port definitions (traits) for external dependencies
//!
//! These traits define the boundaries between the domain and external systems.
//! Adapters implement these traits to connect to real infrastructure.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{FailureReason, FetchFailure, Platform, PlatformIdentity, PlatformStats};
use crate::normalize::{NormalizedHandle, normalize};

/// Error type for upstream fetch operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),
    #[error("User not found: {0}")]
    NotFound(String),
    #[error("Rate limited: {0}")]
    RateLimited(String),
    #[error("Upstream error: {0}")]
    Upstream(String),
}

impl FetchError {
    pub fn reason(&self) -> FailureReason {
        match self {
            FetchError::InvalidHandle(_) => FailureReason::InvalidHandle,
            FetchError::NotFound(_) => FailureReason::NotFound,
            FetchError::RateLimited(_) => FailureReason::RateLimited,
            FetchError::Upstream(_) => FailureReason::UpstreamError,
        }
    }

    /// Convert into the serializable failure record for `platform`
    pub fn into_failure(self, platform: Platform) -> FetchFailure {
        FetchFailure {
            platform,
            reason: self.reason(),
            message: self.to_string(),
        }
    }
}

/// Raw upstream payload handed from `fetch_raw` to `extract`
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// JSON document (clients making several calls combine them into one object)
    Json(serde_json::Value),
    /// HTML page body
    Html(String),
}

/// Port for one upstream platform: normalize, fetch, extract
#[async_trait]
pub trait PlatformClient: Send + Sync {
    /// Platform served by this client
    fn platform(&self) -> Platform;

    /// Clean a user-supplied handle
    fn normalize(&self, raw: &str) -> NormalizedHandle {
        normalize(self.platform(), raw)
    }

    /// Fetch the raw upstream response for a normalized handle
    async fn fetch_raw(&self, handle: &NormalizedHandle) -> Result<RawResponse, FetchError>;

    /// Parse a raw response into unified stats.
    ///
    /// Missing or malformed fields degrade to zero values instead of failing.
    fn extract(&self, handle: &NormalizedHandle, raw: RawResponse) -> PlatformStats;

    /// Fetch and extract in one step
    async fn fetch_stats(&self, handle: &NormalizedHandle) -> Result<PlatformStats, FetchError> {
        if handle.is_empty() {
            return Err(FetchError::InvalidHandle(format!(
                "empty {} handle",
                self.platform()
            )));
        }
        let raw = self.fetch_raw(handle).await?;
        Ok(self.extract(handle, raw))
    }
}

/// Error type for handle store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Port for persisting each user's configured platform handles
#[async_trait]
pub trait HandleStore: Send + Sync {
    /// All identities configured for a user (empty if unknown)
    async fn get_handles(&self, user_id: &str) -> Result<Vec<PlatformIdentity>, StoreError>;

    /// Insert or replace the handle for one platform
    async fn set_handle(&self, user_id: &str, identity: &PlatformIdentity)
    -> Result<(), StoreError>;

    /// Remove a platform handle, returning whether one existed
    async fn remove_handle(&self, user_id: &str, platform: Platform) -> Result<bool, StoreError>;
}
