//! Mapping of domain failures to HTTP responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use devstats_domain::{FetchError, StoreError};
use serde::Serialize;

/// Error returned by API handlers
#[derive(Debug)]
pub enum ApiError {
    Fetch(FetchError),
    Store(StoreError),
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        ApiError::Fetch(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, ErrorBody) {
        match self {
            ApiError::Fetch(FetchError::InvalidHandle(msg)) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "Invalid username format",
                    details: Some(msg.clone()),
                },
            ),
            ApiError::Fetch(FetchError::NotFound(_)) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    error: "User not found",
                    details: None,
                },
            ),
            ApiError::Fetch(FetchError::RateLimited(_)) => (
                StatusCode::TOO_MANY_REQUESTS,
                ErrorBody {
                    error: "Rate limit exceeded",
                    details: None,
                },
            ),
            ApiError::Fetch(FetchError::Upstream(msg)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Failed to fetch stats",
                    details: Some(msg.clone()),
                },
            ),
            ApiError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    error: "Handle store error",
                    details: Some(e.to_string()),
                },
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        if status.is_server_error() {
            tracing::error!(status = %status, details = ?body.details, "Request failed");
        }
        (status, Json(body)).into_response()
    }
}
