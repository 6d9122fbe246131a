//! API route handlers

use axum::Json;
use axum::extract::{Path, Query, State};
use devstats_domain::{AggregateResult, FetchError, Platform, PlatformIdentity, PlatformStats};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;

use super::AppState;
use super::error::ApiError;

pub(super) async fn root() -> Json<Value> {
    let mut endpoints: Vec<Value> = Platform::ALL
        .iter()
        .map(|p| {
            json!({
                "path": format!("/api/{}/{{username}}", p.as_str()),
                "description": format!("Get {} user statistics", p.display_name()),
            })
        })
        .collect();
    endpoints.extend([
        json!({ "path": "/api/stats", "description": "Aggregate statistics across platforms" }),
        json!({ "path": "/api/users/{user}/handles", "description": "Get or replace stored handles" }),
        json!({ "path": "/api/users/{user}/stats", "description": "Aggregate statistics for stored handles" }),
        json!({ "path": "/health", "description": "Health check" }),
    ]);

    Json(json!({
        "name": "devstats",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": endpoints,
    }))
}

pub(super) async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn platform_stats(
    platform: Platform,
    state: &AppState,
    username: &str,
) -> Result<Json<PlatformStats>, ApiError> {
    tracing::debug!(platform = %platform, username = %username, "Platform stats requested");
    let stats = state.aggregator.fetch_one(platform, username).await?;
    Ok(Json(stats))
}

pub(super) async fn leetcode(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PlatformStats>, ApiError> {
    platform_stats(Platform::Leetcode, &state, &username).await
}

pub(super) async fn codechef(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PlatformStats>, ApiError> {
    platform_stats(Platform::Codechef, &state, &username).await
}

pub(super) async fn hackerrank(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PlatformStats>, ApiError> {
    platform_stats(Platform::Hackerrank, &state, &username).await
}

pub(super) async fn github(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<PlatformStats>, ApiError> {
    platform_stats(Platform::Github, &state, &username).await
}

/// Handles for the combined endpoint, one optional query parameter per platform
#[derive(Debug, Default, Deserialize)]
pub(super) struct AggregateQuery {
    leetcode: Option<String>,
    codechef: Option<String>,
    hackerrank: Option<String>,
    github: Option<String>,
}

impl AggregateQuery {
    fn identities(self) -> Vec<PlatformIdentity> {
        [
            (Platform::Leetcode, self.leetcode),
            (Platform::Codechef, self.codechef),
            (Platform::Hackerrank, self.hackerrank),
            (Platform::Github, self.github),
        ]
        .into_iter()
        .filter_map(|(platform, handle)| handle.map(|h| PlatformIdentity::new(platform, h)))
        .collect()
    }
}

pub(super) async fn aggregate(
    State(state): State<AppState>,
    Query(query): Query<AggregateQuery>,
) -> Json<AggregateResult> {
    Json(state.aggregator.aggregate(&query.identities()).await)
}

/// Stored handles keyed by platform
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub(super) struct HandleMap(BTreeMap<Platform, String>);

impl HandleMap {
    fn from_identities(identities: Vec<PlatformIdentity>) -> Self {
        Self(
            identities
                .into_iter()
                .map(|identity| (identity.platform, identity.handle))
                .collect(),
        )
    }
}

pub(super) async fn get_handles(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<HandleMap>, ApiError> {
    let identities = state.store.get_handles(&user).await?;
    Ok(Json(HandleMap::from_identities(identities)))
}

/// Replace the listed platforms' handles; an empty value removes the platform
pub(super) async fn put_handles(
    State(state): State<AppState>,
    Path(user): Path<String>,
    Json(update): Json<HandleMap>,
) -> Result<Json<HandleMap>, ApiError> {
    let mut changes = Vec::with_capacity(update.0.len());
    for (platform, raw) in update.0 {
        if raw.trim().is_empty() {
            changes.push((platform, None));
            continue;
        }
        let handle = devstats_domain::normalize(platform, &raw);
        if handle.is_empty() {
            return Err(FetchError::InvalidHandle(format!(
                "'{}' is not a valid {} username",
                raw,
                platform.display_name()
            ))
            .into());
        }
        changes.push((platform, Some(handle.into_inner())));
    }

    for (platform, handle) in changes {
        match handle {
            Some(handle) => {
                state
                    .store
                    .set_handle(&user, &PlatformIdentity::new(platform, handle))
                    .await?
            }
            None => {
                state.store.remove_handle(&user, platform).await?;
            }
        }
    }

    tracing::info!(user = %user, "Stored handles updated");
    let identities = state.store.get_handles(&user).await?;
    Ok(Json(HandleMap::from_identities(identities)))
}

pub(super) async fn user_stats(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<AggregateResult>, ApiError> {
    let identities = state.store.get_handles(&user).await?;
    if identities.is_empty() {
        tracing::debug!(user = %user, "No handles stored for user");
    }
    Ok(Json(state.aggregator.aggregate(&identities).await))
}
