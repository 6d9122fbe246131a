//! HTTP API over the aggregator and handle store

mod error;
mod routes;

use anyhow::{Context, Result};
use axum::Router;
use axum::http::HeaderValue;
use axum::routing::get;
use devstats_domain::{Aggregator, HandleStore};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::ServerConfig;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub store: Arc<dyn HandleStore>,
}

impl AppState {
    pub fn new(aggregator: Aggregator, store: Arc<dyn HandleStore>) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            store,
        }
    }
}

/// Build the API router with CORS applied
pub fn app_router(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/api/leetcode/{username}", get(routes::leetcode))
        .route("/api/codechef/{username}", get(routes::codechef))
        .route("/api/hackerrank/{username}", get(routes::hackerrank))
        .route("/api/github/{username}", get(routes::github))
        .route("/api/stats", get(routes::aggregate))
        .route(
            "/api/users/{user}/handles",
            get(routes::get_handles).put(routes::put_handles),
        )
        .route("/api/users/{user}/stats", get(routes::user_stats))
        .layer(cors_layer(&config.allowed_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o.trim() == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Serve until ctrl-c
pub async fn serve(state: AppState, config: &ServerConfig, listen_addr: &str) -> Result<()> {
    let router = app_router(state, config);
    let listener = TcpListener::bind(listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", listen_addr))?;

    tracing::info!(addr = %listener.local_addr()?, "devstats API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use devstats_adapters::platforms::StubPlatformClient;
    use devstats_adapters::store::InMemoryHandleStore;
    use devstats_domain::AggregateConfig;
    use serde_json::{Value, json};
    use std::net::SocketAddr;

    async fn spawn_app() -> SocketAddr {
        let mut aggregator = Aggregator::new(AggregateConfig::default());
        for client in StubPlatformClient::all() {
            aggregator.register(Arc::new(client));
        }
        let state = AppState::new(aggregator, Arc::new(InMemoryHandleStore::new()));
        let router = app_router(state, &ServerConfig::default());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_health() {
        let addr = spawn_app().await;
        let body: Value = reqwest::get(format!("http://{}/health", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({ "status": "healthy" }));
    }

    #[tokio::test]
    async fn test_root_lists_endpoints() {
        let addr = spawn_app().await;
        let body: Value = reqwest::get(format!("http://{}/", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["name"], "devstats");
        let paths: Vec<&str> = body["endpoints"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|e| e["path"].as_str())
            .collect();
        assert!(paths.contains(&"/api/leetcode/{username}"));
        assert!(paths.contains(&"/api/stats"));
    }

    #[tokio::test]
    async fn test_platform_route_returns_stats() {
        let addr = spawn_app().await;
        let response = reqwest::get(format!("http://{}/api/leetcode/%40alice", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["platform"], "leetcode");
        assert_eq!(body["username"], "alice");
        assert_eq!(body["solved"], 150);
        assert!(body["monthlyProgress"]["Jan"].is_u64());
    }

    #[tokio::test]
    async fn test_platform_route_error_statuses() {
        let addr = spawn_app().await;

        let response = reqwest::get(format!("http://{}/api/codechef/ghost", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "User not found");

        let response = reqwest::get(format!("http://{}/api/github/limited", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 429);

        let response = reqwest::get(format!("http://{}/api/hackerrank/broken", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 500);

        let response = reqwest::get(format!("http://{}/api/leetcode/%21%21%21", addr))
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "Invalid username format");
    }

    #[tokio::test]
    async fn test_aggregate_route_collects_failures() {
        let addr = spawn_app().await;
        let body: Value = reqwest::get(format!(
            "http://{}/api/stats?leetcode=alice&codechef=ghost_user",
            addr
        ))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

        assert_eq!(body["totalSolved"], 150);
        assert!(body["perPlatform"]["leetcode"].is_object());
        assert!(body["perPlatform"].get("codechef").is_none());
        assert_eq!(body["failures"][0]["platform"], "codechef");
        assert_eq!(body["failures"][0]["reason"], "not_found");
        assert_eq!(body["combinedRecent"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_handles_roundtrip_and_user_stats() {
        let addr = spawn_app().await;
        let client = reqwest::Client::new();
        let url = format!("http://{}/api/users/u1/handles", addr);

        let body: Value = client
            .put(&url)
            .json(&json!({ "leetcode": "https://leetcode.com/u/alice/", "github": "bob" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({ "leetcode": "alice", "github": "bob" }));

        let body: Value = client
            .put(&url)
            .json(&json!({ "github": "" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({ "leetcode": "alice" }));

        let response = client
            .put(&url)
            .json(&json!({ "codechef": "%%%" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        let body: Value = client
            .get(format!("http://{}/api/users/u1/stats", addr))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["totalSolved"], 150);
        assert_eq!(body["perPlatform"]["leetcode"]["username"], "alice");
    }

    #[tokio::test]
    async fn test_unknown_user_has_empty_stats() {
        let addr = spawn_app().await;
        let body: Value = reqwest::get(format!("http://{}/api/users/nobody/stats", addr))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["totalSolved"], 0);
        assert_eq!(body["perPlatform"], json!({}));
    }

    #[tokio::test]
    async fn test_cors_allows_configured_origin() {
        let addr = spawn_app().await;
        let response = reqwest::Client::new()
            .get(format!("http://{}/health", addr))
            .header("Origin", "http://localhost:3000")
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.headers()["access-control-allow-origin"],
            "http://localhost:3000"
        );
    }
}
