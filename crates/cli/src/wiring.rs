//! Build domain services from configuration

use anyhow::{Context, Result, bail};
use devstats_adapters::platforms::{
    CodeChefClient, GitHubClient, HackerRankClient, LeetCodeClient, StubPlatformClient,
};
use devstats_adapters::store::{InMemoryHandleStore, SqliteHandleStore};
use devstats_domain::{AggregateConfig, Aggregator, HandleStore};
use secrecy::SecretString;
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;

/// Slack on top of the per-request timeout for clients that make several calls
const PLATFORM_TIMEOUT_FACTOR: u64 = 3;

/// Aggregator with one client per configured platform
pub fn build_aggregator(config: &AppConfig) -> Result<Aggregator> {
    let aggregate_config = AggregateConfig {
        recent_limit: config.upstream.recent_limit,
        platform_timeout: Some(Duration::from_secs(
            config.upstream.timeout_secs.max(1) * PLATFORM_TIMEOUT_FACTOR,
        )),
    };
    let mut aggregator = Aggregator::new(aggregate_config);

    match config.upstream.provider.as_str() {
        "stub" => {
            for client in StubPlatformClient::all() {
                aggregator.register(Arc::new(client));
            }
        }
        "live" => {
            let settings = config.upstream.settings()?;

            aggregator.register(Arc::new(
                LeetCodeClient::with_endpoint(&settings, config.leetcode.graphql_url.clone())
                    .context("Failed to build LeetCode client")?,
            ));
            aggregator.register(Arc::new(
                CodeChefClient::with_base_url(&settings, config.codechef.base_url.clone())
                    .context("Failed to build CodeChef client")?,
            ));
            aggregator.register(Arc::new(
                HackerRankClient::with_base_url(
                    &settings,
                    config.hackerrank.strategy,
                    config.hackerrank.base_url.clone(),
                )
                .context("Failed to build HackerRank client")?,
            ));

            match load_token(&config.github.token_env, "GitHub") {
                Ok(token) => aggregator.register(Arc::new(
                    GitHubClient::with_urls(
                        &settings,
                        token,
                        config.github.api_url.clone(),
                        config.github.graphql_url.clone(),
                    )
                    .context("Failed to build GitHub client")?,
                )),
                Err(e) => tracing::warn!(error = %e, "GitHub client disabled"),
            }
        }
        other => bail!("Unknown upstream provider: {} (expected live or stub)", other),
    }

    tracing::debug!(platforms = ?aggregator.platforms(), "Aggregator ready");
    Ok(aggregator)
}

/// Handle store selected by `general.store`
pub async fn build_store(config: &AppConfig) -> Result<Arc<dyn HandleStore>> {
    match config.general.store.as_str() {
        "memory" => Ok(Arc::new(InMemoryHandleStore::new())),
        "sqlite" => {
            let store = SqliteHandleStore::new(&config.general.store_path)
                .await
                .with_context(|| {
                    format!(
                        "Failed to open handle store: {}",
                        config.general.store_path.display()
                    )
                })?;
            Ok(Arc::new(store))
        }
        other => bail!("Unknown store: {} (expected memory or sqlite)", other),
    }
}

/// Read a secret from the environment variable named in config
pub(crate) fn load_token(env_var: &str, provider: &str) -> Result<SecretString> {
    if env_var.trim().is_empty() {
        bail!("No token env var configured for {}", provider);
    }

    let token = std::env::var(env_var)
        .with_context(|| format!("Missing token env var {} for {}", env_var, provider))?;

    if token.trim().is_empty() {
        bail!("Token env var {} is empty for {}", env_var, provider);
    }

    Ok(SecretString::new(token.into()))
}
