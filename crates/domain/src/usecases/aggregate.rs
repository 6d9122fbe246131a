//! Aggregation use case - fan out to every configured platform and merge

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use crate::{
    model::{AggregateResult, Platform, PlatformIdentity, PlatformStats, RecentEntry},
    normalize::{NormalizedHandle, normalize},
    ports::{FetchError, PlatformClient},
};

/// Configuration for the aggregator
#[derive(Debug, Clone)]
pub struct AggregateConfig {
    /// Maximum entries in the combined recent feed
    pub recent_limit: usize,
    /// Upper bound on one platform fetch, on top of the client's own timeouts
    pub platform_timeout: Option<Duration>,
}

impl Default for AggregateConfig {
    fn default() -> Self {
        Self {
            recent_limit: 5,
            platform_timeout: None,
        }
    }
}

/// Aggregator over a set of platform clients
#[derive(Clone)]
pub struct Aggregator {
    clients: BTreeMap<Platform, Arc<dyn PlatformClient>>,
    config: AggregateConfig,
}

impl Aggregator {
    pub fn new(config: AggregateConfig) -> Self {
        Self {
            clients: BTreeMap::new(),
            config,
        }
    }

    /// Register a client, replacing any previous client for the same platform
    pub fn with_client(mut self, client: Arc<dyn PlatformClient>) -> Self {
        self.register(client);
        self
    }

    pub fn register(&mut self, client: Arc<dyn PlatformClient>) {
        self.clients.insert(client.platform(), client);
    }

    pub fn client(&self, platform: Platform) -> Option<&Arc<dyn PlatformClient>> {
        self.clients.get(&platform)
    }

    /// Platforms that have a client registered
    pub fn platforms(&self) -> Vec<Platform> {
        self.clients.keys().copied().collect()
    }

    pub fn config(&self) -> &AggregateConfig {
        &self.config
    }

    /// Fetch a single platform.
    ///
    /// Unlike [`aggregate`](Self::aggregate), an unusable handle is reported
    /// as [`FetchError::InvalidHandle`].
    pub async fn fetch_one(
        &self,
        platform: Platform,
        raw_handle: &str,
    ) -> Result<PlatformStats, FetchError> {
        let client = self.client(platform).ok_or_else(|| not_configured(platform))?;

        let handle = client.normalize(raw_handle);
        if handle.is_empty() {
            return Err(FetchError::InvalidHandle(format!(
                "'{}' is not a valid {} username; use letters, numbers, underscores and hyphens (max 39)",
                raw_handle,
                platform.display_name()
            )));
        }

        self.fetch_guarded(client.as_ref(), &handle).await
    }

    /// Fetch every identity concurrently and merge the settled outcomes.
    ///
    /// Identities that normalize to an empty handle are skipped. Individual
    /// failures never abort the batch.
    pub async fn aggregate(&self, identities: &[PlatformIdentity]) -> AggregateResult {
        let mut seen: BTreeMap<Platform, NormalizedHandle> = BTreeMap::new();
        for identity in identities {
            if seen.contains_key(&identity.platform) {
                tracing::debug!(platform = %identity.platform, "Duplicate identity ignored");
                continue;
            }
            let handle = match self.client(identity.platform) {
                Some(client) => client.normalize(&identity.handle),
                None => normalize(identity.platform, &identity.handle),
            };
            if handle.is_empty() {
                tracing::debug!(platform = %identity.platform, "Skipping empty handle");
                continue;
            }
            seen.insert(identity.platform, handle);
        }

        if seen.is_empty() {
            return AggregateResult::default();
        }

        tracing::info!(
            platforms = ?seen.keys().collect::<Vec<_>>(),
            "Aggregating platform stats"
        );

        let jobs = seen.into_iter().map(|(platform, handle)| async move {
            let result = match self.client(platform) {
                Some(client) => self.fetch_guarded(client.as_ref(), &handle).await,
                None => Err(not_configured(platform)),
            };
            (platform, result)
        });

        let outcomes = join_all(jobs).await;
        let result = merge(outcomes, self.config.recent_limit);

        tracing::info!(
            succeeded = result.per_platform.len(),
            failed = result.failures.len(),
            total_solved = result.total_solved,
            "Aggregation complete"
        );

        result
    }

    async fn fetch_guarded(
        &self,
        client: &dyn PlatformClient,
        handle: &NormalizedHandle,
    ) -> Result<PlatformStats, FetchError> {
        let platform = client.platform();
        tracing::debug!(platform = %platform, handle = %handle, "Fetching platform stats");

        let fetch = client.fetch_stats(handle);
        let result = match self.config.platform_timeout {
            Some(limit) => match tokio::time::timeout(limit, fetch).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Upstream(format!(
                    "{} fetch timed out after {:?}",
                    platform.display_name(),
                    limit
                ))),
            },
            None => fetch.await,
        };

        if let Err(e) = &result {
            tracing::warn!(platform = %platform, handle = %handle, error = %e, "Platform fetch failed");
        }

        result
    }
}

fn not_configured(platform: Platform) -> FetchError {
    FetchError::Upstream(format!("no client configured for {}", platform.display_name()))
}

/// Merge settled per-platform outcomes into one result
pub fn merge(
    outcomes: Vec<(Platform, Result<PlatformStats, FetchError>)>,
    recent_limit: usize,
) -> AggregateResult {
    let mut result = AggregateResult::default();

    for (platform, outcome) in outcomes {
        match outcome {
            Ok(stats) => {
                result.total_solved = result.total_solved.saturating_add(stats.solved);
                result
                    .combined_recent
                    .extend(stats.recent_submissions.iter().cloned().map(|submission| {
                        RecentEntry {
                            platform,
                            submission,
                        }
                    }));
                result.per_platform.insert(platform, stats);
            }
            Err(e) => result.failures.push(e.into_failure(platform)),
        }
    }

    result
        .combined_recent
        .sort_by(|a, b| b.submission.timestamp.cmp(&a.submission.timestamp));
    result.combined_recent.truncate(recent_limit);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FailureReason, Submission};
    use crate::ports::RawResponse;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use time::OffsetDateTime;
    use time::macros::datetime;

    struct FakeClient {
        platform: Platform,
        outcome: Result<PlatformStats, FetchError>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl FakeClient {
        fn ok(platform: Platform, solved: u64, recent: Vec<Submission>) -> Self {
            let mut stats = PlatformStats::empty(platform, "someone");
            stats.solved = solved;
            stats.recent_submissions = recent;
            Self {
                platform,
                outcome: Ok(stats),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        fn err(platform: Platform, error: FetchError) -> Self {
            Self {
                platform,
                outcome: Err(error),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }
    }

    #[async_trait]
    impl PlatformClient for FakeClient {
        fn platform(&self) -> Platform {
            self.platform
        }

        async fn fetch_raw(&self, _handle: &NormalizedHandle) -> Result<RawResponse, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome.clone().map(|_| RawResponse::Json(serde_json::Value::Null))
        }

        fn extract(&self, handle: &NormalizedHandle, _raw: RawResponse) -> PlatformStats {
            let mut stats = self.outcome.clone().expect("extract only called on success");
            stats.username = handle.to_string();
            stats
        }
    }

    fn submission(problem: &str, at: OffsetDateTime) -> Submission {
        Submission {
            problem: problem.to_string(),
            difficulty: "Unknown".to_string(),
            status: "Accepted".to_string(),
            timestamp: at,
        }
    }

    #[tokio::test]
    async fn test_empty_identities_make_no_calls() {
        let client = Arc::new(FakeClient::ok(Platform::Leetcode, 10, vec![]));
        let aggregator =
            Aggregator::new(AggregateConfig::default()).with_client(client.clone());

        let result = aggregator.aggregate(&[]).await;

        assert!(result.per_platform.is_empty());
        assert_eq!(result.total_solved, 0);
        assert!(result.combined_recent.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_keeps_successes() {
        let aggregator = Aggregator::new(AggregateConfig::default())
            .with_client(Arc::new(FakeClient::ok(Platform::Leetcode, 15, vec![])))
            .with_client(Arc::new(FakeClient::ok(Platform::Github, 7, vec![])))
            .with_client(Arc::new(FakeClient::err(
                Platform::Codechef,
                FetchError::NotFound("ghost-user".to_string()),
            )))
            .with_client(Arc::new(FakeClient::err(
                Platform::Hackerrank,
                FetchError::RateLimited("slow down".to_string()),
            )));

        let identities = vec![
            PlatformIdentity::new(Platform::Leetcode, "alice"),
            PlatformIdentity::new(Platform::Github, "alice"),
            PlatformIdentity::new(Platform::Codechef, "ghost-user"),
            PlatformIdentity::new(Platform::Hackerrank, "alice"),
        ];

        let result = aggregator.aggregate(&identities).await;

        assert_eq!(result.per_platform.len(), 2);
        assert_eq!(result.total_solved, 22);
        assert_eq!(result.failures.len(), 2);
        assert!(
            result
                .failures
                .iter()
                .any(|f| f.platform == Platform::Codechef && f.reason == FailureReason::NotFound)
        );
        assert!(
            result.failures.iter().any(
                |f| f.platform == Platform::Hackerrank && f.reason == FailureReason::RateLimited
            )
        );
    }

    #[tokio::test]
    async fn test_all_failed_is_empty_result() {
        let aggregator = Aggregator::new(AggregateConfig::default()).with_client(Arc::new(
            FakeClient::err(Platform::Leetcode, FetchError::Upstream("boom".to_string())),
        ));

        let result = aggregator
            .aggregate(&[PlatformIdentity::new(Platform::Leetcode, "alice")])
            .await;

        assert!(result.is_empty());
        assert_eq!(result.total_solved, 0);
        assert_eq!(result.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_handles_are_skipped() {
        let client = Arc::new(FakeClient::ok(Platform::Codechef, 3, vec![]));
        let aggregator =
            Aggregator::new(AggregateConfig::default()).with_client(client.clone());

        let result = aggregator
            .aggregate(&[PlatformIdentity::new(
                Platform::Codechef,
                "https://www.codechef.com/users/",
            )])
            .await;

        assert!(result.per_platform.is_empty());
        assert!(result.failures.is_empty());
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_client_reports_failure() {
        let aggregator = Aggregator::new(AggregateConfig::default());

        let result = aggregator
            .aggregate(&[PlatformIdentity::new(Platform::Github, "octocat")])
            .await;

        assert!(result.per_platform.is_empty());
        assert_eq!(result.failures[0].reason, FailureReason::UpstreamError);
    }

    #[tokio::test]
    async fn test_combined_recent_sorted_and_capped() {
        let leetcode = vec![
            submission("two-sum", datetime!(2024-01-01 10:00 UTC)),
            submission("three-sum", datetime!(2024-03-01 10:00 UTC)),
            submission("four-sum", datetime!(2024-05-01 10:00 UTC)),
        ];
        let codechef = vec![
            submission("FLOW001", datetime!(2024-02-01 10:00 UTC)),
            submission("FLOW002", datetime!(2024-04-01 10:00 UTC)),
            submission("FLOW003", datetime!(2024-06-01 10:00 UTC)),
        ];

        let aggregator = Aggregator::new(AggregateConfig::default())
            .with_client(Arc::new(FakeClient::ok(Platform::Leetcode, 1, leetcode)))
            .with_client(Arc::new(FakeClient::ok(Platform::Codechef, 1, codechef)));

        let result = aggregator
            .aggregate(&[
                PlatformIdentity::new(Platform::Leetcode, "alice"),
                PlatformIdentity::new(Platform::Codechef, "alice"),
            ])
            .await;

        assert_eq!(result.combined_recent.len(), 5);
        let problems: Vec<_> = result
            .combined_recent
            .iter()
            .map(|e| e.submission.problem.as_str())
            .collect();
        assert_eq!(
            problems,
            vec!["FLOW003", "four-sum", "FLOW002", "three-sum", "FLOW001"]
        );
        assert_eq!(result.combined_recent[0].platform, Platform::Codechef);
        assert!(
            result
                .combined_recent
                .windows(2)
                .all(|w| w[0].submission.timestamp >= w[1].submission.timestamp)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_platform_times_out_without_blocking_others() {
        let mut slow = FakeClient::ok(Platform::Github, 99, vec![]);
        slow.delay = Some(Duration::from_secs(60));

        let config = AggregateConfig {
            platform_timeout: Some(Duration::from_secs(10)),
            ..Default::default()
        };
        let aggregator = Aggregator::new(config)
            .with_client(Arc::new(slow))
            .with_client(Arc::new(FakeClient::ok(Platform::Leetcode, 4, vec![])));

        let result = aggregator
            .aggregate(&[
                PlatformIdentity::new(Platform::Github, "octocat"),
                PlatformIdentity::new(Platform::Leetcode, "alice"),
            ])
            .await;

        assert_eq!(result.total_solved, 4);
        assert_eq!(result.failures.len(), 1);
        assert_eq!(result.failures[0].platform, Platform::Github);
    }

    #[tokio::test]
    async fn test_fetch_one_rejects_invalid_handle() {
        let client = Arc::new(FakeClient::ok(Platform::Leetcode, 1, vec![]));
        let aggregator =
            Aggregator::new(AggregateConfig::default()).with_client(client.clone());

        let result = aggregator.fetch_one(Platform::Leetcode, &"x".repeat(50)).await;

        assert!(matches!(result, Err(FetchError::InvalidHandle(_))));
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fetch_one_uses_normalized_handle() {
        let aggregator = Aggregator::new(AggregateConfig::default())
            .with_client(Arc::new(FakeClient::ok(Platform::Leetcode, 15, vec![])));

        let stats = aggregator
            .fetch_one(Platform::Leetcode, "https://leetcode.com/u/alice/")
            .await
            .unwrap();

        assert_eq!(stats.username, "alice");
        assert_eq!(stats.solved, 15);
    }
}
