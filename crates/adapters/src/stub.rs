//! Stub platform client for demos, tests and offline mode

use async_trait::async_trait;
use devstats_domain::{
    Badge, FetchError, MonthlyProgress, NormalizedHandle, Platform, PlatformClient, PlatformStats,
    RawResponse, Submission, UNKNOWN_DIFFICULTY,
};
use time::{Month, OffsetDateTime, macros::datetime};

/// Offline client returning canned stats.
///
/// Handles starting with `ghost` are reported as missing, `limited` as rate
/// limited and `broken` as an upstream failure.
pub struct StubPlatformClient {
    platform: Platform,
}

impl StubPlatformClient {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }

    /// One stub per supported platform
    pub fn all() -> Vec<Self> {
        Platform::ALL.into_iter().map(Self::new).collect()
    }

    fn canned(&self, handle: &str) -> PlatformStats {
        let mut stats = PlatformStats::empty(self.platform, handle);
        let (solved, total, rank, rating) = match self.platform {
            Platform::Leetcode => (150, 3000, "120345", 42),
            Platform::Codechef => (40, 5000, "8412", 1620),
            Platform::Hackerrank => (25, 120, "N/A", 0),
            Platform::Github => (300, 18, "N/A", 57),
        };
        stats.solved = solved;
        stats.total = total;
        stats.rank = rank.to_string();
        stats.rating = rating;
        stats.recent_submissions = vec![
            submission(self.platform, "first", datetime!(2024-03-10 12:00 UTC)),
            submission(self.platform, "second", datetime!(2024-02-20 08:30 UTC)),
        ];

        let mut progress = MonthlyProgress::new();
        progress.add(Month::February, solved / 3);
        progress.add(Month::March, solved - solved / 3);
        stats.monthly_progress = progress;

        if matches!(self.platform, Platform::Codechef | Platform::Hackerrank) {
            stats.badges = vec![Badge {
                name: "Problem Solving".to_string(),
                level: Some("Silver".to_string()),
                stars: Some(3),
                solved,
                needed: solved * 2,
            }];
        }
        stats
    }
}

fn submission(platform: Platform, label: &str, timestamp: OffsetDateTime) -> Submission {
    Submission {
        problem: format!("{} {} problem", platform.display_name(), label),
        difficulty: UNKNOWN_DIFFICULTY.to_string(),
        status: "Accepted".to_string(),
        timestamp,
    }
}

#[async_trait]
impl PlatformClient for StubPlatformClient {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn fetch_raw(&self, handle: &NormalizedHandle) -> Result<RawResponse, FetchError> {
        let name = handle.as_str().to_ascii_lowercase();
        if name.starts_with("ghost") {
            return Err(FetchError::NotFound(format!(
                "{} user '{}' not found",
                self.platform.display_name(),
                handle
            )));
        }
        if name.starts_with("limited") {
            return Err(FetchError::RateLimited(format!(
                "{} rate limit exceeded, try again later",
                self.platform.display_name()
            )));
        }
        if name.starts_with("broken") {
            return Err(FetchError::Upstream(format!(
                "{} returned 502 Bad Gateway",
                self.platform.display_name()
            )));
        }

        let stats = self.canned(handle.as_str());
        serde_json::to_value(&stats)
            .map(RawResponse::Json)
            .map_err(|e| FetchError::Upstream(e.to_string()))
    }

    fn extract(&self, handle: &NormalizedHandle, raw: RawResponse) -> PlatformStats {
        match raw {
            RawResponse::Json(value) => serde_json::from_value(value)
                .unwrap_or_else(|_| PlatformStats::empty(self.platform, handle.as_str())),
            RawResponse::Html(_) => PlatformStats::empty(self.platform, handle.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devstats_domain::normalize;

    #[tokio::test]
    async fn test_canned_stats() {
        let client = StubPlatformClient::new(Platform::Leetcode);
        let handle = normalize(Platform::Leetcode, "alice");

        let stats = client.fetch_stats(&handle).await.unwrap();

        assert_eq!(stats.username, "alice");
        assert_eq!(stats.solved, 150);
        assert_eq!(stats.monthly_progress.total(), 150);
        assert_eq!(stats.recent_submissions.len(), 2);
        assert!(stats.badges.is_empty());
    }

    #[tokio::test]
    async fn test_magic_prefixes() {
        let client = StubPlatformClient::new(Platform::Codechef);

        let missing = client.fetch_stats(&normalize(Platform::Codechef, "ghost-user")).await;
        let limited = client.fetch_stats(&normalize(Platform::Codechef, "limited1")).await;
        let broken = client.fetch_stats(&normalize(Platform::Codechef, "broken")).await;

        assert!(matches!(missing, Err(FetchError::NotFound(_))));
        assert!(matches!(limited, Err(FetchError::RateLimited(_))));
        assert!(matches!(broken, Err(FetchError::Upstream(_))));
    }

    #[test]
    fn test_all_covers_every_platform() {
        let platforms: Vec<Platform> = StubPlatformClient::all()
            .iter()
            .map(|c| c.platform())
            .collect();
        assert_eq!(platforms, Platform::ALL.to_vec());
    }
}
