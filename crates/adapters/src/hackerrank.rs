//! HackerRank adapter: unofficial REST API with a profile-scrape fallback

use async_trait::async_trait;
use devstats_domain::{
    Badge, FetchError, MonthlyProgress, NormalizedHandle, Platform, PlatformClient, PlatformStats,
    RawResponse, Submission, UNKNOWN_DIFFICULTY,
};
use reqwest::Client;
use scraper::Html;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;
use time::UtcOffset;

use crate::extract::{
    first_int, from_value_or_default, lenient_u64, parse_rfc3339, select_all, select_first,
    take_field, text_of,
};
use crate::http::{
    UpstreamSettings, build_client, check_status, read_json, read_text, transport_error,
};

pub const DEFAULT_BASE_URL: &str = "https://www.hackerrank.com";

/// Recent challenges requested from the REST API
const RECENT_LIMIT: u32 = 10;

/// Which upstream path is tried first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HackerRankStrategy {
    /// JSON endpoints, falling back to the profile page on upstream errors
    #[default]
    Rest,
    /// Profile page only
    Scrape,
}

impl fmt::Display for HackerRankStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HackerRankStrategy::Rest => f.write_str("rest"),
            HackerRankStrategy::Scrape => f.write_str("scrape"),
        }
    }
}

impl FromStr for HackerRankStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rest" => Ok(HackerRankStrategy::Rest),
            "scrape" => Ok(HackerRankStrategy::Scrape),
            other => Err(format!("Unknown HackerRank strategy '{}'", other)),
        }
    }
}

pub struct HackerRankClient {
    client: Client,
    base_url: String,
    strategy: HackerRankStrategy,
    utc_offset: UtcOffset,
}

impl HackerRankClient {
    pub fn new(
        settings: &UpstreamSettings,
        strategy: HackerRankStrategy,
    ) -> Result<Self, reqwest::Error> {
        Self::with_base_url(settings, strategy, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(
        settings: &UpstreamSettings,
        strategy: HackerRankStrategy,
        base_url: String,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            strategy,
            utc_offset: settings.utc_offset,
        })
    }

    async fn get_json(&self, handle: &str, url: &str) -> Result<serde_json::Value, FetchError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| transport_error(Platform::Hackerrank, e))?;
        let response = check_status(Platform::Hackerrank, handle, response).await?;
        read_json(Platform::Hackerrank, response).await
    }

    async fn fetch_rest(&self, handle: &NormalizedHandle) -> Result<RawResponse, FetchError> {
        let badges_url = format!("{}/rest/hackers/{}/badges", self.base_url, handle);
        let recent_url = format!(
            "{}/rest/hackers/{}/recent_challenges?limit={}",
            self.base_url, handle, RECENT_LIMIT
        );

        let (badges, recent) = tokio::join!(
            self.get_json(handle.as_str(), &badges_url),
            self.get_json(handle.as_str(), &recent_url),
        );
        let (badges, recent) = settle(badges, recent)?;

        Ok(RawResponse::Json(json!({ "badges": badges, "recent": recent })))
    }

    async fn fetch_profile_page(&self, handle: &NormalizedHandle) -> Result<RawResponse, FetchError> {
        let url = format!("{}/profile/{}", self.base_url, handle);
        let response = self
            .client
            .get(&url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| transport_error(Platform::Hackerrank, e))?;
        let response = check_status(Platform::Hackerrank, handle.as_str(), response).await?;
        Ok(RawResponse::Html(read_text(Platform::Hackerrank, response).await?))
    }

    fn extract_rest(&self, mut value: serde_json::Value, stats: &mut PlatformStats) {
        let badges: Models<RestBadge> =
            from_value_or_default(take_field(&mut value, "badges"), "hackerrank badges");
        let recent: Models<RestChallenge> =
            from_value_or_default(take_field(&mut value, "recent"), "hackerrank recent");

        stats.total = badges.models.iter().map(|b| b.total_challenges).sum();
        stats.badges = badges
            .models
            .into_iter()
            .filter(|b| !b.badge_name.is_empty())
            .map(|b| Badge {
                name: b.badge_name,
                level: None,
                stars: Some(b.stars as u32),
                solved: b.solved,
                needed: b.total_challenges,
            })
            .collect();

        stats.recent_submissions = recent
            .models
            .into_iter()
            .filter_map(|c| {
                let timestamp = parse_rfc3339(&c.created_at)?.to_offset(self.utc_offset);
                Some(Submission {
                    problem: c.name,
                    difficulty: UNKNOWN_DIFFICULTY.to_string(),
                    status: "Accepted".to_string(),
                    timestamp,
                })
            })
            .collect();

        let mut progress = MonthlyProgress::new();
        for submission in &stats.recent_submissions {
            progress.record(submission.timestamp, 1);
        }
        stats.monthly_progress = progress;
    }
}

#[async_trait]
impl PlatformClient for HackerRankClient {
    fn platform(&self) -> Platform {
        Platform::Hackerrank
    }

    async fn fetch_raw(&self, handle: &NormalizedHandle) -> Result<RawResponse, FetchError> {
        tracing::debug!(handle = %handle, strategy = %self.strategy, "Fetching HackerRank profile");

        match self.strategy {
            HackerRankStrategy::Scrape => self.fetch_profile_page(handle).await,
            HackerRankStrategy::Rest => match self.fetch_rest(handle).await {
                Err(FetchError::Upstream(reason)) => {
                    tracing::warn!(
                        handle = %handle,
                        reason = %reason,
                        "HackerRank REST API failed, falling back to profile page"
                    );
                    self.fetch_profile_page(handle).await
                }
                other => other,
            },
        }
    }

    fn extract(&self, handle: &NormalizedHandle, raw: RawResponse) -> PlatformStats {
        let mut stats = PlatformStats::empty(Platform::Hackerrank, handle.as_str());
        match raw {
            RawResponse::Json(value) => self.extract_rest(value, &mut stats),
            RawResponse::Html(body) => stats.badges = scrape_badges(&body),
        }

        stats.badges.sort_by(|a, b| b.solved.cmp(&a.solved));
        stats.solved = stats.badges.iter().map(|b| b.solved).sum();
        stats
    }
}

/// Combine both REST outcomes. When both fail, the more specific error wins
/// so the fallback decision does not depend on which request finished first.
fn settle(
    badges: Result<serde_json::Value, FetchError>,
    recent: Result<serde_json::Value, FetchError>,
) -> Result<(serde_json::Value, serde_json::Value), FetchError> {
    match (badges, recent) {
        (Ok(badges), Ok(recent)) => Ok((badges, recent)),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        (Err(a), Err(b)) => Err(if severity(&b) > severity(&a) { b } else { a }),
    }
}

fn severity(error: &FetchError) -> u8 {
    match error {
        FetchError::Upstream(_) => 0,
        FetchError::InvalidHandle(_) => 1,
        FetchError::RateLimited(_) => 2,
        FetchError::NotFound(_) => 3,
    }
}

/// Badge cards from the profile page
fn scrape_badges(body: &str) -> Vec<Badge> {
    let document = Html::parse_document(body);
    select_all(document.root_element(), ".hacker-badge, .badge-container")
        .into_iter()
        .filter_map(|card| {
            let name = select_first(card, &[".badge-title, .title"]).map(text_of)?;
            if name.is_empty() {
                return None;
            }
            let stars = select_all(card, ".badge-star, .star-filled").len() as u32;
            let solved = select_first(card, &[".badge-solved, .solved-count"])
                .and_then(|e| first_int(&text_of(e)))
                .unwrap_or(0);

            Some(Badge {
                name,
                level: None,
                stars: Some(stars),
                solved,
                needed: 0,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
struct Models<T> {
    #[serde(default = "Vec::new")]
    models: Vec<T>,
}

impl<T> Default for Models<T> {
    fn default() -> Self {
        Self { models: vec![] }
    }
}

#[derive(Debug, Deserialize)]
struct RestBadge {
    #[serde(default)]
    badge_name: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    stars: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    solved: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    total_challenges: u64,
}

#[derive(Debug, Deserialize)]
struct RestChallenge {
    #[serde(default)]
    name: String,
    #[serde(default)]
    created_at: String,
}
