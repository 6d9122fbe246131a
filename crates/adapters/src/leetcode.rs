//! LeetCode adapter backed by the public GraphQL endpoint

use async_trait::async_trait;
use devstats_domain::{
    FetchError, MonthlyProgress, NormalizedHandle, Platform, PlatformClient, PlatformStats,
    RawResponse, Submission, UNKNOWN_DIFFICULTY, UNKNOWN_RANK,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use time::UtcOffset;

use crate::extract::{
    from_epoch, from_value_or_default, lenient_i64, lenient_u64, take_field, value_u64,
};
use crate::http::{UpstreamSettings, build_client, check_status, read_json, transport_error};

pub const DEFAULT_GRAPHQL_URL: &str = "https://leetcode.com/graphql";

/// Recent submissions requested per fetch
const RECENT_LIMIT: u32 = 10;

const STATS_QUERY: &str = r#"
query userPublicProfile($username: String!) {
  matchedUser(username: $username) {
    username
    submitStats: submitStatsGlobal {
      acSubmissionNum { difficulty count submissions }
    }
    profile { ranking reputation }
    submissionCalendar
  }
  allQuestionsCount { difficulty count }
}
"#;

const RECENT_QUERY: &str = r#"
query recentSubmissions($username: String!, $limit: Int!) {
  recentSubmissionList(username: $username, limit: $limit) {
    title
    timestamp
    statusDisplay
  }
}
"#;

/// LeetCode client issuing a stats query followed by a recent-submissions query
pub struct LeetCodeClient {
    client: Client,
    endpoint: String,
    utc_offset: UtcOffset,
}

impl LeetCodeClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, reqwest::Error> {
        Self::with_endpoint(settings, DEFAULT_GRAPHQL_URL.to_string())
    }

    pub fn with_endpoint(
        settings: &UpstreamSettings,
        endpoint: String,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(settings)?,
            endpoint,
            utc_offset: settings.utc_offset,
        })
    }

    async fn query(
        &self,
        handle: &str,
        operation: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, FetchError> {
        let body = json!({
            "operationName": operation,
            "query": query,
            "variables": variables,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .header("Referer", "https://leetcode.com")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(Platform::Leetcode, e))?;

        let response = check_status(Platform::Leetcode, handle, response).await?;
        let mut value = read_json(Platform::Leetcode, response).await?;
        Ok(take_field(&mut value, "data"))
    }
}

#[async_trait]
impl PlatformClient for LeetCodeClient {
    fn platform(&self) -> Platform {
        Platform::Leetcode
    }

    async fn fetch_raw(&self, handle: &NormalizedHandle) -> Result<RawResponse, FetchError> {
        tracing::debug!(handle = %handle, "Querying LeetCode profile");

        let profile = self
            .query(
                handle.as_str(),
                "userPublicProfile",
                STATS_QUERY,
                json!({ "username": handle.as_str() }),
            )
            .await?;

        if profile.get("matchedUser").is_none_or(serde_json::Value::is_null) {
            return Err(FetchError::NotFound(format!(
                "LeetCode user '{}' not found",
                handle
            )));
        }

        let recent = self
            .query(
                handle.as_str(),
                "recentSubmissions",
                RECENT_QUERY,
                json!({ "username": handle.as_str(), "limit": RECENT_LIMIT }),
            )
            .await?;

        Ok(RawResponse::Json(json!({ "profile": profile, "recent": recent })))
    }

    fn extract(&self, handle: &NormalizedHandle, raw: RawResponse) -> PlatformStats {
        let mut stats = PlatformStats::empty(Platform::Leetcode, handle.as_str());
        let RawResponse::Json(mut value) = raw else {
            tracing::warn!("LeetCode extractor received a non-JSON payload");
            return stats;
        };

        let profile: ProfileData =
            from_value_or_default(take_field(&mut value, "profile"), "leetcode profile");
        let recent: RecentData =
            from_value_or_default(take_field(&mut value, "recent"), "leetcode recent");

        let user = profile.matched_user.unwrap_or_default();
        stats.solved = sum_buckets(&user.submit_stats.ac_submission_num);
        stats.total = sum_buckets(&profile.all_questions_count);
        stats.rank = match user.profile.ranking {
            0 => UNKNOWN_RANK.to_string(),
            ranking => ranking.to_string(),
        };
        stats.rating = user.profile.reputation;
        stats.monthly_progress = calendar_progress(user.submission_calendar, self.utc_offset);
        stats.recent_submissions = recent
            .recent_submission_list
            .unwrap_or_default()
            .into_iter()
            .filter_map(|item| {
                let timestamp = from_epoch(value_u64(&item.timestamp) as i64, self.utc_offset)?;
                Some(Submission {
                    problem: item.title,
                    difficulty: UNKNOWN_DIFFICULTY.to_string(),
                    status: item.status_display,
                    timestamp,
                })
            })
            .collect();

        stats
    }
}

/// Sum bucket counts; the aggregate "All" bucket is ignored when per-difficulty buckets exist
fn sum_buckets(buckets: &[Bucket]) -> u64 {
    let is_all = |b: &Bucket| {
        b.difficulty
            .as_deref()
            .is_some_and(|d| d.eq_ignore_ascii_case("all"))
    };
    if buckets.iter().any(|b| !is_all(b)) {
        buckets.iter().filter(|b| !is_all(b)).map(|b| b.count).sum()
    } else {
        buckets.iter().map(|b| b.count).sum()
    }
}

/// Bucket a submission calendar into months.
///
/// The calendar arrives either as a JSON-encoded string or as an object,
/// keyed by epoch seconds.
fn calendar_progress(calendar: serde_json::Value, offset: UtcOffset) -> MonthlyProgress {
    let calendar = match calendar {
        serde_json::Value::String(s) => serde_json::from_str(&s).unwrap_or_default(),
        other => other,
    };

    let entries: HashMap<String, serde_json::Value> =
        from_value_or_default(calendar, "leetcode submission calendar");

    let mut progress = MonthlyProgress::new();
    for (epoch, count) in entries {
        let Some(at) = epoch.trim().parse::<i64>().ok().and_then(|s| from_epoch(s, offset)) else {
            continue;
        };
        progress.record(at, value_u64(&count));
    }
    progress
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileData {
    matched_user: Option<MatchedUser>,
    #[serde(default)]
    all_questions_count: Vec<Bucket>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchedUser {
    #[serde(default)]
    submit_stats: SubmitStats,
    #[serde(default)]
    profile: Profile,
    #[serde(default)]
    submission_calendar: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitStats {
    #[serde(default)]
    ac_submission_num: Vec<Bucket>,
}

#[derive(Debug, Default, Deserialize)]
struct Profile {
    #[serde(default, deserialize_with = "lenient_u64")]
    ranking: u64,
    #[serde(default, deserialize_with = "lenient_i64")]
    reputation: i64,
}

#[derive(Debug, Deserialize)]
struct Bucket {
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentData {
    recent_submission_list: Option<Vec<RecentItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentItem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    timestamp: serde_json::Value,
    #[serde(default)]
    status_display: String,
}
