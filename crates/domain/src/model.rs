//! Domain models and value objects

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use time::{Month, OffsetDateTime};

/// Difficulty reported when the upstream does not expose one
pub const UNKNOWN_DIFFICULTY: &str = "Unknown";

/// Rank reported when the upstream does not expose one
pub const UNKNOWN_RANK: &str = "N/A";

/// A supported upstream platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    #[serde(alias = "LeetCode")]
    Leetcode,
    #[serde(alias = "CodeChef")]
    Codechef,
    #[serde(alias = "HackerRank")]
    Hackerrank,
    #[serde(alias = "GitHub")]
    Github,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::Leetcode,
        Platform::Codechef,
        Platform::Hackerrank,
        Platform::Github,
    ];

    /// Lowercase identifier used in routes, config keys and JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Leetcode => "leetcode",
            Platform::Codechef => "codechef",
            Platform::Hackerrank => "hackerrank",
            Platform::Github => "github",
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Leetcode => "LeetCode",
            Platform::Codechef => "CodeChef",
            Platform::Hackerrank => "HackerRank",
            Platform::Github => "GitHub",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown platform name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown platform '{0}' (expected leetcode, codechef, hackerrank or github)")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "leetcode" => Ok(Platform::Leetcode),
            "codechef" => Ok(Platform::Codechef),
            "hackerrank" => Ok(Platform::Hackerrank),
            "github" => Ok(Platform::Github),
            _ => Err(UnknownPlatform(s.to_string())),
        }
    }
}

/// A user-supplied handle for one platform, before normalization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformIdentity {
    pub platform: Platform,
    pub handle: String,
}

impl PlatformIdentity {
    pub fn new(platform: Platform, handle: impl Into<String>) -> Self {
        Self {
            platform,
            handle: handle.into(),
        }
    }
}

/// A single problem submission / activity item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Problem title (or repository name for GitHub activity)
    pub problem: String,
    /// Difficulty label, `Unknown` when not resolvable
    pub difficulty: String,
    /// Upstream status text (e.g. "Accepted")
    pub status: String,
    /// When the submission happened
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Badge / skill card scraped from a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stars: Option<u32>,
    pub solved: u64,
    #[serde(default)]
    pub needed: u64,
}

/// Monthly activity counts keyed by 3-letter month abbreviation.
///
/// Always carries all twelve months, serialized in calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthlyProgress {
    counts: [u64; 12],
}

impl MonthlyProgress {
    pub const MONTHS: [&'static str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` to the bucket for `month`
    pub fn add(&mut self, month: Month, count: u64) {
        let idx = u8::from(month) as usize - 1;
        self.counts[idx] = self.counts[idx].saturating_add(count);
    }

    /// Add `count` to the month of `at`
    pub fn record(&mut self, at: OffsetDateTime, count: u64) {
        self.add(at.month(), count);
    }

    /// Count for an abbreviation such as `"Jan"`
    pub fn get(&self, abbr: &str) -> Option<u64> {
        Self::MONTHS
            .iter()
            .position(|m| m.eq_ignore_ascii_case(abbr))
            .map(|idx| self.counts[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        Self::MONTHS.iter().copied().zip(self.counts.iter().copied())
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

impl Serialize for MonthlyProgress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(12))?;
        for (month, count) in self.iter() {
            map.serialize_entry(month, &count)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for MonthlyProgress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ProgressVisitor;

        impl<'de> Visitor<'de> for ProgressVisitor {
            type Value = MonthlyProgress;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of month abbreviations to counts")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut progress = MonthlyProgress::new();
                while let Some((key, count)) = access.next_entry::<String, u64>()? {
                    if let Some(idx) = MonthlyProgress::MONTHS
                        .iter()
                        .position(|m| m.eq_ignore_ascii_case(&key))
                    {
                        progress.counts[idx] = count;
                    }
                }
                Ok(progress)
            }
        }

        deserializer.deserialize_map(ProgressVisitor)
    }
}

/// Unified statistics for one platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub platform: Platform,
    /// Normalized handle the stats were fetched for
    pub username: String,
    pub solved: u64,
    /// Upstream catalog size, best effort
    pub total: u64,
    pub rank: String,
    pub rating: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub badges: Vec<Badge>,
    pub recent_submissions: Vec<Submission>,
    pub monthly_progress: MonthlyProgress,
}

impl PlatformStats {
    /// Zero-valued stats for a platform
    pub fn empty(platform: Platform, username: impl Into<String>) -> Self {
        Self {
            platform,
            username: username.into(),
            solved: 0,
            total: 0,
            rank: UNKNOWN_RANK.to_string(),
            rating: 0,
            badges: vec![],
            recent_submissions: vec![],
            monthly_progress: MonthlyProgress::new(),
        }
    }
}

/// Why a platform fetch failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    NotFound,
    RateLimited,
    UpstreamError,
    InvalidHandle,
}

/// Record of a failed platform fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub platform: Platform,
    pub reason: FailureReason,
    pub message: String,
}

/// A submission tagged with the platform it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentEntry {
    pub platform: Platform,
    #[serde(flatten)]
    pub submission: Submission,
}

/// Combined view across all platforms of one user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResult {
    /// Successful platforms only
    pub per_platform: BTreeMap<Platform, PlatformStats>,
    pub total_solved: u64,
    /// Newest first, capped
    pub combined_recent: Vec<RecentEntry>,
    /// Platforms that were dispatched but failed
    #[serde(default)]
    pub failures: Vec<FetchFailure>,
}

impl AggregateResult {
    /// True when nothing succeeded; callers should prompt for reconfiguration
    pub fn is_empty(&self) -> bool {
        self.per_platform.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_monthly_progress_serializes_all_months_in_order() {
        let mut progress = MonthlyProgress::new();
        progress.add(Month::March, 4);

        let json = serde_json::to_string(&progress).unwrap();
        assert!(json.starts_with(r#"{"Jan":0,"Feb":0,"Mar":4,"#));
        assert!(json.ends_with(r#""Dec":0}"#));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 12);
    }

    #[test]
    fn test_monthly_progress_deserialize_ignores_unknown_keys() {
        let progress: MonthlyProgress =
            serde_json::from_str(r#"{"Jan": 2, "dec": 5, "Smarch": 9}"#).unwrap();
        assert_eq!(progress.get("Jan"), Some(2));
        assert_eq!(progress.get("Dec"), Some(5));
        assert_eq!(progress.get("Smarch"), None);
        assert_eq!(progress.total(), 7);
    }

    #[test]
    fn test_record_uses_month_of_timestamp() {
        let mut progress = MonthlyProgress::new();
        progress.record(datetime!(2024-11-03 10:00 UTC), 3);
        assert_eq!(progress.get("Nov"), Some(3));
    }

    #[test]
    fn test_platform_parse_and_display() {
        assert_eq!("LeetCode".parse::<Platform>().unwrap(), Platform::Leetcode);
        assert_eq!(" github ".parse::<Platform>().unwrap(), Platform::Github);
        assert!("topcoder".parse::<Platform>().is_err());
        assert_eq!(Platform::Hackerrank.to_string(), "hackerrank");
    }

    #[test]
    fn test_aggregate_result_uses_platform_keys() {
        let mut result = AggregateResult::default();
        result
            .per_platform
            .insert(Platform::Codechef, PlatformStats::empty(Platform::Codechef, "bob"));

        let value = serde_json::to_value(&result).unwrap();
        assert!(value["perPlatform"]["codechef"].is_object());
        assert_eq!(value["perPlatform"]["codechef"]["rank"], "N/A");
        assert_eq!(value["totalSolved"], 0);
    }
}
