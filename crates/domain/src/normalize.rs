//! Handle normalization
//!
//! Users paste anything from a bare username to a full profile URL. Every
//! handle goes through [`normalize`] before an upstream call is made. An
//! unusable handle normalizes to the empty string, which callers treat as
//! "skip this platform" rather than an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::model::Platform;

/// Longest handle accepted on any platform
pub const MAX_HANDLE_LEN: usize = 39;

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^https?://").expect("valid scheme pattern"));
static WWW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^www\.").expect("valid www pattern"));
static LEETCODE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^leetcode\.com/(u/)?").expect("valid leetcode pattern"));
static CODECHEF_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^codechef\.com/users/").expect("valid codechef pattern"));
static HACKERRANK_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^hackerrank\.com/(profile/)?").expect("valid hackerrank pattern")
});
static GITHUB_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^github\.com/").expect("valid github pattern"));

/// A cleaned handle: empty, or `[A-Za-z0-9_-]{1,39}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedHandle(String);

impl NormalizedHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty means the platform should be skipped
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn profile_prefix(platform: Platform) -> &'static Regex {
    match platform {
        Platform::Leetcode => &LEETCODE_PREFIX,
        Platform::Codechef => &CODECHEF_PREFIX,
        Platform::Hackerrank => &HACKERRANK_PREFIX,
        Platform::Github => &GITHUB_PREFIX,
    }
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Clean a raw handle for `platform`.
///
/// Strips scheme, `www.`, the platform's profile path and trailing slashes,
/// then drops characters outside `[A-Za-z0-9_-]`. Handles that are empty or
/// longer than [`MAX_HANDLE_LEN`] after stripping come back empty.
pub fn normalize(platform: Platform, raw: &str) -> NormalizedHandle {
    let cleaned = raw.trim();
    let cleaned = SCHEME.replace(cleaned, "");
    let cleaned = WWW.replace(&cleaned, "");
    let cleaned = profile_prefix(platform).replace(&cleaned, "");
    let cleaned = cleaned.trim_end_matches('/').trim();

    let len = cleaned.chars().count();
    if len == 0 || len > MAX_HANDLE_LEN {
        tracing::debug!(platform = %platform, raw = %raw, "Handle skipped after normalization");
        return NormalizedHandle::default();
    }

    NormalizedHandle(cleaned.chars().filter(|c| is_allowed(*c)).collect())
}
