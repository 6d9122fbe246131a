//! CodeChef adapter scraping the public profile page

use async_trait::async_trait;
use devstats_domain::{
    Badge, FetchError, MonthlyProgress, NormalizedHandle, Platform, PlatformClient, PlatformStats,
    RawResponse, Submission, UNKNOWN_DIFFICULTY, UNKNOWN_RANK,
};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html};
use std::sync::LazyLock;
use time::UtcOffset;

use crate::extract::{first_int, parse_local_datetime, select_all, select_first, text_of};
use crate::http::{UpstreamSettings, build_client, check_status, read_text, transport_error};

pub const DEFAULT_BASE_URL: &str = "https://www.codechef.com";

/// Approximate size of the CodeChef problem catalog
pub const CATALOG_SIZE: u64 = 5000;

/// Submission rows read from the profile table
const RECENT_ROWS: usize = 10;

static PROGRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)\s*/\s*(\d+)").expect("valid progress pattern"));
static TOTAL_SOLVED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Total Problems Solved:\s*(\d+)").expect("valid solved pattern")
});

/// CodeChef client. There is no public API; stats come from profile markup.
pub struct CodeChefClient {
    client: Client,
    base_url: String,
    utc_offset: UtcOffset,
}

impl CodeChefClient {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, reqwest::Error> {
        Self::with_base_url(settings, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(
        settings: &UpstreamSettings,
        base_url: String,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(settings)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            utc_offset: settings.utc_offset,
        })
    }
}

#[async_trait]
impl PlatformClient for CodeChefClient {
    fn platform(&self) -> Platform {
        Platform::Codechef
    }

    async fn fetch_raw(&self, handle: &NormalizedHandle) -> Result<RawResponse, FetchError> {
        let url = format!("{}/users/{}", self.base_url, handle);
        tracing::debug!(url = %url, "Fetching CodeChef profile page");

        let response = self
            .client
            .get(&url)
            .header(
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header("Cache-Control", "no-cache")
            .send()
            .await
            .map_err(|e| transport_error(Platform::Codechef, e))?;

        let response = check_status(Platform::Codechef, handle.as_str(), response).await?;
        let body = read_text(Platform::Codechef, response).await?;

        if is_missing_profile(&body) {
            return Err(FetchError::NotFound(format!(
                "CodeChef user '{}' not found",
                handle
            )));
        }

        Ok(RawResponse::Html(body))
    }

    fn extract(&self, handle: &NormalizedHandle, raw: RawResponse) -> PlatformStats {
        let mut stats = PlatformStats::empty(Platform::Codechef, handle.as_str());
        stats.total = CATALOG_SIZE;

        let RawResponse::Html(body) = raw else {
            tracing::warn!("CodeChef extractor received a non-HTML payload");
            return stats;
        };

        let document = Html::parse_document(&body);
        let root = document.root_element();

        stats.rating = select_first(root, &[".rating-header .rating", ".rating-number"])
            .and_then(|e| first_int(&text_of(e)))
            .map(|r| r as i64)
            .unwrap_or(0);
        stats.rank = select_first(root, &[".rating-header .rank", ".rating-ranks strong"])
            .map(text_of)
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| UNKNOWN_RANK.to_string());
        stats.solved = solved_count(root, &body);
        stats.badges = badges(root);
        stats.recent_submissions = recent_submissions(root, self.utc_offset);
        stats.monthly_progress = accepted_by_month(&stats.recent_submissions);

        stats
    }
}

/// Error page, explicit error marker, or no profile container at all
fn is_missing_profile(body: &str) -> bool {
    if body.contains("Invalid username") {
        return true;
    }
    let document = Html::parse_document(body);
    let root = document.root_element();
    !select_all(root, ".error-message").is_empty()
        || select_all(root, ".user-details-container").is_empty()
}

/// Solved total, from the first layout that yields a count:
/// "Fully/Partially Solved" headers in `.problems-solved`, then any
/// "Problems Solved" header, then the raw "Total Problems Solved: N" text.
fn solved_count(root: ElementRef<'_>, body: &str) -> u64 {
    let section_counts: Vec<u64> = select_all(root, ".problems-solved")
        .into_iter()
        .flat_map(|section| select_all(section, "h5"))
        .filter(|header| {
            let text = text_of(*header);
            text.contains("Fully Solved") || text.contains("Partially Solved")
        })
        .filter_map(header_count)
        .collect();
    if !section_counts.is_empty() {
        return section_counts.into_iter().sum();
    }

    if let Some(count) = select_all(root, "h3, h5")
        .into_iter()
        .find(|h| text_of(*h).contains("Problems Solved"))
        .and_then(header_count)
    {
        return count;
    }

    TOTAL_SOLVED
        .captures(body)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0)
}

/// Count next to a section header: in the header itself, or in the following `.content`
fn header_count(header: ElementRef<'_>) -> Option<u64> {
    if let Some(count) = first_int(&text_of(header)) {
        return Some(count);
    }
    header
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find_map(|sibling| {
            if sibling.value().classes().any(|c| c == "content") {
                Some(sibling)
            } else {
                select_all(sibling, ".content").into_iter().next()
            }
        })
        .and_then(|content| first_int(&text_of(content)))
}

fn badges(root: ElementRef<'_>) -> Vec<Badge> {
    select_all(root, ".badge-card, .rating-data-section")
        .into_iter()
        .filter_map(|card| {
            let name = select_first(card, &[".badge-title, h4"]).map(text_of)?;
            if name.is_empty() {
                return None;
            }
            let level = select_first(card, &[".badge-level, .rating-star"])
                .map(text_of)
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "Beginner".to_string());
            let progress = select_first(card, &[".badge-progress, .problems-solved"])
                .map(text_of)
                .unwrap_or_default();
            let (solved, needed) = match PROGRESS.captures(&progress) {
                Some(caps) => (
                    caps[1].parse().unwrap_or(0),
                    caps[2].parse().unwrap_or(0),
                ),
                None => (first_int(&progress).unwrap_or(0), 0),
            };

            Some(Badge {
                name,
                level: Some(level),
                stars: None,
                solved,
                needed,
            })
        })
        .collect()
}

fn recent_submissions(root: ElementRef<'_>, offset: UtcOffset) -> Vec<Submission> {
    select_all(root, ".submissions-table tbody tr, .dataTable tbody tr")
        .into_iter()
        .take(RECENT_ROWS)
        .filter_map(|row| {
            let cells = select_all(row, "td");
            if cells.len() < 3 {
                return None;
            }
            let problem = select_first(cells[1], &["a"]).map(text_of).unwrap_or_default();
            if problem.is_empty() {
                return None;
            }
            let Some(timestamp) = parse_local_datetime(&text_of(cells[0]), offset) else {
                tracing::debug!(raw = %text_of(cells[0]), "Unparseable CodeChef submission time");
                return None;
            };
            let status = Some(text_of(cells[2]))
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Unknown".to_string());
            let difficulty = cells
                .get(3)
                .copied()
                .or_else(|| select_first(cells[1], &[".difficulty"]))
                .map(text_of)
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| UNKNOWN_DIFFICULTY.to_string());

            Some(Submission {
                problem,
                difficulty,
                status,
                timestamp,
            })
        })
        .collect()
}

/// Accepted submissions per month, from the rows that were scraped
fn accepted_by_month(submissions: &[Submission]) -> MonthlyProgress {
    let mut progress = MonthlyProgress::new();
    for submission in submissions {
        if submission.status.to_lowercase().contains("accepted") {
            progress.record(submission.timestamp, 1);
        }
    }
    progress
}
