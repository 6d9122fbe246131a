//! GitHub adapter combining the REST API with the GraphQL contribution calendar

use async_trait::async_trait;
use devstats_domain::{
    FetchError, MonthlyProgress, NormalizedHandle, Platform, PlatformClient, PlatformStats,
    RawResponse, Submission, UNKNOWN_DIFFICULTY,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use time::UtcOffset;

use crate::extract::{from_value_or_default, lenient_u64, parse_date, parse_rfc3339, take_field};
use crate::http::{UpstreamSettings, build_client, check_status, read_json, transport_error};

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Public events turned into recent activity
const RECENT_EVENTS: usize = 10;

const CALENDAR_QUERY: &str = r#"
query contributionCalendar($login: String!) {
  user(login: $login) {
    contributionsCollection {
      contributionCalendar {
        totalContributions
        weeks { contributionDays { date contributionCount } }
      }
    }
  }
}
"#;

/// GitHub client; every call is authenticated with the configured token
pub struct GitHubClient {
    client: Client,
    token: SecretString,
    api_url: String,
    graphql_url: String,
    utc_offset: UtcOffset,
}

impl GitHubClient {
    pub fn new(settings: &UpstreamSettings, token: SecretString) -> Result<Self, reqwest::Error> {
        Self::with_urls(
            settings,
            token,
            DEFAULT_API_URL.to_string(),
            DEFAULT_GRAPHQL_URL.to_string(),
        )
    }

    pub fn with_urls(
        settings: &UpstreamSettings,
        token: SecretString,
        api_url: String,
        graphql_url: String,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_client(settings)?,
            token,
            api_url: api_url.trim_end_matches('/').to_string(),
            graphql_url,
            utc_offset: settings.utc_offset,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(
                "Authorization",
                format!("Bearer {}", self.token.expose_secret()),
            )
            .header("Accept", "application/vnd.github+json")
    }

    async fn send(
        &self,
        handle: &str,
        request: RequestBuilder,
    ) -> Result<serde_json::Value, FetchError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error(Platform::Github, e))?;

        if is_rate_limited(&response) {
            return Err(FetchError::RateLimited(
                "GitHub API rate limit exceeded, try again later".to_string(),
            ));
        }

        let response = check_status(Platform::Github, handle, response).await?;
        read_json(Platform::Github, response).await
    }

    async fn rest(&self, handle: &str, path: &str) -> Result<serde_json::Value, FetchError> {
        let url = format!("{}{}", self.api_url, path);
        self.send(handle, self.client.get(&url)).await
    }

    async fn contribution_calendar(&self, handle: &str) -> Result<serde_json::Value, FetchError> {
        let body = json!({ "query": CALENDAR_QUERY, "variables": { "login": handle } });
        let mut value = self
            .send(handle, self.client.post(&self.graphql_url).json(&body))
            .await?;

        let mut data = take_field(&mut value, "data");
        let mut user = take_field(&mut data, "user");
        if user.is_null() {
            return Err(FetchError::NotFound(format!(
                "GitHub user '{}' not found",
                handle
            )));
        }
        let mut collection = take_field(&mut user, "contributionsCollection");
        Ok(take_field(&mut collection, "contributionCalendar"))
    }
}

/// GitHub signals exhausted quotas with 403 plus a zero remaining header
fn is_rate_limited(response: &Response) -> bool {
    response.status() == StatusCode::FORBIDDEN
        && response
            .headers()
            .get("x-ratelimit-remaining")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim() == "0")
}

#[async_trait]
impl PlatformClient for GitHubClient {
    fn platform(&self) -> Platform {
        Platform::Github
    }

    async fn fetch_raw(&self, handle: &NormalizedHandle) -> Result<RawResponse, FetchError> {
        tracing::debug!(handle = %handle, "Fetching GitHub profile");
        let login = handle.as_str();

        let user_path = format!("/users/{}", login);
        let repos_path = format!("/users/{}/repos?per_page=100", login);
        let events_path = format!("/users/{}/events/public?per_page={}", login, RECENT_EVENTS);

        let (user, repos, events, calendar) = tokio::try_join!(
            self.rest(login, &user_path),
            self.rest(login, &repos_path),
            self.rest(login, &events_path),
            self.contribution_calendar(login),
        )?;

        Ok(RawResponse::Json(json!({
            "user": user,
            "repos": repos,
            "events": events,
            "calendar": calendar,
        })))
    }

    fn extract(&self, handle: &NormalizedHandle, raw: RawResponse) -> PlatformStats {
        let mut stats = PlatformStats::empty(Platform::Github, handle.as_str());
        let RawResponse::Json(mut value) = raw else {
            tracing::warn!("GitHub extractor received a non-JSON payload");
            return stats;
        };

        let user: User = from_value_or_default(take_field(&mut value, "user"), "github user");
        let repos: Vec<Repo> =
            from_value_or_default(take_field(&mut value, "repos"), "github repos");
        let events: Vec<Event> =
            from_value_or_default(take_field(&mut value, "events"), "github events");
        let calendar: Calendar =
            from_value_or_default(take_field(&mut value, "calendar"), "github calendar");

        stats.solved = calendar.total_contributions;
        stats.total = user.public_repos;
        stats.rating = repos
            .iter()
            .map(|r| r.stargazers_count)
            .sum::<u64>()
            .try_into()
            .unwrap_or(i64::MAX);

        stats.recent_submissions = events
            .into_iter()
            .take(RECENT_EVENTS)
            .filter_map(|event| {
                let timestamp = parse_rfc3339(&event.created_at)?.to_offset(self.utc_offset);
                Some(Submission {
                    problem: event.repo.name,
                    difficulty: UNKNOWN_DIFFICULTY.to_string(),
                    status: event.kind,
                    timestamp,
                })
            })
            .collect();

        let mut progress = MonthlyProgress::new();
        for day in calendar.weeks.iter().flat_map(|w| &w.contribution_days) {
            if let Some(date) = parse_date(&day.date) {
                progress.add(date.month(), day.contribution_count);
            }
        }
        stats.monthly_progress = progress;

        stats
    }
}

#[derive(Debug, Default, Deserialize)]
struct User {
    #[serde(default, deserialize_with = "lenient_u64")]
    public_repos: u64,
}

#[derive(Debug, Deserialize)]
struct Repo {
    #[serde(default, deserialize_with = "lenient_u64")]
    stargazers_count: u64,
}

#[derive(Debug, Deserialize)]
struct Event {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    repo: EventRepo,
    #[serde(default)]
    created_at: String,
}

#[derive(Debug, Default, Deserialize)]
struct EventRepo {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Calendar {
    #[serde(default, deserialize_with = "lenient_u64")]
    total_contributions: u64,
    #[serde(default)]
    weeks: Vec<Week>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Week {
    #[serde(default)]
    contribution_days: Vec<Day>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Day {
    #[serde(default)]
    date: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    contribution_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use devstats_domain::normalize;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GitHubClient {
        GitHubClient::with_urls(
            &UpstreamSettings::default(),
            SecretString::new("test-token".into()),
            server.uri(),
            format!("{}/graphql", server.uri()),
        )
        .unwrap()
    }

    fn handle(raw: &str) -> NormalizedHandle {
        normalize(Platform::Github, raw)
    }

    async fn mount_json(server: &MockServer, http_method: &str, at: &str, body: serde_json::Value) {
        Mock::given(method(http_method))
            .and(path(at))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_stats_success() {
        let server = MockServer::start().await;
        mount_json(&server, "GET", "/users/dave", json!({ "login": "dave", "public_repos": 12 }))
            .await;
        mount_json(
            &server,
            "GET",
            "/users/dave/repos",
            json!([{ "stargazers_count": 3 }, { "stargazers_count": 4 }]),
        )
        .await;
        mount_json(
            &server,
            "GET",
            "/users/dave/events/public",
            json!([
                { "type": "PushEvent", "repo": { "name": "dave/tool" }, "created_at": "2024-06-01T08:00:00Z" },
                { "type": "WatchEvent", "repo": { "name": "rust-lang/rust" }, "created_at": "2024-05-30T08:00:00Z" }
            ]),
        )
        .await;
        mount_json(
            &server,
            "POST",
            "/graphql",
            json!({ "data": { "user": { "contributionsCollection": { "contributionCalendar": {
                "totalContributions": 321,
                "weeks": [
                    { "contributionDays": [
                        { "date": "2024-05-31", "contributionCount": 2 },
                        { "date": "2024-06-01", "contributionCount": 5 }
                    ]}
                ]
            }}}}}),
        )
        .await;

        let stats = client(&server)
            .fetch_stats(&handle("https://github.com/dave"))
            .await
            .unwrap();

        assert_eq!(stats.username, "dave");
        assert_eq!(stats.solved, 321);
        assert_eq!(stats.total, 12);
        assert_eq!(stats.rating, 7);
        assert_eq!(stats.rank, "N/A");
        assert_eq!(stats.recent_submissions.len(), 2);
        assert_eq!(stats.recent_submissions[0].problem, "dave/tool");
        assert_eq!(stats.recent_submissions[0].status, "PushEvent");
        assert_eq!(stats.monthly_progress.get("May"), Some(2));
        assert_eq!(stats.monthly_progress.get("Jun"), Some(5));
    }

    #[tokio::test]
    async fn test_unknown_user_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        mount_json(&server, "POST", "/graphql", json!({ "data": { "user": null } })).await;

        let result = client(&server).fetch_stats(&handle("ghost")).await;

        assert!(matches!(result, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_exhausted_quota_is_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "0"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).insert_header("x-ratelimit-remaining", "0"))
            .mount(&server)
            .await;

        let result = client(&server).fetch_stats(&handle("dave")).await;

        assert!(matches!(result, Err(FetchError::RateLimited(_))));
    }

    #[tokio::test]
    async fn test_bad_token_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = client(&server).fetch_stats(&handle("dave")).await;

        assert!(matches!(result, Err(FetchError::Upstream(_))));
    }
}
