//! Configuration loading and management

use anyhow::{Context, Result};
use devstats_adapters::platforms::{HackerRankStrategy, defaults};
use devstats_adapters::{DEFAULT_USER_AGENT, UpstreamSettings};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use time::UtcOffset;

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub leetcode: LeetCodeConfig,

    #[serde(default)]
    pub codechef: CodeChefConfig,

    #[serde(default)]
    pub hackerrank: HackerRankConfig,

    #[serde(default)]
    pub github: GitHubConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Handle store backend: memory or sqlite
    #[serde(default = "default_store")]
    pub store: String,

    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// live or stub
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Offset used when bucketing activity into months
    #[serde(default)]
    pub utc_offset_minutes: i32,

    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeetCodeConfig {
    #[serde(default = "default_leetcode_graphql_url")]
    pub graphql_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeChefConfig {
    #[serde(default = "default_codechef_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HackerRankConfig {
    #[serde(default = "default_hackerrank_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub strategy: HackerRankStrategy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,

    #[serde(default = "default_github_graphql_url")]
    pub graphql_url: String,

    #[serde(default = "default_github_token_env")]
    pub token_env: String,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_store() -> String {
    "memory".to_string()
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./devstats.sqlite")
}

fn default_listen_addr() -> String {
    "127.0.0.1:5001".to_string()
}

fn default_allowed_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://127.0.0.1:3000",
        "http://localhost:5001",
        "http://localhost:5002",
        "http://localhost:5173",
        "http://127.0.0.1:5173",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_provider() -> String {
    "live".to_string()
}

fn default_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_recent_limit() -> usize {
    5
}

fn default_leetcode_graphql_url() -> String {
    defaults::LEETCODE_GRAPHQL_URL.to_string()
}

fn default_codechef_base_url() -> String {
    defaults::CODECHEF_BASE_URL.to_string()
}

fn default_hackerrank_base_url() -> String {
    defaults::HACKERRANK_BASE_URL.to_string()
}

fn default_github_api_url() -> String {
    defaults::GITHUB_API_URL.to_string()
}

fn default_github_graphql_url() -> String {
    defaults::GITHUB_GRAPHQL_URL.to_string()
}

fn default_github_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            store: default_store(),
            store_path: default_store_path(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            allowed_origins: default_allowed_origins(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
            utc_offset_minutes: 0,
            recent_limit: default_recent_limit(),
        }
    }
}

impl Default for LeetCodeConfig {
    fn default() -> Self {
        Self {
            graphql_url: default_leetcode_graphql_url(),
        }
    }
}

impl Default for CodeChefConfig {
    fn default() -> Self {
        Self {
            base_url: default_codechef_base_url(),
        }
    }
}

impl Default for HackerRankConfig {
    fn default() -> Self {
        Self {
            base_url: default_hackerrank_base_url(),
            strategy: HackerRankStrategy::default(),
        }
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            graphql_url: default_github_graphql_url(),
            token_env: default_github_token_env(),
        }
    }
}

impl UpstreamConfig {
    /// Client settings derived from this section
    pub fn settings(&self) -> Result<UpstreamSettings> {
        let out_of_range = || {
            format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )
        };
        let seconds = self
            .utc_offset_minutes
            .checked_mul(60)
            .with_context(out_of_range)?;
        let utc_offset = UtcOffset::from_whole_seconds(seconds).with_context(out_of_range)?;

        Ok(UpstreamSettings {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            utc_offset,
        })
    }
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        // Try default config path if none specified
        let default_path = PathBuf::from("./devstats.toml");
        let path = config_path.unwrap_or(&default_path);

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        } else if config_path.is_some() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DEVSTATS")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Generate example configuration as TOML string
    pub fn example_toml() -> String {
        r#"# devstats configuration

[general]
log_level = "info"
store = "memory"  # memory, sqlite
store_path = "./devstats.sqlite"

[server]
listen_addr = "127.0.0.1:5001"
allowed_origins = [
    "http://localhost:3000",
    "http://127.0.0.1:3000",
    "http://localhost:5001",
    "http://localhost:5002",
    "http://localhost:5173",
    "http://127.0.0.1:5173",
]

[upstream]
provider = "live"  # live, stub
timeout_secs = 10
# user_agent = "Mozilla/5.0 ..."
# Month buckets use this offset from UTC
utc_offset_minutes = 0
recent_limit = 5

[leetcode]
graphql_url = "https://leetcode.com/graphql"

[codechef]
base_url = "https://www.codechef.com"

[hackerrank]
base_url = "https://www.hackerrank.com"
strategy = "rest"  # rest (falls back to scrape), scrape

[github]
api_url = "https://api.github.com"
graphql_url = "https://api.github.com/graphql"
token_env = "GITHUB_TOKEN"
"#
        .to_string()
    }
}
