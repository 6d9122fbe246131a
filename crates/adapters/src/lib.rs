//! devstats adapters crate
//!
//! This crate contains infrastructure adapters implementing the domain ports:
//! - `platforms`: upstream clients for LeetCode, CodeChef, HackerRank and GitHub,
//!   plus an offline stub
//! - `store`: SQLite and in-memory handle stores

mod extract;
mod http;

mod codechef;
mod github;
mod hackerrank;
mod leetcode;
mod stub;

mod store_memory;
mod store_sqlite;

pub use http::{DEFAULT_USER_AGENT, UpstreamSettings};

/// Re-exports for upstream platform clients
pub mod platforms {
    pub use crate::codechef::{CATALOG_SIZE, CodeChefClient};
    pub use crate::github::GitHubClient;
    pub use crate::hackerrank::{HackerRankClient, HackerRankStrategy};
    pub use crate::leetcode::LeetCodeClient;
    pub use crate::stub::StubPlatformClient;

    /// Default upstream locations
    pub mod defaults {
        pub const LEETCODE_GRAPHQL_URL: &str = crate::leetcode::DEFAULT_GRAPHQL_URL;
        pub const CODECHEF_BASE_URL: &str = crate::codechef::DEFAULT_BASE_URL;
        pub const HACKERRANK_BASE_URL: &str = crate::hackerrank::DEFAULT_BASE_URL;
        pub const GITHUB_API_URL: &str = crate::github::DEFAULT_API_URL;
        pub const GITHUB_GRAPHQL_URL: &str = crate::github::DEFAULT_GRAPHQL_URL;
    }
}

/// Re-exports for handle stores
pub mod store {
    pub use crate::store_memory::InMemoryHandleStore;
    pub use crate::store_sqlite::SqliteHandleStore;
}
