//! CLI argument definitions

use clap::{Args, Parser, Subcommand};
use devstats_domain::Platform;
use std::path::PathBuf;

/// devstats: aggregate coding-platform statistics into one view
#[derive(Parser, Debug)]
#[command(name = "devstats")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP API server
    Serve(ServeArgs),

    /// Fetch stats for a single platform handle
    Fetch(FetchArgs),

    /// Fetch every given platform concurrently and merge the results
    Aggregate(AggregateArgs),

    /// Manage stored platform handles per user
    Handles(HandlesArgs),

    /// Configuration management
    Config(ConfigArgs),

    /// Validate configuration and show status
    Doctor(DoctorArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the listen address (e.g. 127.0.0.1:5001)
    #[arg(long)]
    pub listen: Option<String>,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Platform (leetcode, codechef, hackerrank, github)
    pub platform: Platform,

    /// Handle or profile URL
    pub handle: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Default)]
pub struct AggregateArgs {
    #[arg(long)]
    pub leetcode: Option<String>,

    #[arg(long)]
    pub codechef: Option<String>,

    #[arg(long)]
    pub hackerrank: Option<String>,

    #[arg(long)]
    pub github: Option<String>,

    /// Use the handles stored for this user instead of flags
    #[arg(long, conflicts_with_all = ["leetcode", "codechef", "hackerrank", "github"])]
    pub user: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct HandlesArgs {
    #[command(subcommand)]
    pub command: HandlesCommands,
}

#[derive(Subcommand, Debug)]
pub enum HandlesCommands {
    /// Store the handle for one platform
    Set {
        user: String,
        platform: Platform,
        handle: String,
    },

    /// List the handles stored for a user
    List {
        user: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove the handle for one platform
    Remove { user: String, platform: Platform },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Generate example configuration file
    Init {
        /// Path to write config file
        #[arg(long, default_value = "./devstats.toml")]
        path: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
pub struct DoctorArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
