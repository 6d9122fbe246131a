//! Fetch command - stats for one platform handle

use anyhow::{Context, Result};

use super::output;
use crate::args::FetchArgs;
use crate::config::AppConfig;
use crate::wiring;

pub async fn execute(args: FetchArgs, config: AppConfig) -> Result<()> {
    let aggregator = wiring::build_aggregator(&config)?;

    let stats = aggregator
        .fetch_one(args.platform, &args.handle)
        .await
        .with_context(|| {
            format!(
                "Failed to fetch {} stats for '{}'",
                args.platform.display_name(),
                args.handle
            )
        })?;

    if args.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        output::print_stats(&stats);
    }

    Ok(())
}
