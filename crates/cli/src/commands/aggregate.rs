//! Aggregate command - fetch several platforms concurrently and merge

use anyhow::{Context, Result};
use devstats_domain::{Platform, PlatformIdentity};

use super::output;
use crate::args::AggregateArgs;
use crate::config::AppConfig;
use crate::wiring;

pub async fn execute(args: AggregateArgs, config: AppConfig) -> Result<()> {
    let aggregator = wiring::build_aggregator(&config)?;

    let identities = match &args.user {
        Some(user) => {
            let store = wiring::build_store(&config).await?;
            store
                .get_handles(user)
                .await
                .with_context(|| format!("Failed to load handles for '{}'", user))?
        }
        None => identities_from_flags(&args),
    };

    if identities.is_empty() {
        tracing::warn!("No platform handles given");
    }

    let result = aggregator.aggregate(&identities).await;

    if args.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialize output")?;
        println!("{}", json);
    } else {
        output::print_aggregate(&result);
    }

    Ok(())
}

fn identities_from_flags(args: &AggregateArgs) -> Vec<PlatformIdentity> {
    [
        (Platform::Leetcode, &args.leetcode),
        (Platform::Codechef, &args.codechef),
        (Platform::Hackerrank, &args.hackerrank),
        (Platform::Github, &args.github),
    ]
    .into_iter()
    .filter_map(|(platform, handle)| {
        handle
            .as_ref()
            .map(|h| PlatformIdentity::new(platform, h.clone()))
    })
    .collect()
}
