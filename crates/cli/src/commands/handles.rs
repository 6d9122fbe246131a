//! Handles command - manage stored platform handles per user

use anyhow::{Context, Result, bail};
use devstats_domain::{HandleStore, Platform, PlatformIdentity, normalize};
use std::collections::BTreeMap;

use crate::args::{HandlesArgs, HandlesCommands};
use crate::config::AppConfig;
use crate::wiring;

pub async fn execute(args: HandlesArgs, config: AppConfig) -> Result<()> {
    let store = wiring::build_store(&config).await?;
    if config.general.store == "memory" {
        tracing::warn!("Handle store is in-memory; changes will not persist");
    }

    match args.command {
        HandlesCommands::Set {
            user,
            platform,
            handle,
        } => set(store.as_ref(), &user, platform, &handle).await,
        HandlesCommands::List { user, json } => list(store.as_ref(), &user, json).await,
        HandlesCommands::Remove { user, platform } => {
            remove(store.as_ref(), &user, platform).await
        }
    }
}

async fn set(store: &dyn HandleStore, user: &str, platform: Platform, raw: &str) -> Result<()> {
    let handle = normalize(platform, raw);
    if handle.is_empty() {
        bail!(
            "'{}' is not a valid {} username",
            raw,
            platform.display_name()
        );
    }

    store
        .set_handle(user, &PlatformIdentity::new(platform, handle.as_str()))
        .await
        .context("Failed to store handle")?;

    println!("Set {} handle for {}: {}", platform.display_name(), user, handle);
    Ok(())
}

async fn list(store: &dyn HandleStore, user: &str, json: bool) -> Result<()> {
    let identities = store
        .get_handles(user)
        .await
        .context("Failed to load handles")?;

    if json {
        let map: BTreeMap<Platform, String> = identities
            .into_iter()
            .map(|identity| (identity.platform, identity.handle))
            .collect();
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    if identities.is_empty() {
        println!("No handles stored for {}", user);
        return Ok(());
    }

    println!("Handles for {}:", user);
    for identity in identities {
        println!(
            "  {:<10} {}",
            identity.platform.as_str(),
            identity.handle
        );
    }
    Ok(())
}

async fn remove(store: &dyn HandleStore, user: &str, platform: Platform) -> Result<()> {
    let removed = store
        .remove_handle(user, platform)
        .await
        .context("Failed to remove handle")?;

    if removed {
        println!("Removed {} handle for {}", platform.display_name(), user);
    } else {
        println!("No {} handle stored for {}", platform.display_name(), user);
    }
    Ok(())
}
