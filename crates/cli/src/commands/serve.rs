//! Serve command - run the HTTP API

use anyhow::Result;

use crate::args::ServeArgs;
use crate::config::AppConfig;
use crate::server::{self, AppState};
use crate::wiring;

pub async fn execute(args: ServeArgs, config: AppConfig) -> Result<()> {
    let aggregator = wiring::build_aggregator(&config)?;
    let store = wiring::build_store(&config).await?;

    let listen_addr = args
        .listen
        .unwrap_or_else(|| config.server.listen_addr.clone());

    tracing::info!(
        provider = %config.upstream.provider,
        store = %config.general.store,
        platforms = ?aggregator.platforms(),
        "Starting devstats server"
    );

    server::serve(AppState::new(aggregator, store), &config.server, &listen_addr).await
}
