// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `leadhound live` command implementation.
//!
//! Starts one gateway listener per configured account. All listeners feed a
//! single bounded queue drained by the live pipeline. SIGINT or SIGTERM
//! stops the listeners and drains in-flight messages.

use std::sync::Arc;

use leadhound_config::LeadhoundConfig;
use leadhound_core::LeadhoundError;
use leadhound_discord::run_listener;
use leadhound_pipeline::{ChannelScope, LivePipeline, install_signal_handler};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::wiring::Pipeline;

/// Messages buffered between the listeners and the pipeline.
const INBOUND_CAPACITY: usize = 100;

pub async fn run_live(config: LeadhoundConfig) -> Result<(), LeadhoundError> {
    if config.discord.accounts.is_empty() {
        return Err(LeadhoundError::Config(
            "no discord accounts configured".to_string(),
        ));
    }
    let stages = Pipeline::build(&config).await?;
    let scope = ChannelScope::from_config(&config.discord);
    if !config.discord.track_all_channels {
        info!(
            channels = config.discord.channel_whitelist.len(),
            "listening to whitelisted channels only"
        );
    }
    let pipeline = Arc::new(LivePipeline::new(
        stages.filter,
        stages.classifier,
        stages.recorder,
        scope,
    ));

    let shutdown = install_signal_handler();
    let (tx, rx) = mpsc::channel(INBOUND_CAPACITY);
    let mut listeners = JoinSet::new();
    for account in config.discord.accounts.iter().cloned() {
        let tx = tx.clone();
        let token = shutdown.clone();
        listeners.spawn(async move {
            if let Err(e) = run_listener(&account, tx, token).await {
                error!(account = %account.name, error = %e, "listener stopped");
            }
        });
    }
    drop(tx);
    info!(accounts = config.discord.accounts.len(), "live mode started");

    let summary = pipeline.run(rx, shutdown.clone()).await;
    shutdown.cancel();
    while let Some(joined) = listeners.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "listener task did not complete");
        }
    }

    stages.store.checkpoint().await?;
    info!(
        received = summary.received,
        recorded = summary.recorded,
        failed = summary.failed,
        "live mode stopped"
    );
    Ok(())
}
