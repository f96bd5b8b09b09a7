// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message driver for live mode: filter, classify, record immediately.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use leadhound_config::model::DiscordConfig;
use leadhound_core::{Discovery, IncomingMessage, LeadhoundError, SourceMode};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::classifier::Classifier;
use crate::filter::KeywordFilter;
use crate::recorder::{RecordOutcome, Recorder};

/// How long in-flight messages may run after shutdown is requested.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

/// Which channels live mode listens to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelScope {
    track_all: bool,
    whitelist: HashSet<u64>,
}

impl ChannelScope {
    pub fn all() -> Self {
        Self {
            track_all: true,
            whitelist: HashSet::new(),
        }
    }

    pub fn only(channels: impl IntoIterator<Item = u64>) -> Self {
        Self {
            track_all: false,
            whitelist: channels.into_iter().collect(),
        }
    }

    pub fn from_config(discord: &DiscordConfig) -> Self {
        if discord.track_all_channels {
            Self::all()
        } else {
            Self::only(discord.channel_whitelist.iter().copied())
        }
    }

    pub fn admits(&self, channel_id: u64) -> bool {
        self.track_all || self.whitelist.contains(&channel_id)
    }
}

/// What happened to one live message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveOutcome {
    OutOfScope,
    NoKeyword,
    Recorded(RecordOutcome),
}

/// Counters for one [`LivePipeline::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LiveSummary {
    pub received: u64,
    pub recorded: u64,
    pub failed: u64,
}

pub struct LivePipeline {
    filter: Arc<KeywordFilter>,
    classifier: Arc<Classifier>,
    recorder: Arc<Recorder>,
    scope: ChannelScope,
}

impl LivePipeline {
    pub fn new(
        filter: Arc<KeywordFilter>,
        classifier: Arc<Classifier>,
        recorder: Arc<Recorder>,
        scope: ChannelScope,
    ) -> Self {
        Self {
            filter,
            classifier,
            recorder,
            scope,
        }
    }

    /// Processes one message to completion.
    pub async fn handle(&self, incoming: IncomingMessage) -> Result<LiveOutcome, LeadhoundError> {
        let IncomingMessage {
            mut message,
            received_by,
        } = incoming;

        if !self.scope.admits(message.channel_id) {
            return Ok(LiveOutcome::OutOfScope);
        }
        if !self.filter.is_relevant(&mut message) {
            return Ok(LiveOutcome::NoKeyword);
        }
        debug!(
            msg_id = message.id,
            channel = %message.channel_name,
            keyword = message.keyword.as_deref().unwrap_or_default(),
            "keyword match"
        );

        let discovery = Discovery::new(received_by, SourceMode::Live);
        let opportunity = self.classifier.classify(message, &discovery).await;
        let outcome = self.recorder.record(&opportunity).await?;
        Ok(LiveOutcome::Recorded(outcome))
    }

    /// Consumes `messages` until the sender side closes or `shutdown` fires.
    ///
    /// Each message runs in its own task. A failure is logged and never stops
    /// the loop. On exit, tasks still in flight get [`DRAIN_TIMEOUT`] to finish.
    pub async fn run(
        self: Arc<Self>,
        mut messages: mpsc::Receiver<IncomingMessage>,
        shutdown: CancellationToken,
    ) -> LiveSummary {
        let mut summary = LiveSummary::default();
        let mut tasks = JoinSet::new();
        info!("live pipeline running");

        loop {
            tokio::select! {
                incoming = messages.recv() => {
                    let Some(incoming) = incoming else {
                        info!("all listeners closed, stopping live pipeline");
                        break;
                    };
                    summary.received += 1;
                    let pipeline = self.clone();
                    tasks.spawn(async move { pipeline.handle(incoming).await });
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    tally(&mut summary, joined);
                }
                _ = shutdown.cancelled() => {
                    info!("shutdown signal received, stopping live pipeline");
                    break;
                }
            }
        }

        if !tasks.is_empty() {
            info!(count = tasks.len(), "waiting for in-flight messages");
        }
        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while let Some(joined) = tasks.join_next().await {
                tally(&mut summary, joined);
            }
        })
        .await;
        if drained.is_err() {
            warn!(abandoned = tasks.len(), "drain timeout exceeded");
            tasks.abort_all();
        }

        info!(
            received = summary.received,
            recorded = summary.recorded,
            failed = summary.failed,
            "live pipeline stopped"
        );
        summary
    }
}

fn tally(
    summary: &mut LiveSummary,
    joined: Result<Result<LiveOutcome, LeadhoundError>, tokio::task::JoinError>,
) {
    match joined {
        Ok(Ok(LiveOutcome::Recorded(RecordOutcome::Duplicate))) => {}
        Ok(Ok(LiveOutcome::Recorded(_))) => summary.recorded += 1,
        Ok(Ok(_)) => {}
        Ok(Err(e)) => {
            summary.failed += 1;
            error!(error = %e, "failed to record live message");
        }
        Err(e) => {
            summary.failed += 1;
            error!(error = %e, "live message task did not complete");
        }
    }
}
