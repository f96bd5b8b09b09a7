// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted message source.

use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use leadhound_core::{
    AccountIdentity, AdapterType, ChannelInfo, HealthStatus, HistoryPageRequest, LeadhoundError,
    MessageSource, PluginAdapter, RawMessage, SourceError,
};

/// A failure to return instead of a page.
#[derive(Debug, Clone)]
pub enum ScriptedFailure {
    RateLimited(Option<Duration>),
    Forbidden,
    Transport(String),
}

impl ScriptedFailure {
    fn to_error(&self, channel_id: u64) -> SourceError {
        match self {
            ScriptedFailure::RateLimited(retry_after) => SourceError::RateLimited {
                retry_after: *retry_after,
            },
            ScriptedFailure::Forbidden => SourceError::Forbidden { channel_id },
            ScriptedFailure::Transport(message) => SourceError::Transport {
                message: message.clone(),
                source: None,
            },
        }
    }
}

#[derive(Default)]
struct State {
    /// Newest-first history per channel.
    histories: HashMap<u64, Vec<RawMessage>>,
    /// One-shot failures consumed before pages are served.
    scripted: HashMap<u64, VecDeque<ScriptedFailure>>,
    forbidden: HashSet<u64>,
    requests: Vec<HistoryPageRequest>,
}

/// A [`MessageSource`] serving in-memory channel histories.
///
/// Pages honour the `before` cursor and `limit` like the real platform.
pub struct MockSource {
    account: AccountIdentity,
    channels: Vec<ChannelInfo>,
    state: Mutex<State>,
}

impl MockSource {
    pub fn new(account: AccountIdentity) -> Self {
        Self {
            account,
            channels: Vec::new(),
            state: Mutex::new(State::default()),
        }
    }

    /// Adds a channel with its newest-first history.
    pub fn with_channel(mut self, channel: ChannelInfo, history: Vec<RawMessage>) -> Self {
        let id = channel.id;
        self.channels.push(channel);
        self.state.get_mut().histories.insert(id, history);
        self
    }

    /// Every page request for the channel fails with `Forbidden`.
    pub fn with_forbidden(mut self, channel_id: u64) -> Self {
        self.state.get_mut().forbidden.insert(channel_id);
        self
    }

    /// Queues one-shot failures returned before any page is served.
    pub async fn script_failures(
        &self,
        channel_id: u64,
        failures: impl IntoIterator<Item = ScriptedFailure>,
    ) {
        self.state
            .lock()
            .await
            .scripted
            .entry(channel_id)
            .or_default()
            .extend(failures);
    }

    /// Page requests made so far, in order.
    pub async fn requests(&self) -> Vec<HistoryPageRequest> {
        self.state.lock().await.requests.clone()
    }

    pub async fn request_count(&self, channel_id: u64) -> usize {
        self.state
            .lock()
            .await
            .requests
            .iter()
            .filter(|r| r.channel_id == channel_id)
            .count()
    }
}

#[async_trait]
impl PluginAdapter for MockSource {
    fn name(&self) -> &str {
        "mock-source"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadhoundError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl MessageSource for MockSource {
    fn account(&self) -> &AccountIdentity {
        &self.account
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, LeadhoundError> {
        Ok(self.channels.clone())
    }

    async fn fetch_page(&self, request: HistoryPageRequest) -> Result<Vec<RawMessage>, SourceError> {
        let mut state = self.state.lock().await;
        state.requests.push(request);

        if state.forbidden.contains(&request.channel_id) {
            return Err(SourceError::Forbidden {
                channel_id: request.channel_id,
            });
        }
        if let Some(failure) = state
            .scripted
            .get_mut(&request.channel_id)
            .and_then(VecDeque::pop_front)
        {
            return Err(failure.to_error(request.channel_id));
        }

        let page = state
            .histories
            .get(&request.channel_id)
            .map(|history| {
                history
                    .iter()
                    .filter(|m| request.before.is_none_or(|before| m.id < before))
                    .take(usize::from(request.limit))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(page)
    }
}
