// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat platform read port.

use async_trait::async_trait;

use crate::error::{LeadhoundError, SourceError};
use crate::traits::adapter::PluginAdapter;
use crate::types::{AccountIdentity, ChannelInfo, RawMessage};

/// One page of channel history, newest first, strictly before `before`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPageRequest {
    pub channel_id: u64,
    /// Exclusive upper bound message id; `None` starts from the newest message.
    pub before: Option<u64>,
    pub limit: u16,
}

/// Read access to a chat platform for one account.
#[async_trait]
pub trait MessageSource: PluginAdapter {
    /// The account this source reads as.
    fn account(&self) -> &AccountIdentity;

    /// Lists every text channel the account can see.
    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, LeadhoundError>;

    /// Fetches one page of history, newest message first.
    async fn fetch_page(&self, request: HistoryPageRequest)
        -> Result<Vec<RawMessage>, SourceError>;
}
