// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Paginated, backoff-aware history reader for one channel.
//!
//! [`ChannelCrawler::crawl`] returns a [`HistoryCursor`]: a pull-based,
//! per-channel iterator. Each page is fetched only when the previous one is
//! drained, every fetch passes the shared [`RateLimiter`], and the reason the
//! crawl stopped is reported as data through [`HistoryCursor::end`].

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use leadhound_config::model::DiscordConfig;
use leadhound_core::{
    ChannelInfo, HistoryPageRequest, Message, MessageSource, RawMessage, RetryDecision,
    RetryError, RetryPolicy, SourceError, retry_with_backoff,
};
use tracing::{debug, error, warn};

use crate::rate_limit::RateLimiter;

/// Paging and rate-limit handling knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrawlSettings {
    pub page_limit: u16,
    /// Attempts per page; the channel is abandoned after this many
    /// consecutive rate-limit responses.
    pub max_retries: u32,
    /// Wait used when the platform omits retry-after.
    pub retry_fallback: Duration,
    /// Added to every rate-limit wait.
    pub retry_margin: Duration,
}

impl CrawlSettings {
    pub fn from_config(discord: &DiscordConfig) -> Self {
        Self {
            page_limit: discord.message_page_limit,
            max_retries: discord.max_retries,
            retry_fallback: discord.retry_fallback(),
            retry_margin: discord.retry_margin(),
        }
    }
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self::from_config(&DiscordConfig::default())
    }
}

/// Why a crawl stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlEnd {
    /// The platform returned an empty page.
    Exhausted,
    /// A message at or before the start timestamp was reached.
    ReachedStart,
    /// The account may not read this channel.
    Forbidden,
    /// Rate limited on every allowed attempt for one page.
    RateLimited { attempts: u32 },
    /// Any other fetch failure.
    Failed(String),
}

impl CrawlEnd {
    /// True when the crawl stopped because history ran out, not because of an error.
    pub fn is_complete(&self) -> bool {
        matches!(self, CrawlEnd::Exhausted | CrawlEnd::ReachedStart)
    }
}

impl fmt::Display for CrawlEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlEnd::Exhausted => f.write_str("history exhausted"),
            CrawlEnd::ReachedStart => f.write_str("reached start timestamp"),
            CrawlEnd::Forbidden => f.write_str("permission denied"),
            CrawlEnd::RateLimited { attempts } => {
                write!(f, "rate limited on {attempts} consecutive attempts")
            }
            CrawlEnd::Failed(reason) => write!(f, "fetch failed: {reason}"),
        }
    }
}

/// Creates history cursors sharing one source, rate limiter, and settings.
#[derive(Clone)]
pub struct ChannelCrawler {
    source: Arc<dyn MessageSource>,
    limiter: Arc<RateLimiter>,
    settings: CrawlSettings,
}

impl ChannelCrawler {
    pub fn new(
        source: Arc<dyn MessageSource>,
        limiter: Arc<RateLimiter>,
        settings: CrawlSettings,
    ) -> Self {
        Self {
            source,
            limiter,
            settings,
        }
    }

    /// Reads `channel` from its newest message back to, but excluding,
    /// messages at or before `start`.
    pub fn crawl(&self, channel: ChannelInfo, start: DateTime<Utc>) -> HistoryCursor<'_> {
        HistoryCursor {
            crawler: self,
            channel,
            start,
            before: None,
            buffer: VecDeque::new(),
            end: None,
            pages: 0,
        }
    }

    async fn fetch(
        &self,
        request: HistoryPageRequest,
    ) -> Result<Vec<RawMessage>, RetryError<SourceError>> {
        let (fallback, margin) = (self.settings.retry_fallback, self.settings.retry_margin);
        let policy = RetryPolicy::new(self.settings.max_retries, fallback, fallback);
        let source = &self.source;
        let limiter = &self.limiter;

        retry_with_backoff(
            policy,
            move || async move {
                limiter.acquire().await;
                source.fetch_page(request).await
            },
            move |err| match err {
                SourceError::RateLimited { retry_after } => {
                    RetryDecision::RetryAfter(retry_after.unwrap_or(fallback) + margin)
                }
                _ if err.is_transient() => RetryDecision::Backoff,
                _ => RetryDecision::Abort,
            },
        )
        .await
    }
}

/// Lazy, newest-first message sequence for one channel.
pub struct HistoryCursor<'a> {
    crawler: &'a ChannelCrawler,
    channel: ChannelInfo,
    start: DateTime<Utc>,
    before: Option<u64>,
    buffer: VecDeque<Message>,
    end: Option<CrawlEnd>,
    pages: u32,
}

impl HistoryCursor<'_> {
    /// Next message, fetching another page when needed. `None` once the
    /// crawl has ended; see [`end`](Self::end) for why.
    pub async fn next(&mut self) -> Option<Message> {
        loop {
            if let Some(message) = self.buffer.pop_front() {
                return Some(message);
            }
            if self.end.is_some() {
                return None;
            }
            self.fill().await;
        }
    }

    /// Why the crawl stopped, once it has.
    pub fn end(&self) -> Option<&CrawlEnd> {
        self.end.as_ref()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages
    }

    /// Drains the cursor, returning every message and the end reason.
    pub async fn collect(mut self) -> (Vec<Message>, CrawlEnd) {
        let mut messages = Vec::new();
        while let Some(message) = self.next().await {
            messages.push(message);
        }
        let end = self.end.unwrap_or(CrawlEnd::Exhausted);
        (messages, end)
    }

    async fn fill(&mut self) {
        let request = HistoryPageRequest {
            channel_id: self.channel.id,
            before: self.before,
            limit: self.crawler.settings.page_limit,
        };

        let page = match self.crawler.fetch(request).await {
            Ok(page) => page,
            Err(err) => {
                self.end = Some(self.classify_failure(err));
                return;
            }
        };
        self.pages += 1;
        debug!(
            channel_id = self.channel.id,
            page = self.pages,
            size = page.len(),
            "fetched history page"
        );

        if page.is_empty() {
            self.end = Some(CrawlEnd::Exhausted);
            return;
        }
        self.before = page.iter().map(|m| m.id).min();

        for raw in page {
            if raw.timestamp <= self.start {
                self.end = Some(CrawlEnd::ReachedStart);
                break;
            }
            if let Some(message) = self.channel.to_message(raw) {
                self.buffer.push_back(message);
            }
        }
    }

    fn classify_failure(&self, err: RetryError<SourceError>) -> CrawlEnd {
        let channel_id = self.channel.id;
        match err {
            RetryError::Exhausted { attempts, last } => {
                warn!(channel_id, attempts, error = %last, "giving up on rate-limited channel");
                CrawlEnd::RateLimited { attempts }
            }
            RetryError::Aborted(SourceError::Forbidden { .. }) => {
                warn!(channel_id, channel = %self.channel.name, "no permission to read history, skipping channel");
                CrawlEnd::Forbidden
            }
            RetryError::Aborted(other) => {
                error!(channel_id, error = %other, "history fetch failed, skipping channel");
                CrawlEnd::Failed(other.to_string())
            }
        }
    }
}
