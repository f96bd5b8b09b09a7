// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Leadhound message pipeline.
//!
//! Keyword filtering, rate-limited history crawling, two-stage
//! classification, deduplication, and recording, composed into the
//! [`BackfillOrchestrator`] and [`LivePipeline`] drivers. Everything here
//! talks to the outside world only through the ports in `leadhound-core`.

pub mod backfill;
pub mod classifier;
pub mod crawler;
pub mod dedup;
pub mod filter;
pub mod live;
pub mod rate_limit;
pub mod recorder;
pub mod shutdown;

pub use backfill::{BackfillOrchestrator, BackfillPhase, BackfillPorts, BackfillReport, BackfillSettings};
pub use classifier::Classifier;
pub use crawler::{ChannelCrawler, CrawlEnd, CrawlSettings, HistoryCursor};
pub use dedup::Deduplicator;
pub use filter::KeywordFilter;
pub use live::{ChannelScope, LiveOutcome, LivePipeline, LiveSummary};
pub use rate_limit::RateLimiter;
pub use recorder::{BatchOutcome, RecordOutcome, Recorder};
pub use shutdown::install_signal_handler;
