// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-off history scan across every active channel.
//!
//! The run moves through discovery, bounded per-channel processing
//! (crawl, filter, dedup, classify), aggregation, and one batch record.
//! Channel failures are counted in the [`BackfillReport`] and never stop
//! sibling channels. A failed channel listing ends the run early, still with
//! a report.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::future::join_all;
use leadhound_config::LeadhoundConfig;
use leadhound_core::{
    ChannelInfo, Discovery, LeadhoundError, MessageSource, Opportunity, OpportunityStore,
    SourceMode,
};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::classifier::Classifier;
use crate::crawler::{ChannelCrawler, CrawlEnd, CrawlSettings};
use crate::dedup::Deduplicator;
use crate::filter::KeywordFilter;
use crate::rate_limit::RateLimiter;
use crate::recorder::Recorder;

/// Default number of channels processed at once.
pub const DEFAULT_CONCURRENT_CHANNELS: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BackfillSettings {
    pub history_days: u32,
    pub concurrent_channels: usize,
    pub crawl: CrawlSettings,
}

impl BackfillSettings {
    pub fn from_config(config: &LeadhoundConfig) -> Self {
        Self {
            history_days: config.backfill.history_days,
            concurrent_channels: config.discord.concurrent_channels,
            crawl: CrawlSettings::from_config(&config.discord),
        }
    }
}

impl Default for BackfillSettings {
    fn default() -> Self {
        Self {
            history_days: 7,
            concurrent_channels: DEFAULT_CONCURRENT_CHANNELS,
            crawl: CrawlSettings::default(),
        }
    }
}

/// Collaborators shared by every channel task.
pub struct BackfillPorts {
    pub source: Arc<dyn MessageSource>,
    pub store: Arc<dyn OpportunityStore>,
    pub filter: Arc<KeywordFilter>,
    pub classifier: Arc<Classifier>,
    pub limiter: Arc<RateLimiter>,
    pub recorder: Arc<Recorder>,
}

/// Summary of one backfill run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackfillReport {
    pub account: String,
    pub channels_discovered: usize,
    /// Channels without activity inside the lookback window.
    pub channels_skipped: usize,
    pub channels_succeeded: usize,
    /// Channels whose task errored or panicked.
    pub channels_failed: usize,
    /// Channels whose crawl stopped early (permission, rate limit, transport).
    pub channels_aborted: usize,
    pub messages_scanned: usize,
    pub keyword_matches: usize,
    pub duplicates_skipped: usize,
    pub opportunities_found: usize,
    pub opportunities_inserted: usize,
    pub classification_calls: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Set when channel discovery failed and nothing was crawled.
    pub listing_error: Option<String>,
    /// Set when the final batch record failed.
    pub record_error: Option<String>,
}

impl BackfillReport {
    fn new(account: String, started_at: DateTime<Utc>) -> Self {
        Self {
            account,
            channels_discovered: 0,
            channels_skipped: 0,
            channels_succeeded: 0,
            channels_failed: 0,
            channels_aborted: 0,
            messages_scanned: 0,
            keyword_matches: 0,
            duplicates_skipped: 0,
            opportunities_found: 0,
            opportunities_inserted: 0,
            classification_calls: 0,
            started_at,
            finished_at: started_at,
            listing_error: None,
            record_error: None,
        }
    }
}

/// Current step of a run, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackfillPhase {
    DiscoverChannels,
    PerChannel,
    Aggregate,
    BatchRecord,
    Done,
}

impl fmt::Display for BackfillPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackfillPhase::DiscoverChannels => "discover_channels",
            BackfillPhase::PerChannel => "per_channel",
            BackfillPhase::Aggregate => "aggregate",
            BackfillPhase::BatchRecord => "batch_record",
            BackfillPhase::Done => "done",
        })
    }
}

enum State {
    DiscoverChannels,
    PerChannel(Vec<ChannelInfo>),
    Aggregate(Vec<ChannelRun>),
    BatchRecord(Vec<Opportunity>),
    Done,
}

impl State {
    fn phase(&self) -> BackfillPhase {
        match self {
            State::DiscoverChannels => BackfillPhase::DiscoverChannels,
            State::PerChannel(_) => BackfillPhase::PerChannel,
            State::Aggregate(_) => BackfillPhase::Aggregate,
            State::BatchRecord(_) => BackfillPhase::BatchRecord,
            State::Done => BackfillPhase::Done,
        }
    }
}

/// What one channel task produced.
#[derive(Debug)]
struct ChannelRun {
    /// Unknown when the task panicked.
    channel_id: Option<u64>,
    outcome: Result<ChannelYield, String>,
}

#[derive(Debug)]
struct ChannelYield {
    scanned: usize,
    matches: usize,
    duplicates: usize,
    opportunities: Vec<Opportunity>,
    end: CrawlEnd,
}

/// Per-channel crawl, filter, dedup, and classify.
struct ChannelWorker {
    store: Arc<dyn OpportunityStore>,
    crawler: ChannelCrawler,
    filter: Arc<KeywordFilter>,
    dedup: Deduplicator,
    classifier: Arc<Classifier>,
    discovery: Discovery,
}

impl ChannelWorker {
    async fn process(
        &self,
        channel: ChannelInfo,
        cutoff: DateTime<Utc>,
    ) -> Result<ChannelYield, LeadhoundError> {
        let channel_id = channel.id;
        let start = match self.store.latest_seen_timestamp(channel_id).await? {
            Some(seen) if seen > cutoff => seen,
            _ => cutoff,
        };
        debug!(channel_id, channel = %channel.name, %start, "crawling channel");

        let mut cursor = self.crawler.crawl(channel, start);
        let mut scanned = 0;
        let mut candidates = Vec::new();
        while let Some(mut message) = cursor.next().await {
            scanned += 1;
            if self.filter.is_relevant(&mut message) {
                candidates.push(message);
            }
        }
        let end = cursor.end().cloned().unwrap_or(CrawlEnd::Exhausted);

        let matches = candidates.len();
        let fresh = self.dedup.filter_new(candidates).await?;
        let duplicates = matches - fresh.len();

        let opportunities = join_all(
            fresh
                .into_iter()
                .map(|message| self.classifier.classify(message, &self.discovery)),
        )
        .await;

        info!(
            channel_id,
            scanned,
            matches,
            duplicates,
            opportunities = opportunities.len(),
            end = %end,
            "channel processed"
        );
        Ok(ChannelYield {
            scanned,
            matches,
            duplicates,
            opportunities,
            end,
        })
    }
}

/// Drives one backfill run for one account.
pub struct BackfillOrchestrator {
    source: Arc<dyn MessageSource>,
    classifier: Arc<Classifier>,
    recorder: Arc<Recorder>,
    worker: Arc<ChannelWorker>,
    settings: BackfillSettings,
}

impl BackfillOrchestrator {
    pub fn new(ports: BackfillPorts, settings: BackfillSettings) -> Self {
        let discovery = Discovery::new(ports.source.account().clone(), SourceMode::Backfill);
        let worker = ChannelWorker {
            store: ports.store.clone(),
            crawler: ChannelCrawler::new(ports.source.clone(), ports.limiter, settings.crawl),
            filter: ports.filter,
            dedup: Deduplicator::new(ports.store),
            classifier: ports.classifier.clone(),
            discovery,
        };
        Self {
            source: ports.source,
            classifier: ports.classifier,
            recorder: ports.recorder,
            worker: Arc::new(worker),
            settings,
        }
    }

    /// Runs to completion and reports what happened. Every failure,
    /// including a failed channel listing, ends up in the report.
    pub async fn run(&self) -> BackfillReport {
        let started_at = Utc::now();
        let cutoff = lookback_cutoff(started_at, self.settings.history_days);
        let calls_before = self.classifier.calls();
        let mut report = BackfillReport::new(self.source.account().name.clone(), started_at);
        info!(
            account = %report.account,
            history_days = self.settings.history_days,
            %cutoff,
            "backfill started"
        );

        let mut state = State::DiscoverChannels;
        loop {
            debug!(phase = %state.phase(), "backfill phase");
            state = match state {
                State::DiscoverChannels => match self.discover(cutoff, &mut report).await {
                    Ok(channels) => State::PerChannel(channels),
                    Err(e) => {
                        error!(account = %report.account, error = %e, "channel listing failed");
                        report.listing_error = Some(e.to_string());
                        State::Done
                    }
                },
                State::PerChannel(channels) => {
                    State::Aggregate(self.process_channels(channels, cutoff).await)
                }
                State::Aggregate(runs) => State::BatchRecord(aggregate(runs, &mut report)),
                State::BatchRecord(opportunities) => {
                    report.opportunities_found = opportunities.len();
                    match self.recorder.record_batch(&opportunities).await {
                        Ok(outcome) => report.opportunities_inserted = outcome.inserted,
                        Err(e) => {
                            error!(error = %e, "batch record failed");
                            report.record_error = Some(e.to_string());
                        }
                    }
                    State::Done
                }
                State::Done => break,
            };
        }

        report.classification_calls = self.classifier.calls().saturating_sub(calls_before);
        report.finished_at = Utc::now();
        info!(
            account = %report.account,
            discovered = report.channels_discovered,
            succeeded = report.channels_succeeded,
            failed = report.channels_failed,
            aborted = report.channels_aborted,
            found = report.opportunities_found,
            inserted = report.opportunities_inserted,
            "backfill finished"
        );
        report
    }

    /// Lists channels and keeps those active since `cutoff`, most recent first.
    async fn discover(
        &self,
        cutoff: DateTime<Utc>,
        report: &mut BackfillReport,
    ) -> Result<Vec<ChannelInfo>, LeadhoundError> {
        let all = self.source.list_channels().await?;
        report.channels_discovered = all.len();

        let mut active: Vec<ChannelInfo> = all
            .into_iter()
            .filter(|c| c.last_activity.is_some_and(|at| at >= cutoff))
            .collect();
        active.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        report.channels_skipped = report.channels_discovered - active.len();

        info!(
            discovered = report.channels_discovered,
            active = active.len(),
            "channel discovery complete"
        );
        Ok(active)
    }

    async fn process_channels(
        &self,
        channels: Vec<ChannelInfo>,
        cutoff: DateTime<Utc>,
    ) -> Vec<ChannelRun> {
        let permits = Arc::new(Semaphore::new(self.settings.concurrent_channels.max(1)));
        let mut tasks = JoinSet::new();

        for channel in channels {
            let permits = permits.clone();
            let worker = self.worker.clone();
            tasks.spawn(async move {
                let channel_id = Some(channel.id);
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => worker
                        .process(channel, cutoff)
                        .await
                        .map_err(|e| e.to_string()),
                    Err(_) => Err("channel semaphore closed".to_string()),
                };
                ChannelRun { channel_id, outcome }
            });
        }

        let mut runs = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            runs.push(joined.unwrap_or_else(|e| ChannelRun {
                channel_id: None,
                outcome: Err(format!("channel task did not complete: {e}")),
            }));
        }
        runs
    }
}

/// Oldest timestamp inside the lookback window. Windows reaching past the
/// representable range start at the earliest representable instant.
fn lookback_cutoff(now: DateTime<Utc>, history_days: u32) -> DateTime<Utc> {
    ChronoDuration::try_days(i64::from(history_days))
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn aggregate(runs: Vec<ChannelRun>, report: &mut BackfillReport) -> Vec<Opportunity> {
    let mut opportunities = Vec::new();
    for run in runs {
        match run.outcome {
            Ok(channel) => {
                report.messages_scanned += channel.scanned;
                report.keyword_matches += channel.matches;
                report.duplicates_skipped += channel.duplicates;
                if channel.end.is_complete() {
                    report.channels_succeeded += 1;
                } else {
                    report.channels_aborted += 1;
                }
                opportunities.extend(channel.opportunities);
            }
            Err(reason) => {
                warn!(channel_id = ?run.channel_id, %reason, "channel failed");
                report.channels_failed += 1;
            }
        }
    }
    opportunities
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use leadhound_core::{
        AccountIdentity, AdapterType, HealthStatus, HistoryPageRequest, OpportunitySink,
        PluginAdapter, RawMessage, SourceError, StoredOpportunity, ValidationResult,
        ValidationStatus, WriteMode,
    };
    use leadhound_test_utils::{MemoryStore, MockSource, MockStageClassifier, RecordingSink, fixtures};

    use super::*;

    /// Wraps a [`MockSource`], rate limiting every page after the first and
    /// optionally failing the channel listing.
    struct ThrottledSource {
        inner: MockSource,
        fail_listing: bool,
    }

    #[async_trait]
    impl PluginAdapter for ThrottledSource {
        fn name(&self) -> &str {
            "throttled"
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
    impl MessageSource for ThrottledSource {
        fn account(&self) -> &AccountIdentity {
            self.inner.account()
        }
        async fn list_channels(&self) -> Result<Vec<ChannelInfo>, LeadhoundError> {
            if self.fail_listing {
                return Err(LeadhoundError::Source {
                    message: "gateway unavailable".into(),
                    source: None,
                });
            }
            self.inner.list_channels().await
        }
        async fn fetch_page(
            &self,
            request: HistoryPageRequest,
        ) -> Result<Vec<RawMessage>, SourceError> {
            if request.before.is_some() {
                return Err(SourceError::RateLimited { retry_after: None });
            }
            self.inner.fetch_page(request).await
        }
    }

    /// Holds every history request open for a second and records how many
    /// were in flight at once.
    struct SlowSource {
        inner: MockSource,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl SlowSource {
        fn new(inner: MockSource) -> Self {
            Self {
                inner,
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PluginAdapter for SlowSource {
        fn name(&self) -> &str {
            "slow"
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
    impl MessageSource for SlowSource {
        fn account(&self) -> &AccountIdentity {
            self.inner.account()
        }
        async fn list_channels(&self) -> Result<Vec<ChannelInfo>, LeadhoundError> {
            self.inner.list_channels().await
        }
        async fn fetch_page(
            &self,
            request: HistoryPageRequest,
        ) -> Result<Vec<RawMessage>, SourceError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(1)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.inner.fetch_page(request).await
        }
    }

    /// Reads from a [`MemoryStore`] but rejects every write.
    struct ReadOnlyStore(MemoryStore);

    #[async_trait]
    impl PluginAdapter for ReadOnlyStore {
        fn name(&self) -> &str {
            "read-only"
        }
        fn version(&self) -> semver::Version {
            semver::Version::new(0, 1, 0)
        }
        fn adapter_type(&self) -> AdapterType {
            AdapterType::Storage
        }
        async fn health_check(&self) -> Result<HealthStatus, LeadhoundError> {
            Ok(HealthStatus::Healthy)
        }
    }

    #[async_trait]
    impl OpportunityStore for ReadOnlyStore {
        async fn latest_seen_timestamp(
            &self,
            channel_id: u64,
        ) -> Result<Option<DateTime<Utc>>, LeadhoundError> {
            self.0.latest_seen_timestamp(channel_id).await
        }
        async fn existing_permalinks(
            &self,
            permalinks: &HashSet<String>,
        ) -> Result<HashSet<String>, LeadhoundError> {
            self.0.existing_permalinks(permalinks).await
        }
        async fn save(&self, _: &Opportunity) -> Result<Option<i64>, LeadhoundError> {
            Err(LeadhoundError::storage("database is read-only"))
        }
        async fn save_batch(&self, _: &[Opportunity]) -> Result<usize, LeadhoundError> {
            Err(LeadhoundError::storage("database is read-only"))
        }
        async fn list_opportunities(
            &self,
            limit: Option<usize>,
        ) -> Result<Vec<StoredOpportunity>, LeadhoundError> {
            self.0.list_opportunities(limit).await
        }
    }

    fn settings() -> BackfillSettings {
        BackfillSettings {
            history_days: 7,
            concurrent_channels: 4,
            crawl: CrawlSettings {
                page_limit: 10,
                max_retries: 3,
                retry_fallback: Duration::from_secs(1),
                retry_margin: Duration::from_millis(100),
            },
        }
    }

    struct Harness {
        source: Arc<dyn MessageSource>,
        store: Arc<dyn OpportunityStore>,
        classifier: Arc<MockStageClassifier>,
        sink: Arc<RecordingSink>,
    }

    impl Harness {
        fn new(source: impl MessageSource, store: impl OpportunityStore) -> Self {
            Self {
                source: Arc::new(source),
                store: Arc::new(store),
                classifier: Arc::new(MockStageClassifier::new()),
                sink: Arc::new(RecordingSink::new("sheet")),
            }
        }

        fn with_classifier(mut self, classifier: MockStageClassifier) -> Self {
            self.classifier = Arc::new(classifier);
            self
        }

        fn orchestrator(&self) -> BackfillOrchestrator {
            let sinks: Vec<Arc<dyn OpportunitySink>> = vec![self.sink.clone()];
            let ports = BackfillPorts {
                source: self.source.clone(),
                store: self.store.clone(),
                filter: Arc::new(KeywordFilter::new(&["hiring", "freelance"]).unwrap()),
                classifier: Arc::new(Classifier::new(self.classifier.clone(), 5)),
                limiter: Arc::new(RateLimiter::new(Duration::from_millis(10))),
                recorder: Arc::new(Recorder::new(self.store.clone(), sinks, WriteMode::All)),
            };
            BackfillOrchestrator::new(ports, settings())
        }

        async fn stored(&self) -> Vec<StoredOpportunity> {
            self.store.list_opportunities(None).await.unwrap()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn forbidden_channel_does_not_stop_siblings() {
        let source = MockSource::new(fixtures::account())
            .with_channel(
                fixtures::channel(1, "private", 5),
                fixtures::history(1, 100, 5, 5, "we are hiring"),
            )
            .with_forbidden(1)
            .with_channel(
                fixtures::channel(2, "jobs", 10),
                fixtures::history(2, 200, 12, 10, "we are hiring"),
            );
        let h = Harness::new(source, MemoryStore::new());

        let report = h.orchestrator().run().await;

        assert_eq!(report.channels_discovered, 2);
        assert_eq!(report.channels_aborted, 1);
        assert_eq!(report.channels_succeeded, 1);
        assert_eq!(report.channels_failed, 0);
        assert_eq!(report.opportunities_found, 12);
        assert_eq!(report.opportunities_inserted, 12);
        let stored = h.stored().await;
        assert!(stored.iter().all(|s| s.opportunity.message().channel_id == 2));
        assert_eq!(h.sink.received().await.len(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn channel_concurrency_is_bounded() {
        let mut inner = MockSource::new(fixtures::account());
        for id in 1..=10u64 {
            inner = inner.with_channel(
                fixtures::channel(id, "jobs", 0),
                fixtures::history(id, id * 100, 2, 0, "hiring"),
            );
        }
        let source = Arc::new(SlowSource::new(inner));
        let mut h = Harness::new(MockSource::new(fixtures::account()), MemoryStore::new());
        h.source = source.clone() as Arc<dyn MessageSource>;

        let report = h.orchestrator().run().await;

        assert_eq!(report.channels_succeeded, 10);
        assert_eq!(report.opportunities_inserted, 20);
        // settings() allows four channels at once.
        assert_eq!(source.peak.load(Ordering::SeqCst), 4);
        assert_eq!(source.in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn oversized_lookback_reads_full_history() {
        let source = MockSource::new(fixtures::account()).with_channel(
            fixtures::channel(1, "jobs", 0),
            fixtures::history(1, 100, 3, 0, "hiring"),
        );
        let h = Harness::new(source, MemoryStore::new());
        let ports = BackfillPorts {
            source: h.source.clone(),
            store: h.store.clone(),
            filter: Arc::new(KeywordFilter::new(&["hiring"]).unwrap()),
            classifier: Arc::new(Classifier::new(h.classifier.clone(), 5)),
            limiter: Arc::new(RateLimiter::new(Duration::from_millis(10))),
            recorder: Arc::new(Recorder::new(h.store.clone(), Vec::new(), WriteMode::All)),
        };
        let orchestrator = BackfillOrchestrator::new(
            ports,
            BackfillSettings {
                history_days: u32::MAX,
                ..settings()
            },
        );

        let report = orchestrator.run().await;

        assert_eq!(report.channels_succeeded, 1);
        assert_eq!(report.opportunities_inserted, 3);
    }

    #[test]
    fn lookback_cutoff_saturates_at_earliest_instant() {
        let now = Utc::now();
        assert_eq!(lookback_cutoff(now, 7), now - ChronoDuration::days(7));
        assert_eq!(lookback_cutoff(now, u32::MAX), DateTime::<Utc>::MIN_UTC);
        assert_eq!(lookback_cutoff(now, 200_000_000), DateTime::<Utc>::MIN_UTC);
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_channels_are_never_crawled() {
        let source = Arc::new(
            MockSource::new(fixtures::account())
                .with_channel(
                    fixtures::channel(1, "stale", 60 * 24 * 30),
                    fixtures::history(1, 100, 3, 60 * 24 * 30, "hiring"),
                )
                .with_channel(
                    fixtures::channel(2, "fresh", 1),
                    fixtures::history(2, 200, 3, 1, "hiring"),
                ),
        );
        let mut h = Harness::new(MockSource::new(fixtures::account()), MemoryStore::new());
        h.source = source.clone() as Arc<dyn MessageSource>;

        let report = h.orchestrator().run().await;

        assert_eq!(report.channels_skipped, 1);
        assert_eq!(source.request_count(1).await, 0);
        assert_eq!(report.opportunities_found, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn counts_filter_and_classification_work() {
        let mut history = fixtures::history(1, 100, 10, 0, "hiring a rust dev");
        for raw in history.iter_mut().take(4) {
            raw.content = "lunch anyone?".into();
        }
        let source = MockSource::new(fixtures::account())
            .with_channel(fixtures::channel(1, "jobs", 0), history);
        let h = Harness::new(source, MemoryStore::new()).with_classifier(
            MockStageClassifier::new().with_stage_one(|m| {
                if m.id % 2 == 0 {
                    Ok(ValidationResult::new(ValidationStatus::Unrelevant, 0.0, "junk"))
                } else {
                    Ok(ValidationResult::new(ValidationStatus::PossiblyRelevant, 0.6, "maybe"))
                }
            }),
        );

        let report = h.orchestrator().run().await;

        assert_eq!(report.messages_scanned, 10);
        assert_eq!(report.keyword_matches, 6);
        assert_eq!(report.opportunities_found, 6);
        // Three pass triage and get a second call.
        assert_eq!(report.classification_calls, 9);
        assert_eq!(h.classifier.stage_two_calls(), 3);
        assert!(
            h.stored()
                .await
                .iter()
                .all(|s| s.opportunity.message().keyword.as_deref() == Some("hiring"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn second_run_starts_after_latest_stored_message() {
        let source = MockSource::new(fixtures::account())
            .with_channel(fixtures::channel(1, "jobs", 0), fixtures::history(1, 100, 10, 0, "hiring"));
        let h = Harness::new(source, MemoryStore::new());

        let first = h.orchestrator().run().await;
        assert_eq!(first.opportunities_inserted, 10);

        let second = h.orchestrator().run().await;
        assert_eq!(second.messages_scanned, 0);
        assert_eq!(second.opportunities_inserted, 0);
        assert_eq!(h.classifier.stage_one_calls(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn stored_permalinks_are_not_classified_again() {
        let source = MockSource::new(fixtures::account())
            .with_channel(fixtures::channel(1, "jobs", 0), fixtures::history(1, 100, 10, 0, "hiring"));
        let store = MemoryStore::new();
        // Old timestamps keep the crawl start at the lookback cutoff.
        let seeded: Vec<Opportunity> = (100..104)
            .map(|id| {
                let mut message = fixtures::message(1, id, "hiring");
                message.timestamp = Utc::now() - ChronoDuration::days(30);
                Opportunity::from_parts(
                    message,
                    ValidationResult::new(ValidationStatus::Unrelevant, 0.0, "junk"),
                    None,
                    fixtures::discovery(SourceMode::Backfill),
                )
                .unwrap()
            })
            .collect();
        store.seed(&seeded).await;
        let h = Harness::new(source, store);

        let report = h.orchestrator().run().await;

        assert_eq!(report.keyword_matches, 10);
        assert_eq!(report.duplicates_skipped, 4);
        assert_eq!(report.opportunities_found, 6);
        assert_eq!(h.classifier.stage_one_calls(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_channel_keeps_partial_results() {
        let inner = MockSource::new(fixtures::account()).with_channel(
            fixtures::channel(1, "busy", 0),
            fixtures::history(1, 100, 25, 0, "hiring"),
        );
        let h = Harness::new(
            ThrottledSource {
                inner,
                fail_listing: false,
            },
            MemoryStore::new(),
        );

        let report = h.orchestrator().run().await;

        assert_eq!(report.channels_aborted, 1);
        assert_eq!(report.channels_succeeded, 0);
        assert_eq!(report.messages_scanned, 10);
        assert_eq!(report.opportunities_inserted, 10);
    }

    #[tokio::test]
    async fn listing_failure_still_reports() {
        let h = Harness::new(
            ThrottledSource {
                inner: MockSource::new(fixtures::account()),
                fail_listing: true,
            },
            MemoryStore::new(),
        );
        let report = h.orchestrator().run().await;
        assert_eq!(report.channels_discovered, 0);
        assert_eq!(report.opportunities_found, 0);
        assert!(report.listing_error.unwrap().contains("gateway unavailable"));
        assert!(report.record_error.is_none());
        assert!(report.finished_at >= report.started_at);
        assert!(h.sink.batches().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn record_failure_is_reported_not_raised() {
        let source = MockSource::new(fixtures::account())
            .with_channel(fixtures::channel(1, "jobs", 0), fixtures::history(1, 100, 3, 0, "hiring"));
        let h = Harness::new(source, ReadOnlyStore(MemoryStore::new()));

        let report = h.orchestrator().run().await;

        assert_eq!(report.opportunities_found, 3);
        assert_eq!(report.opportunities_inserted, 0);
        assert!(report.record_error.unwrap().contains("read-only"));
        assert!(h.sink.batches().await.is_empty());
    }

    #[tokio::test]
    async fn no_channels_still_reports() {
        let h = Harness::new(MockSource::new(fixtures::account()), MemoryStore::new());
        let report = h.orchestrator().run().await;
        assert_eq!(report.channels_discovered, 0);
        assert_eq!(report.opportunities_found, 0);
        assert_eq!(report.account, "scout");
        assert!(report.finished_at >= report.started_at);
    }

    #[test]
    fn phases_display_in_snake_case() {
        assert_eq!(BackfillPhase::DiscoverChannels.to_string(), "discover_channels");
        assert_eq!(BackfillPhase::BatchRecord.to_string(), "batch_record");
    }
}
