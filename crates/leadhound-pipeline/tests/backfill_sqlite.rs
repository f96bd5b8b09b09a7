// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end backfill runs against a real SQLite store.

use std::sync::Arc;
use std::time::Duration;

use leadhound_config::model::StorageConfig;
use leadhound_core::{
    LeadhoundError, OpportunitySink, OpportunityStore, ValidationResult, ValidationStatus,
    WriteMode,
};
use leadhound_pipeline::{
    BackfillOrchestrator, BackfillPorts, BackfillSettings, Classifier, CrawlSettings,
    KeywordFilter, RateLimiter, Recorder,
};
use leadhound_storage::SqliteStore;
use leadhound_test_utils::{FailingSink, MockSource, MockStageClassifier, RecordingSink, fixtures};
use tempfile::TempDir;

struct Setup {
    _dir: TempDir,
    store: Arc<SqliteStore>,
    source: Arc<MockSource>,
    classifier: Arc<MockStageClassifier>,
    sink: Arc<RecordingSink>,
}

async fn setup(source: MockSource, classifier: MockStageClassifier) -> Setup {
    let dir = tempfile::tempdir().unwrap();
    let store = SqliteStore::new(StorageConfig {
        database_path: dir.path().join("leads.db").to_string_lossy().into_owned(),
        wal_mode: true,
    });
    store.initialize().await.unwrap();
    Setup {
        _dir: dir,
        store: Arc::new(store),
        source: Arc::new(source),
        classifier: Arc::new(classifier),
        sink: Arc::new(RecordingSink::new("sheet")),
    }
}

impl Setup {
    fn orchestrator(&self, write_mode: WriteMode) -> BackfillOrchestrator {
        let sinks: Vec<Arc<dyn OpportunitySink>> =
            vec![Arc::new(FailingSink::new()), self.sink.clone()];
        BackfillOrchestrator::new(
            BackfillPorts {
                source: self.source.clone(),
                store: self.store.clone(),
                filter: Arc::new(KeywordFilter::new(&["hiring", "contract"]).unwrap()),
                classifier: Arc::new(Classifier::new(self.classifier.clone(), 5)),
                limiter: Arc::new(RateLimiter::new(Duration::from_millis(1))),
                recorder: Arc::new(Recorder::new(self.store.clone(), sinks, write_mode)),
            },
            BackfillSettings {
                history_days: 7,
                concurrent_channels: 2,
                crawl: CrawlSettings {
                    page_limit: 25,
                    ..CrawlSettings::default()
                },
            },
        )
    }
}

fn two_busy_channels() -> MockSource {
    MockSource::new(fixtures::account())
        .with_channel(
            fixtures::channel(1, "jobs", 0),
            fixtures::history(1, 1_000, 60, 0, "hiring a rust contractor"),
        )
        .with_channel(
            fixtures::channel(2, "gigs", 3),
            fixtures::history(2, 5_000, 40, 3, "short contract, paid"),
        )
}

#[tokio::test]
async fn rerunning_an_unchanged_window_inserts_nothing() {
    let s = setup(two_busy_channels(), MockStageClassifier::new()).await;

    let first = s.orchestrator(WriteMode::All).run().await;
    assert_eq!(first.channels_succeeded, 2);
    assert_eq!(first.opportunities_inserted, 100);
    assert_eq!(s.store.list_opportunities(None).await.unwrap().len(), 100);
    let calls_after_first = s.classifier.stage_one_calls();

    let second = s.orchestrator(WriteMode::All).run().await;
    assert_eq!(second.opportunities_inserted, 0);
    assert_eq!(second.classification_calls, 0);
    assert_eq!(s.classifier.stage_one_calls(), calls_after_first);
    assert_eq!(s.store.list_opportunities(None).await.unwrap().len(), 100);
}

#[tokio::test]
async fn failing_sink_leaves_the_other_sink_and_store_intact() {
    let s = setup(two_busy_channels(), MockStageClassifier::new()).await;

    let report = s.orchestrator(WriteMode::All).run().await;

    assert!(report.record_error.is_none());
    let batches = s.sink.batches().await;
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].len(), 100);
}

#[tokio::test]
async fn failed_stage_one_is_stored_for_audit_but_not_exported_as_a_lead() {
    let classifier = MockStageClassifier::new().with_stage_one(|m| {
        if m.channel_id == 2 {
            Err(LeadhoundError::classifier("quota exceeded"))
        } else {
            Ok(ValidationResult::new(ValidationStatus::PossiblyRelevant, 0.5, "maybe"))
        }
    });
    let s = setup(two_busy_channels(), classifier).await;

    let report = s.orchestrator(WriteMode::Qualified).run().await;

    assert_eq!(report.opportunities_inserted, 100);
    assert_eq!(s.classifier.stage_two_calls(), 60);
    let stored = s.store.list_opportunities(None).await.unwrap();
    let errors = stored
        .iter()
        .filter(|row| row.opportunity.final_status() == ValidationStatus::Error)
        .inspect(|row| assert!(row.opportunity.stage_two().is_none()))
        .count();
    assert_eq!(errors, 40);
    assert_eq!(s.sink.received().await.len(), 60);
}
