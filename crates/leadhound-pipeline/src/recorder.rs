// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence and export fan-out.
//!
//! [`Recorder::record`] is the live path: one insert, then export only if
//! the row was new. [`Recorder::record_batch`] is the backfill path: one bulk
//! insert and one batched export per sink. Sinks run concurrently and a
//! failing sink never affects the others.

use std::sync::Arc;

use futures::future::join_all;
use leadhound_core::{LeadhoundError, Opportunity, OpportunitySink, OpportunityStore, WriteMode};
use serde::Serialize;
use tracing::{debug, error, info};

/// Result of recording a single opportunity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// The permalink was already stored; nothing was exported.
    Duplicate,
    /// Stored, but the write mode kept it out of the sinks.
    Filtered { id: i64 },
    /// Stored and handed to the sinks.
    Exported { id: i64, sink_failures: usize },
}

/// Result of recording a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Rows actually inserted; duplicates are not counted.
    pub inserted: usize,
    /// Opportunities handed to each sink.
    pub exported: usize,
    pub sink_failures: usize,
}

pub struct Recorder {
    store: Arc<dyn OpportunityStore>,
    sinks: Vec<Arc<dyn OpportunitySink>>,
    write_mode: WriteMode,
}

impl Recorder {
    pub fn new(
        store: Arc<dyn OpportunityStore>,
        sinks: Vec<Arc<dyn OpportunitySink>>,
        write_mode: WriteMode,
    ) -> Self {
        Self {
            store,
            sinks,
            write_mode,
        }
    }

    /// Persists one opportunity and exports it if it was new and admitted
    /// by the write mode. A duplicate is a successful no-op.
    pub async fn record(&self, opportunity: &Opportunity) -> Result<RecordOutcome, LeadhoundError> {
        let Some(id) = self.store.save(opportunity).await? else {
            debug!(permalink = opportunity.permalink(), "already recorded, skipping export");
            return Ok(RecordOutcome::Duplicate);
        };

        if !self.write_mode.admits(opportunity) {
            debug!(
                permalink = opportunity.permalink(),
                status = %opportunity.final_status(),
                write_mode = %self.write_mode,
                "stored without export"
            );
            return Ok(RecordOutcome::Filtered { id });
        }

        let sink_failures = self.fan_out(std::slice::from_ref(opportunity)).await;
        info!(
            permalink = opportunity.permalink(),
            status = %opportunity.final_status(),
            id,
            "opportunity recorded"
        );
        Ok(RecordOutcome::Exported { id, sink_failures })
    }

    /// Bulk-persists `opportunities`, ignoring duplicates, then exports every
    /// input admitted by the write mode.
    ///
    /// The export set is drawn from the input list, not only from rows that
    /// were newly inserted.
    pub async fn record_batch(
        &self,
        opportunities: &[Opportunity],
    ) -> Result<BatchOutcome, LeadhoundError> {
        if opportunities.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let inserted = self.store.save_batch(opportunities).await?;

        let admitted: Vec<Opportunity> = opportunities
            .iter()
            .filter(|o| self.write_mode.admits(o))
            .cloned()
            .collect();
        let sink_failures = if admitted.is_empty() {
            0
        } else {
            self.fan_out(&admitted).await
        };

        info!(
            submitted = opportunities.len(),
            inserted,
            exported = admitted.len(),
            sink_failures,
            "batch recorded"
        );
        Ok(BatchOutcome {
            inserted,
            exported: admitted.len(),
            sink_failures,
        })
    }

    /// Saves to every sink concurrently. Returns the number of sinks that failed.
    async fn fan_out(&self, opportunities: &[Opportunity]) -> usize {
        let results = join_all(self.sinks.iter().map(|sink| async move {
            (sink.name(), sink.save(opportunities).await)
        }))
        .await;

        let mut failures = 0;
        for (sink, result) in results {
            match result {
                Ok(()) => debug!(sink, count = opportunities.len(), "sink save complete"),
                Err(e) => {
                    failures += 1;
                    error!(sink, count = opportunities.len(), error = %e, "sink save failed");
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use leadhound_core::ValidationStatus;
    use leadhound_test_utils::{FailingSink, MemoryStore, RecordingSink, fixtures};

    use super::*;

    struct Harness {
        store: Arc<MemoryStore>,
        healthy: Arc<RecordingSink>,
        failing: Arc<FailingSink>,
        recorder: Recorder,
    }

    fn harness(write_mode: WriteMode) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let healthy = Arc::new(RecordingSink::new("sheet"));
        let failing = Arc::new(FailingSink::new());
        let recorder = Recorder::new(
            store.clone(),
            vec![failing.clone() as Arc<dyn OpportunitySink>, healthy.clone()],
            write_mode,
        );
        Harness {
            store,
            healthy,
            failing,
            recorder,
        }
    }

    #[tokio::test]
    async fn record_exports_new_opportunities() {
        let h = harness(WriteMode::All);
        let outcome = h
            .recorder
            .record(&fixtures::opportunity(1, 1, ValidationStatus::Relevant))
            .await
            .unwrap();

        assert!(matches!(outcome, RecordOutcome::Exported { sink_failures: 1, .. }));
        assert_eq!(h.healthy.received().await.len(), 1);
        assert_eq!(h.failing.attempts(), 1);
    }

    #[tokio::test]
    async fn record_skips_export_for_duplicates() {
        let h = harness(WriteMode::All);
        let opportunity = fixtures::opportunity(1, 1, ValidationStatus::Relevant);
        h.recorder.record(&opportunity).await.unwrap();

        let again = h.recorder.record(&opportunity).await.unwrap();

        assert_eq!(again, RecordOutcome::Duplicate);
        assert_eq!(h.healthy.batches().await.len(), 1);
        assert_eq!(h.store.len().await, 1);
    }

    #[tokio::test]
    async fn qualified_mode_stores_but_does_not_export_non_leads() {
        let h = harness(WriteMode::Qualified);
        for (id, status) in [
            (1, ValidationStatus::Relevant),
            (2, ValidationStatus::PossiblyRelevant),
            (3, ValidationStatus::PossiblyUnrelevant),
            (4, ValidationStatus::Unrelevant),
            (5, ValidationStatus::Error),
        ] {
            h.recorder
                .record(&fixtures::opportunity(1, id, status))
                .await
                .unwrap();
        }

        assert_eq!(h.store.len().await, 5);
        let exported: Vec<u64> = h
            .healthy
            .received()
            .await
            .iter()
            .map(|o| o.message().id)
            .collect();
        assert_eq!(exported, vec![1, 2]);
    }

    #[tokio::test]
    async fn batch_exports_filtered_input_once_per_sink() {
        let h = harness(WriteMode::Qualified);
        let existing = fixtures::opportunity(1, 1, ValidationStatus::Relevant);
        h.store.seed(std::slice::from_ref(&existing)).await;

        let batch = vec![
            existing,
            fixtures::opportunity(1, 2, ValidationStatus::PossiblyRelevant),
            fixtures::opportunity(1, 3, ValidationStatus::Unrelevant),
        ];
        let outcome = h.recorder.record_batch(&batch).await.unwrap();

        assert_eq!(
            outcome,
            BatchOutcome {
                inserted: 2,
                exported: 2,
                sink_failures: 1,
            }
        );
        let batches = h.healthy.batches().await;
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(h.failing.attempts(), 1);
    }

    #[tokio::test]
    async fn failing_sink_does_not_block_the_others() {
        let store = Arc::new(MemoryStore::new());
        let first = Arc::new(RecordingSink::new("first"));
        let last = Arc::new(RecordingSink::new("last"));
        let recorder = Recorder::new(
            store,
            vec![
                first.clone() as Arc<dyn OpportunitySink>,
                Arc::new(FailingSink::new()),
                last.clone(),
            ],
            WriteMode::All,
        );

        let batch: Vec<_> = (0..3)
            .map(|i| fixtures::opportunity(1, i, ValidationStatus::Relevant))
            .collect();
        let outcome = recorder.record_batch(&batch).await.unwrap();

        assert_eq!(outcome.sink_failures, 1);
        assert_eq!(first.received().await.len(), 3);
        assert_eq!(last.received().await.len(), 3);
    }

    #[tokio::test]
    async fn empty_batch_touches_nothing() {
        let h = harness(WriteMode::All);
        let outcome = h.recorder.record_batch(&[]).await.unwrap();
        assert_eq!(outcome, BatchOutcome::default());
        assert_eq!(h.failing.attempts(), 0);
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let h = harness(WriteMode::All);
        h.store.set_failing(true);
        let result = h
            .recorder
            .record(&fixtures::opportunity(1, 1, ValidationStatus::Relevant))
            .await;
        assert!(result.is_err());
        assert_eq!(h.failing.attempts(), 0);
    }
}
