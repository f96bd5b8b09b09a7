// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-stage classification with bounded concurrency.
//!
//! Every stage call, from any pipeline, takes a permit from one shared
//! semaphore. Failures never escape: a stage that errors yields an `Error`
//! result and the message still becomes an [`Opportunity`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use leadhound_core::{
    Discovery, Message, Opportunity, StageClassifier, StageOneOutcome, ValidationResult,
};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Default number of classification calls allowed in flight.
pub const DEFAULT_CONCURRENCY: usize = 5;

#[derive(Debug, Clone, Copy)]
enum Stage {
    One,
    Two,
}

impl Stage {
    fn label(self) -> &'static str {
        match self {
            Stage::One => "stage_one",
            Stage::Two => "stage_two",
        }
    }
}

/// Runs the triage and detailed stages against a [`StageClassifier`].
pub struct Classifier {
    port: Arc<dyn StageClassifier>,
    permits: Arc<Semaphore>,
    calls: AtomicU64,
}

impl Classifier {
    /// `concurrency` is clamped to at least one permit.
    pub fn new(port: Arc<dyn StageClassifier>, concurrency: usize) -> Self {
        Self {
            port,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            calls: AtomicU64::new(0),
        }
    }

    /// Classifies one message.
    ///
    /// Stage two runs only when stage one neither failed nor judged the
    /// message junk.
    pub async fn classify(&self, message: Message, discovery: &Discovery) -> Opportunity {
        let stage_one = self.run_stage(Stage::One, &message).await;
        match Opportunity::after_stage_one(message, stage_one, discovery.clone()) {
            StageOneOutcome::Done(opportunity) => {
                debug!(
                    permalink = opportunity.permalink(),
                    status = %opportunity.final_status(),
                    "classification ended at stage one"
                );
                opportunity
            }
            StageOneOutcome::Continue(pending) => {
                let stage_two = self.run_stage(Stage::Two, pending.message()).await;
                let opportunity = pending.complete(stage_two);
                debug!(
                    permalink = opportunity.permalink(),
                    status = %opportunity.final_status(),
                    "classification complete"
                );
                opportunity
            }
        }
    }

    /// Total stage calls made so far.
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    async fn run_stage(&self, stage: Stage, message: &Message) -> ValidationResult {
        let _permit = match self.permits.acquire().await {
            Ok(permit) => permit,
            Err(_) => return ValidationResult::error("classifier is shut down"),
        };
        self.calls.fetch_add(1, Ordering::Relaxed);

        let result = match stage {
            Stage::One => self.port.stage_one(message).await,
            Stage::Two => self.port.stage_two(message).await,
        };
        result.unwrap_or_else(|e| {
            warn!(
                stage = stage.label(),
                permalink = %message.permalink,
                error = %e,
                "classification call failed"
            );
            ValidationResult::error(format!("{} failed: {e}", stage.label()))
        })
    }
}
