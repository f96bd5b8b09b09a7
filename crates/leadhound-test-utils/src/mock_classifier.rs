// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Programmable two-stage classifier.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use leadhound_core::{
    AdapterType, HealthStatus, LeadhoundError, Message, PluginAdapter, StageClassifier,
    ValidationResult, ValidationStatus,
};

type Verdict = Box<dyn Fn(&Message) -> Result<ValidationResult, LeadhoundError> + Send + Sync>;

/// A [`StageClassifier`] driven by closures.
///
/// Defaults: stage one says `PossiblyRelevant`, stage two says `Relevant`
/// with confidence 0.9. Calls are counted per stage and the peak number of
/// concurrent calls is tracked.
pub struct MockStageClassifier {
    stage_one: Verdict,
    stage_two: Verdict,
    latency: Duration,
    stage_one_calls: AtomicUsize,
    stage_two_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockStageClassifier {
    pub fn new() -> Self {
        Self {
            stage_one: Box::new(|_| {
                Ok(ValidationResult::new(
                    ValidationStatus::PossiblyRelevant,
                    0.7,
                    "potential",
                ))
            }),
            stage_two: Box::new(|_| {
                Ok(ValidationResult::new(ValidationStatus::Relevant, 0.9, "lead")
                    .with_lead_type(Some("project_work".into())))
            }),
            latency: Duration::ZERO,
            stage_one_calls: AtomicUsize::new(0),
            stage_two_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn with_stage_one(
        mut self,
        f: impl Fn(&Message) -> Result<ValidationResult, LeadhoundError> + Send + Sync + 'static,
    ) -> Self {
        self.stage_one = Box::new(f);
        self
    }

    pub fn with_stage_two(
        mut self,
        f: impl Fn(&Message) -> Result<ValidationResult, LeadhoundError> + Send + Sync + 'static,
    ) -> Self {
        self.stage_two = Box::new(f);
        self
    }

    /// Every call sleeps this long before answering.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn stage_one_calls(&self) -> usize {
        self.stage_one_calls.load(Ordering::SeqCst)
    }

    pub fn stage_two_calls(&self) -> usize {
        self.stage_two_calls.load(Ordering::SeqCst)
    }

    /// Highest number of stage calls observed running at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn answer(&self, verdict: &Verdict, message: &Message) -> Result<ValidationResult, LeadhoundError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let result = verdict(message);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

impl Default for MockStageClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockStageClassifier {
    fn name(&self) -> &str {
        "mock-classifier"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Classifier
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadhoundError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl StageClassifier for MockStageClassifier {
    async fn stage_one(&self, message: &Message) -> Result<ValidationResult, LeadhoundError> {
        self.stage_one_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.stage_one, message).await
    }

    async fn stage_two(&self, message: &Message) -> Result<ValidationResult, LeadhoundError> {
        self.stage_two_calls.fetch_add(1, Ordering::SeqCst);
        self.answer(&self.stage_two, message).await
    }
}
