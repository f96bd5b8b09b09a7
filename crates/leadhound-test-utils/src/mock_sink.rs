// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Export sinks for recorder tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use leadhound_core::{LeadhoundError, Opportunity, OpportunitySink};

/// Captures every batch it receives.
pub struct RecordingSink {
    name: String,
    batches: Mutex<Vec<Vec<Opportunity>>>,
}

impl RecordingSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: Mutex::new(Vec::new()),
        }
    }

    pub async fn batches(&self) -> Vec<Vec<Opportunity>> {
        self.batches.lock().await.clone()
    }

    /// All opportunities received, flattened across batches.
    pub async fn received(&self) -> Vec<Opportunity> {
        self.batches.lock().await.iter().flatten().cloned().collect()
    }
}

#[async_trait]
impl OpportunitySink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn save(&self, opportunities: &[Opportunity]) -> Result<(), LeadhoundError> {
        self.batches.lock().await.push(opportunities.to_vec());
        Ok(())
    }
}

/// Rejects every batch.
pub struct FailingSink {
    attempts: AtomicUsize,
}

impl FailingSink {
    pub fn new() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for FailingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OpportunitySink for FailingSink {
    fn name(&self) -> &str {
        "failing"
    }

    async fn save(&self, _opportunities: &[Opportunity]) -> Result<(), LeadhoundError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(LeadhoundError::sink("sink unavailable"))
    }
}
