// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory opportunity store with permalink uniqueness.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use leadhound_core::{
    AdapterType, HealthStatus, LeadhoundError, Opportunity, OpportunityStore, PluginAdapter,
    StoredOpportunity,
};

#[derive(Default)]
struct Rows {
    opportunities: Vec<Opportunity>,
    permalinks: HashSet<String>,
}

impl Rows {
    fn insert(&mut self, opportunity: &Opportunity) -> bool {
        if self.permalinks.insert(opportunity.permalink().to_string()) {
            self.opportunities.push(opportunity.clone());
            true
        } else {
            false
        }
    }
}

/// A [`OpportunityStore`] backed by a vector.
#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Rows>,
    existence_queries: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates the store, bypassing the write path.
    pub async fn seed(&self, opportunities: &[Opportunity]) {
        let mut rows = self.rows.lock().await;
        for opportunity in opportunities {
            rows.insert(opportunity);
        }
    }

    /// Makes every subsequent call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn saved(&self) -> Vec<Opportunity> {
        self.rows.lock().await.opportunities.clone()
    }

    pub async fn len(&self) -> usize {
        self.rows.lock().await.opportunities.len()
    }

    /// Number of `existing_permalinks` calls made.
    pub fn existence_queries(&self) -> usize {
        self.existence_queries.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), LeadhoundError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(LeadhoundError::storage("memory store is failing"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
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
impl OpportunityStore for MemoryStore {
    async fn latest_seen_timestamp(
        &self,
        channel_id: u64,
    ) -> Result<Option<DateTime<Utc>>, LeadhoundError> {
        self.check()?;
        Ok(self
            .rows
            .lock()
            .await
            .opportunities
            .iter()
            .filter(|o| o.message().channel_id == channel_id)
            .map(|o| o.message().timestamp)
            .max())
    }

    async fn existing_permalinks(
        &self,
        permalinks: &HashSet<String>,
    ) -> Result<HashSet<String>, LeadhoundError> {
        self.check()?;
        self.existence_queries.fetch_add(1, Ordering::SeqCst);
        let rows = self.rows.lock().await;
        Ok(permalinks.intersection(&rows.permalinks).cloned().collect())
    }

    async fn save(&self, opportunity: &Opportunity) -> Result<Option<i64>, LeadhoundError> {
        self.check()?;
        let mut rows = self.rows.lock().await;
        if rows.insert(opportunity) {
            Ok(Some(rows.opportunities.len() as i64))
        } else {
            Ok(None)
        }
    }

    async fn save_batch(&self, opportunities: &[Opportunity]) -> Result<usize, LeadhoundError> {
        self.check()?;
        let mut rows = self.rows.lock().await;
        Ok(opportunities.iter().filter(|o| rows.insert(o)).count())
    }

    async fn list_opportunities(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<StoredOpportunity>, LeadhoundError> {
        self.check()?;
        let rows = self.rows.lock().await;
        let mut listed: Vec<StoredOpportunity> = rows
            .opportunities
            .iter()
            .enumerate()
            .map(|(i, o)| StoredOpportunity {
                id: i as i64 + 1,
                opportunity: o.clone(),
                manual_status: None,
                processed_at: Utc::now(),
            })
            .collect();
        listed.sort_by(|a, b| {
            b.opportunity
                .message()
                .timestamp
                .cmp(&a.opportunity.message().timestamp)
                .then(b.id.cmp(&a.id))
        });
        listed.truncate(limit.unwrap_or(usize::MAX));
        Ok(listed)
    }
}
