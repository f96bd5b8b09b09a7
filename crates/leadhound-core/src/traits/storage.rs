// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable opportunity store port.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::LeadhoundError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Opportunity, StoredOpportunity};

/// Persistence for classified messages, keyed by permalink.
#[async_trait]
pub trait OpportunityStore: PluginAdapter {
    /// Timestamp of the newest stored message in the channel, if any.
    async fn latest_seen_timestamp(
        &self,
        channel_id: u64,
    ) -> Result<Option<DateTime<Utc>>, LeadhoundError>;

    /// Returns the subset of `permalinks` already stored.
    async fn existing_permalinks(
        &self,
        permalinks: &HashSet<String>,
    ) -> Result<HashSet<String>, LeadhoundError>;

    /// Saves one opportunity. Returns its row id, or `None` when the permalink
    /// was already stored.
    async fn save(&self, opportunity: &Opportunity) -> Result<Option<i64>, LeadhoundError>;

    /// Saves many opportunities in one transaction, skipping duplicates.
    /// Returns how many rows were inserted.
    async fn save_batch(&self, opportunities: &[Opportunity]) -> Result<usize, LeadhoundError>;

    /// Lists stored opportunities, newest message first.
    async fn list_opportunities(
        &self,
        limit: Option<usize>,
    ) -> Result<Vec<StoredOpportunity>, LeadhoundError>;
}
