// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Drops messages whose permalink is already stored.

use std::collections::HashSet;
use std::sync::Arc;

use leadhound_core::{LeadhoundError, Message, OpportunityStore};
use tracing::debug;

pub struct Deduplicator {
    store: Arc<dyn OpportunityStore>,
}

impl Deduplicator {
    pub fn new(store: Arc<dyn OpportunityStore>) -> Self {
        Self { store }
    }

    /// Returns the messages not yet stored, preserving order.
    ///
    /// Makes one existence query for the whole batch. Repeated permalinks
    /// within the batch keep only their first occurrence.
    pub async fn filter_new(&self, candidates: Vec<Message>) -> Result<Vec<Message>, LeadhoundError> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let permalinks: HashSet<String> = candidates.iter().map(|m| m.permalink.clone()).collect();
        let mut seen = self.store.existing_permalinks(&permalinks).await?;
        let total = candidates.len();

        let fresh: Vec<Message> = candidates
            .into_iter()
            .filter(|m| seen.insert(m.permalink.clone()))
            .collect();

        debug!(
            candidates = total,
            fresh = fresh.len(),
            "filtered already-stored messages"
        );
        Ok(fresh)
    }
}
