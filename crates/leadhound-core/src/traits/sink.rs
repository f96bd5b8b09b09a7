// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Export sink port.

use async_trait::async_trait;

use crate::error::LeadhoundError;
use crate::types::Opportunity;

/// A secondary destination for persisted opportunities (spreadsheet, CSV, ...).
#[async_trait]
pub trait OpportunitySink: Send + Sync + 'static {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Appends the given opportunities.
    async fn save(&self, opportunities: &[Opportunity]) -> Result<(), LeadhoundError>;
}
