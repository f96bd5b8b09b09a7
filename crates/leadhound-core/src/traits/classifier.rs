// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Two-stage classification service port.

use async_trait::async_trait;

use crate::error::LeadhoundError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Message, ValidationResult};

/// A remote service able to judge a message at two levels of detail.
///
/// Implementations return `Err` for transport or parse failures. Callers turn
/// those into `ERROR` results; adapters never fabricate one themselves.
#[async_trait]
pub trait StageClassifier: PluginAdapter {
    /// Cheap triage. Must yield `PossiblyRelevant` or `Unrelevant`.
    async fn stage_one(&self, message: &Message) -> Result<ValidationResult, LeadhoundError>;

    /// Detailed assessment mapped onto the four-level status scale.
    async fn stage_two(&self, message: &Message) -> Result<ValidationResult, LeadhoundError>;
}
