// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Leadhound.
//!
//! Domain types, error types, the retry helper, and the port traits that
//! every adapter crate implements.

pub mod error;
pub mod retry;
pub mod traits;
pub mod types;

pub use error::{LeadhoundError, SourceError};
pub use retry::{RetryDecision, RetryError, RetryPolicy, retry_with_backoff};
pub use types::{
    AccountIdentity, AdapterType, ChannelInfo, Discovery, HealthStatus, IncomingMessage, Message,
    Opportunity, PendingOpportunity, RawMessage, SourceMode, StageOneOutcome, StoredOpportunity,
    ValidationResult, ValidationStatus, WriteMode,
};

pub use traits::{
    HistoryPageRequest, MessageSource, OpportunitySink, OpportunityStore, PluginAdapter,
    StageClassifier,
};
