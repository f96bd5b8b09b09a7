// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across ports and the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::LeadhoundError;

/// Confidence at or above which a lead is a clear match.
pub const RELEVANT_THRESHOLD: f64 = 0.85;
/// Confidence at or above which a lead is probably worth a look.
pub const POSSIBLY_RELEVANT_THRESHOLD: f64 = 0.50;
/// Confidence at or above which a lead keeps a small chance.
pub const POSSIBLY_UNRELEVANT_THRESHOLD: f64 = 0.10;

/// Outcome of one classification stage.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    Relevant,
    PossiblyRelevant,
    PossiblyUnrelevant,
    Unrelevant,
    Error,
}

impl ValidationStatus {
    /// Maps a detailed assessment to the four-level scale.
    ///
    /// A message that is not a lead is `Unrelevant` regardless of confidence.
    pub fn from_lead_score(is_lead: bool, confidence: f64) -> Self {
        if !is_lead {
            return ValidationStatus::Unrelevant;
        }
        if confidence >= RELEVANT_THRESHOLD {
            ValidationStatus::Relevant
        } else if confidence >= POSSIBLY_RELEVANT_THRESHOLD {
            ValidationStatus::PossiblyRelevant
        } else if confidence >= POSSIBLY_UNRELEVANT_THRESHOLD {
            ValidationStatus::PossiblyUnrelevant
        } else {
            ValidationStatus::Unrelevant
        }
    }

    /// True for statuses that count as a lead.
    pub fn is_qualified(self) -> bool {
        matches!(
            self,
            ValidationStatus::Relevant | ValidationStatus::PossiblyRelevant
        )
    }

    /// True when a stage-one result with this status warrants a stage-two call.
    pub fn continues_to_stage_two(self) -> bool {
        !matches!(self, ValidationStatus::Error | ValidationStatus::Unrelevant)
    }
}

/// Result of a single classification stage. Never updated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub status: ValidationStatus,
    /// Confidence in `[0, 1]`.
    pub score: f64,
    pub reason: Option<String>,
    pub lead_type: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ValidationResult {
    /// Builds a result with the given status and score, clamping the score into `[0, 1]`.
    pub fn new(status: ValidationStatus, score: f64, reason: impl Into<String>) -> Self {
        let score = if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            status,
            score,
            reason: Some(reason.into()),
            lead_type: None,
            tags: None,
        }
    }

    /// Builds an `Error` result carrying a descriptive reason.
    pub fn error(reason: impl Into<String>) -> Self {
        Self::new(ValidationStatus::Error, 0.0, reason)
    }

    pub fn with_lead_type(mut self, lead_type: Option<String>) -> Self {
        self.lead_type = lead_type;
        self
    }

    pub fn with_tags(mut self, tags: Option<Vec<String>>) -> Self {
        self.tags = tags;
        self
    }
}

/// A message exactly as a source delivered it, before domain conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMessage {
    pub id: u64,
    pub channel_id: u64,
    pub guild_id: Option<u64>,
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub permalink: String,
}

/// A readable channel as reported by a source during discovery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: u64,
    pub name: String,
    pub guild_id: Option<u64>,
    pub guild_name: Option<String>,
    /// Timestamp of the newest message, if the platform reports one.
    pub last_activity: Option<DateTime<Utc>>,
}

impl ChannelInfo {
    /// Converts a raw history message from this channel into a domain [`Message`].
    ///
    /// Returns `None` for messages without text content.
    pub fn to_message(&self, raw: RawMessage) -> Option<Message> {
        let content = raw.content.trim();
        if content.is_empty() {
            return None;
        }
        Some(Message {
            id: raw.id,
            channel_id: self.id,
            channel_name: self.name.clone(),
            guild_id: raw.guild_id.or(self.guild_id),
            guild_name: self.guild_name.clone(),
            author_id: raw.author_id,
            author_name: raw.author_name,
            content: content.to_string(),
            timestamp: raw.timestamp,
            permalink: raw.permalink,
            keyword: None,
        })
    }
}

/// One observed chat message in domain form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub channel_id: u64,
    pub channel_name: String,
    pub guild_id: Option<u64>,
    pub guild_name: Option<String>,
    pub author_id: u64,
    pub author_name: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Stable unique URL of the message, used as the deduplication key.
    pub permalink: String,
    /// Keyword that made the message a candidate, attached by the keyword filter.
    pub keyword: Option<String>,
}

/// The chat account that observed a message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountIdentity {
    pub id: u64,
    pub name: String,
}

impl AccountIdentity {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A message delivered by one account's live listener.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub message: Message,
    pub received_by: AccountIdentity,
}

/// Which driver produced an opportunity.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    Live,
    Backfill,
}

/// Provenance stamped onto every opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discovery {
    pub account: AccountIdentity,
    pub mode: SourceMode,
}

impl Discovery {
    pub fn new(account: AccountIdentity, mode: SourceMode) -> Self {
        Self { account, mode }
    }
}

/// Which opportunities are forwarded to export sinks.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Export every persisted opportunity.
    #[default]
    All,
    /// Export only opportunities whose final status is a lead.
    Qualified,
}

impl WriteMode {
    pub fn admits(self, opportunity: &Opportunity) -> bool {
        match self {
            WriteMode::All => true,
            WriteMode::Qualified => opportunity.final_status().is_qualified(),
        }
    }
}

/// A classified message.
///
/// Stage two is present exactly when stage one neither failed nor judged the
/// message junk; the constructors enforce this.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Opportunity {
    message: Message,
    stage_one: ValidationResult,
    stage_two: Option<ValidationResult>,
    discovery: Discovery,
}

impl Opportunity {
    /// Starts assembly from a stage-one result.
    ///
    /// Errors and junk verdicts finish the opportunity immediately; anything
    /// else yields a [`PendingOpportunity`] that needs a stage-two result.
    pub fn after_stage_one(
        message: Message,
        stage_one: ValidationResult,
        discovery: Discovery,
    ) -> StageOneOutcome {
        if stage_one.status.continues_to_stage_two() {
            StageOneOutcome::Continue(PendingOpportunity {
                message,
                stage_one,
                discovery,
            })
        } else {
            StageOneOutcome::Done(Self {
                message,
                stage_one,
                stage_two: None,
                discovery,
            })
        }
    }

    /// Assembles an opportunity from stored parts, rejecting stage
    /// combinations that violate the two-stage contract.
    pub fn from_parts(
        message: Message,
        stage_one: ValidationResult,
        stage_two: Option<ValidationResult>,
        discovery: Discovery,
    ) -> Result<Self, LeadhoundError> {
        match (Self::after_stage_one(message, stage_one, discovery), stage_two) {
            (StageOneOutcome::Done(opportunity), None) => Ok(opportunity),
            (StageOneOutcome::Continue(pending), Some(stage_two)) => Ok(pending.complete(stage_two)),
            (StageOneOutcome::Done(opportunity), Some(_)) => Err(LeadhoundError::Internal(format!(
                "stage one status {} forbids a stage two result",
                opportunity.stage_one.status
            ))),
            (StageOneOutcome::Continue(pending), None) => Err(LeadhoundError::Internal(format!(
                "stage one status {} requires a stage two result",
                pending.stage_one.status
            ))),
        }
    }

    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn stage_one(&self) -> &ValidationResult {
        &self.stage_one
    }

    pub fn stage_two(&self) -> Option<&ValidationResult> {
        self.stage_two.as_ref()
    }

    pub fn discovery(&self) -> &Discovery {
        &self.discovery
    }

    /// The most detailed result available.
    pub fn final_result(&self) -> &ValidationResult {
        self.stage_two.as_ref().unwrap_or(&self.stage_one)
    }

    pub fn final_status(&self) -> ValidationStatus {
        self.final_result().status
    }

    pub fn permalink(&self) -> &str {
        &self.message.permalink
    }
}

/// Result of [`Opportunity::after_stage_one`].
#[derive(Debug, Clone, PartialEq)]
pub enum StageOneOutcome {
    /// Stage one was terminal; stage two must not run.
    Done(Opportunity),
    /// Stage one found potential; stage two must run.
    Continue(PendingOpportunity),
}

/// An opportunity waiting for its stage-two result.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingOpportunity {
    message: Message,
    stage_one: ValidationResult,
    discovery: Discovery,
}

impl PendingOpportunity {
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn complete(self, stage_two: ValidationResult) -> Opportunity {
        Opportunity {
            message: self.message,
            stage_one: self.stage_one,
            stage_two: Some(stage_two),
            discovery: self.discovery,
        }
    }
}

/// An opportunity read back from storage together with its audit columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredOpportunity {
    pub id: i64,
    pub opportunity: Opportunity,
    pub manual_status: Option<String>,
    pub processed_at: DateTime<Utc>,
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of external system an adapter talks to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Source,
    Classifier,
    Storage,
    Sink,
}
