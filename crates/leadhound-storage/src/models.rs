// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types and their conversion to and from domain types.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use leadhound_core::{
    AccountIdentity, Discovery, LeadhoundError, Message, Opportunity, SourceMode,
    StoredOpportunity, ValidationResult, ValidationStatus,
};
use serde::Serialize;

use crate::database::TIMESTAMP_FORMAT;

/// Column list shared by inserts and selects, in row order.
pub(crate) const OPPORTUNITY_COLUMNS: &str = "message_id, message_url, channel_id, channel_name, \
     guild_id, guild_name, author_id, author_name, content, message_timestamp, keyword, \
     stage_one_status, stage_one_score, stage_one_reason, stage_one_lead_type, stage_one_tags, \
     stage_two_status, stage_two_score, stage_two_reason, stage_two_lead_type, stage_two_tags, \
     final_status, account_id, account_name, source_mode, processed_at";

/// Flat, SQL-shaped copy of an opportunity.
#[derive(Debug, Clone)]
pub(crate) struct OpportunityRow {
    pub message_id: String,
    pub message_url: String,
    pub channel_id: String,
    pub channel_name: String,
    pub guild_id: Option<String>,
    pub guild_name: Option<String>,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub message_timestamp: String,
    pub keyword: Option<String>,
    pub stage_one: StageColumns,
    pub stage_two: Option<StageColumns>,
    pub final_status: String,
    pub account_id: String,
    pub account_name: String,
    pub source_mode: String,
    pub processed_at: String,
}

#[derive(Debug, Clone)]
pub(crate) struct StageColumns {
    pub status: String,
    pub score: f64,
    pub reason: Option<String>,
    pub lead_type: Option<String>,
    pub tags: Option<String>,
}

impl StageColumns {
    fn from_result(result: &ValidationResult) -> Self {
        Self {
            status: result.status.to_string(),
            score: result.score,
            reason: result.reason.clone(),
            lead_type: result.lead_type.clone(),
            tags: result
                .tags
                .as_ref()
                .and_then(|t| serde_json::to_string(t).ok()),
        }
    }

    fn into_result(self) -> Result<ValidationResult, LeadhoundError> {
        let status = ValidationStatus::from_str(&self.status).map_err(|_| {
            LeadhoundError::storage(format!("unknown status `{}` in row", self.status))
        })?;
        let tags = match self.tags {
            Some(json) => Some(serde_json::from_str::<Vec<String>>(&json).map_err(|e| {
                LeadhoundError::Storage {
                    source: Box::new(e),
                }
            })?),
            None => None,
        };
        Ok(ValidationResult {
            status,
            score: self.score,
            reason: self.reason,
            lead_type: self.lead_type,
            tags,
        })
    }
}

impl OpportunityRow {
    pub fn from_opportunity(opportunity: &Opportunity, processed_at: &str) -> Self {
        let message = opportunity.message();
        let discovery = opportunity.discovery();
        Self {
            message_id: message.id.to_string(),
            message_url: message.permalink.clone(),
            channel_id: message.channel_id.to_string(),
            channel_name: message.channel_name.clone(),
            guild_id: message.guild_id.map(|id| id.to_string()),
            guild_name: message.guild_name.clone(),
            author_id: message.author_id.to_string(),
            author_name: message.author_name.clone(),
            content: message.content.clone(),
            message_timestamp: format_timestamp(&message.timestamp),
            keyword: message.keyword.clone(),
            stage_one: StageColumns::from_result(opportunity.stage_one()),
            stage_two: opportunity.stage_two().map(StageColumns::from_result),
            final_status: opportunity.final_status().to_string(),
            account_id: discovery.account.id.to_string(),
            account_name: discovery.account.name.clone(),
            source_mode: discovery.mode.to_string(),
            processed_at: processed_at.to_string(),
        }
    }

    /// Reads a row selected with `id, manual_status, <OPPORTUNITY_COLUMNS>`.
    pub fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<(i64, String, Self)> {
        let stage_two_status: Option<String> = row.get(18)?;
        let stage_two = match stage_two_status {
            Some(status) => Some(StageColumns {
                status,
                score: row.get::<_, Option<f64>>(19)?.unwrap_or_default(),
                reason: row.get(20)?,
                lead_type: row.get(21)?,
                tags: row.get(22)?,
            }),
            None => None,
        };
        Ok((
            row.get(0)?,
            row.get(1)?,
            Self {
                message_id: row.get(2)?,
                message_url: row.get(3)?,
                channel_id: row.get(4)?,
                channel_name: row.get(5)?,
                guild_id: row.get(6)?,
                guild_name: row.get(7)?,
                author_id: row.get(8)?,
                author_name: row.get(9)?,
                content: row.get(10)?,
                message_timestamp: row.get(11)?,
                keyword: row.get(12)?,
                stage_one: StageColumns {
                    status: row.get(13)?,
                    score: row.get(14)?,
                    reason: row.get(15)?,
                    lead_type: row.get(16)?,
                    tags: row.get(17)?,
                },
                stage_two,
                final_status: row.get(23)?,
                account_id: row.get(24)?,
                account_name: row.get(25)?,
                source_mode: row.get(26)?,
                processed_at: row.get(27)?,
            },
        ))
    }

    pub fn into_stored(self, id: i64, manual_status: String) -> Result<StoredOpportunity, LeadhoundError> {
        let message = Message {
            id: parse_id(&self.message_id)?,
            channel_id: parse_id(&self.channel_id)?,
            channel_name: self.channel_name,
            guild_id: self.guild_id.as_deref().map(parse_id).transpose()?,
            guild_name: self.guild_name,
            author_id: parse_id(&self.author_id)?,
            author_name: self.author_name,
            content: self.content,
            timestamp: parse_timestamp(&self.message_timestamp)?,
            permalink: self.message_url,
            keyword: self.keyword,
        };
        let mode = SourceMode::from_str(&self.source_mode).map_err(|_| {
            LeadhoundError::storage(format!("unknown source mode `{}`", self.source_mode))
        })?;
        let discovery = Discovery::new(
            AccountIdentity::new(parse_id(&self.account_id)?, self.account_name),
            mode,
        );
        let opportunity = Opportunity::from_parts(
            message,
            self.stage_one.into_result()?,
            self.stage_two.map(StageColumns::into_result).transpose()?,
            discovery,
        )?;
        Ok(StoredOpportunity {
            id,
            opportunity,
            manual_status: (manual_status != "n/a").then_some(manual_status),
            processed_at: parse_timestamp(&self.processed_at)?,
        })
    }
}

/// Opportunity counts for one server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerStats {
    pub guild_name: String,
    pub keyword_hits: u64,
    pub qualified: u64,
    pub manually_approved: u64,
}

/// Opportunity counts for one matched keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordStats {
    pub keyword: String,
    pub mentions: u64,
    pub qualified: u64,
    pub manually_approved: u64,
}

fn rate(part: u64, whole: u64) -> f64 {
    if whole == 0 { 0.0 } else { part as f64 / whole as f64 }
}

impl ServerStats {
    /// Share of keyword hits the classifier qualified as leads.
    pub fn qualification_rate(&self) -> f64 {
        rate(self.qualified, self.keyword_hits)
    }

    /// Share of qualified leads a reviewer approved.
    pub fn approval_rate(&self) -> f64 {
        rate(self.manually_approved, self.qualified)
    }
}

impl KeywordStats {
    pub fn qualification_rate(&self) -> f64 {
        rate(self.qualified, self.mentions)
    }

    pub fn approval_rate(&self) -> f64 {
        rate(self.manually_approved, self.qualified)
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, LeadhoundError> {
    DateTime::parse_from_rfc3339(s)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| LeadhoundError::Storage {
            source: Box::new(e),
        })
}

fn parse_id(s: &str) -> Result<u64, LeadhoundError> {
    s.parse().map_err(|e| LeadhoundError::Storage {
        source: Box::new(e),
    })
}
