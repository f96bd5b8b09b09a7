// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for domain values with sensible test defaults.

use chrono::{DateTime, Duration, Utc};
use leadhound_core::{
    AccountIdentity, ChannelInfo, Discovery, Message, Opportunity, RawMessage, SourceMode,
    ValidationResult, ValidationStatus,
};

pub const GUILD_ID: u64 = 1;

pub fn permalink(channel_id: u64, message_id: u64) -> String {
    format!("https://discord.com/channels/{GUILD_ID}/{channel_id}/{message_id}")
}

pub fn account() -> AccountIdentity {
    AccountIdentity::new(900, "scout")
}

pub fn discovery(mode: SourceMode) -> Discovery {
    Discovery::new(account(), mode)
}

/// A channel whose newest message is `active_minutes_ago` old.
pub fn channel(id: u64, name: &str, active_minutes_ago: i64) -> ChannelInfo {
    ChannelInfo {
        id,
        name: name.to_string(),
        guild_id: Some(GUILD_ID),
        guild_name: Some("Test Guild".to_string()),
        last_activity: Some(Utc::now() - Duration::minutes(active_minutes_ago)),
    }
}

pub fn raw_message(channel_id: u64, id: u64, content: &str, timestamp: DateTime<Utc>) -> RawMessage {
    RawMessage {
        id,
        channel_id,
        guild_id: Some(GUILD_ID),
        author_id: 4242,
        author_name: "poster".to_string(),
        content: content.to_string(),
        timestamp,
        permalink: permalink(channel_id, id),
    }
}

/// A newest-first history of `count` messages spaced one minute apart,
/// the newest `newest_minutes_ago` old. Ids descend from `first_id + count - 1`.
pub fn history(
    channel_id: u64,
    first_id: u64,
    count: u64,
    newest_minutes_ago: i64,
    content: &str,
) -> Vec<RawMessage> {
    let newest = Utc::now() - Duration::minutes(newest_minutes_ago);
    (0..count)
        .map(|i| {
            raw_message(
                channel_id,
                first_id + count - 1 - i,
                content,
                newest - Duration::minutes(i as i64),
            )
        })
        .collect()
}

pub fn message(channel_id: u64, id: u64, content: &str) -> Message {
    Message {
        id,
        channel_id,
        channel_name: "general".to_string(),
        guild_id: Some(GUILD_ID),
        guild_name: Some("Test Guild".to_string()),
        author_id: 4242,
        author_name: "poster".to_string(),
        content: content.to_string(),
        timestamp: Utc::now(),
        permalink: permalink(channel_id, id),
        keyword: None,
    }
}

/// An opportunity with the given final status.
pub fn opportunity(channel_id: u64, id: u64, status: ValidationStatus) -> Opportunity {
    let message = message(channel_id, id, "we are hiring");
    let discovery = discovery(SourceMode::Backfill);
    let parts = match status {
        ValidationStatus::Error => (ValidationResult::error("stage one failed"), None),
        ValidationStatus::Unrelevant => (
            ValidationResult::new(ValidationStatus::Unrelevant, 0.0, "junk"),
            None,
        ),
        other => (
            ValidationResult::new(ValidationStatus::PossiblyRelevant, 0.5, "potential"),
            Some(ValidationResult::new(other, 0.9, "scored")),
        ),
    };
    match Opportunity::from_parts(message, parts.0, parts.1, discovery) {
        Ok(opportunity) => opportunity,
        Err(e) => panic!("fixture produced an invalid opportunity: {e}"),
    }
}
