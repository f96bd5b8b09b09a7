// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion between serenity models and Leadhound domain types.
//!
//! Everything here is synchronous so the gateway handler never holds a
//! cache reference across an await point.

use chrono::{DateTime, Utc};
use leadhound_core::{ChannelInfo, RawMessage, SourceError};
use serenity::cache::Cache;
use serenity::model::channel::{ChannelType, GuildChannel, Message};
use serenity::model::guild::GuildInfo;
use serenity::model::permissions::Permissions;
use serenity::model::user::User;

/// First millisecond of 2015, the zero point of Discord snowflakes.
pub const DISCORD_EPOCH_MS: u64 = 1_420_070_400_000;

/// Creation time encoded in a Discord snowflake id.
pub fn snowflake_timestamp(id: u64) -> DateTime<Utc> {
    let millis = (id >> 22).saturating_add(DISCORD_EPOCH_MS);
    i64::try_from(millis)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Web link to a message. Direct messages use the `@me` guild segment.
pub fn permalink(guild_id: Option<u64>, channel_id: u64, message_id: u64) -> String {
    match guild_id {
        Some(guild) => format!("https://discord.com/channels/{guild}/{channel_id}/{message_id}"),
        None => format!("https://discord.com/channels/@me/{channel_id}/{message_id}"),
    }
}

/// Guilds returned per listing page; the API maximum.
pub const GUILD_PAGE: u64 = 200;

/// Guild id to continue the listing after, or `None` once a short page
/// shows the listing is complete.
pub fn next_guild_cursor(page_len: usize, last_id: Option<u64>) -> Option<u64> {
    if (page_len as u64) < GUILD_PAGE {
        return None;
    }
    last_id
}

/// True when the account may open the channel and read its history.
pub fn can_read_history(permissions: Permissions) -> bool {
    permissions.contains(Permissions::VIEW_CHANNEL | Permissions::READ_MESSAGE_HISTORY)
}

/// Channel kinds whose history is read during backfill.
pub fn is_text_channel(kind: ChannelType) -> bool {
    matches!(kind, ChannelType::Text | ChannelType::News)
}

fn display_name(user: &User) -> String {
    user.global_name.clone().unwrap_or_else(|| user.name.clone())
}

/// Converts a history or gateway message. The timestamp comes from the
/// snowflake so it keeps millisecond precision.
///
/// History responses omit `guild_id`; callers fill it from the channel.
pub fn to_raw_message(msg: &Message, guild_id: Option<u64>) -> RawMessage {
    let guild_id = msg.guild_id.map(|g| g.get()).or(guild_id);
    let id = msg.id.get();
    let channel_id = msg.channel_id.get();
    RawMessage {
        id,
        channel_id,
        guild_id,
        author_id: msg.author.id.get(),
        author_name: display_name(&msg.author),
        content: msg.content.clone(),
        timestamp: snowflake_timestamp(id),
        permalink: permalink(guild_id, channel_id, id),
    }
}

/// Builds discovery info for one guild channel.
pub fn channel_info(guild: &GuildInfo, channel: &GuildChannel) -> ChannelInfo {
    ChannelInfo {
        id: channel.id.get(),
        name: channel.name.clone(),
        guild_id: Some(guild.id.get()),
        guild_name: Some(guild.name.clone()),
        last_activity: channel
            .last_message_id
            .map(|id| snowflake_timestamp(id.get())),
    }
}

/// Resolves guild and channel names for a gateway message from the cache.
///
/// Threads and uncached channels fall back to the numeric id.
pub fn live_channel(cache: &Cache, msg: &Message) -> ChannelInfo {
    let channel_id = msg.channel_id.get();
    let fallback = channel_id.to_string();
    let Some(guild_id) = msg.guild_id else {
        return ChannelInfo {
            id: channel_id,
            name: "direct message".to_string(),
            guild_id: None,
            guild_name: None,
            last_activity: None,
        };
    };
    let (guild_name, channel_name) = match cache.guild(guild_id) {
        Some(guild) => (
            Some(guild.name.clone()),
            guild.channels.get(&msg.channel_id).map(|c| c.name.clone()),
        ),
        None => (None, None),
    };
    ChannelInfo {
        id: channel_id,
        name: channel_name.unwrap_or(fallback),
        guild_id: Some(guild_id.get()),
        guild_name,
        last_activity: None,
    }
}

/// HTTP status carried by a failed serenity request, if any.
pub fn status_of(err: &serenity::Error) -> Option<u16> {
    match err {
        serenity::Error::Http(http) => http.status_code().map(|s| s.as_u16()),
        _ => None,
    }
}

/// Maps a history request failure onto the crawler's error protocol.
///
/// serenity already waits out the rate-limit buckets it knows about, so a
/// 429 reaching us carries no usable retry-after and the crawler's fallback
/// delay applies.
pub fn history_error(status: Option<u16>, channel_id: u64, message: String) -> SourceError {
    match status {
        Some(403) => SourceError::Forbidden { channel_id },
        Some(429) => SourceError::RateLimited { retry_after: None },
        _ => SourceError::Transport {
            message,
            source: None,
        },
    }
}
