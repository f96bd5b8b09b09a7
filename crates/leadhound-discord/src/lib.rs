// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discord adapter for Leadhound.
//!
//! [`DiscordSource`] reads guild channel history over the REST API for
//! backfill. [`run_listener`] connects an account to the gateway and feeds
//! new messages to the live pipeline.

pub mod handler;
pub mod listener;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use leadhound_config::model::DiscordAccount;
use leadhound_core::{
    AccountIdentity, AdapterType, ChannelInfo, HealthStatus, HistoryPageRequest, LeadhoundError,
    MessageSource, PluginAdapter, RawMessage, SourceError,
};
use serenity::builder::GetMessages;
use serenity::http::{GuildPagination, Http};
use serenity::model::guild::{GuildInfo, Member, PartialGuild};
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::handler::{
    GUILD_PAGE, can_read_history, channel_info, history_error, is_text_channel,
    next_guild_cursor, status_of, to_raw_message,
};

pub use listener::{intents, run_listener};

/// Largest page the history endpoint accepts.
const MAX_PAGE: u16 = 100;

/// Message source backed by one bot account.
#[derive(Debug)]
pub struct DiscordSource {
    http: Arc<Http>,
    account: AccountIdentity,
    /// Channel id to guild id, filled by discovery. History responses do
    /// not carry the guild, which permalinks need.
    guilds: RwLock<HashMap<u64, u64>>,
}

impl DiscordSource {
    /// Authenticates the account and resolves its user id.
    pub async fn connect(account: &DiscordAccount) -> Result<Self, LeadhoundError> {
        let http = Arc::new(Http::new(&account.token));
        let me = http
            .get_current_user()
            .await
            .map_err(|e| source_failure(format!("failed to authenticate {}", account.name), e))?;
        info!(account = %account.name, user = %me.name, "discord account authenticated");
        Ok(Self {
            http,
            account: AccountIdentity::new(me.id.get(), &account.name),
            guilds: RwLock::new(HashMap::new()),
        })
    }

    /// Every guild the account belongs to, following the listing pages.
    async fn list_guilds(&self) -> Result<Vec<GuildInfo>, LeadhoundError> {
        let mut guilds = Vec::new();
        let mut after: Option<GuildId> = None;
        loop {
            let page = self
                .http
                .get_guilds(after.map(GuildPagination::After), Some(GUILD_PAGE))
                .await
                .map_err(|e| source_failure("failed to list guilds".into(), e))?;
            let next = next_guild_cursor(page.len(), page.last().map(|g| g.id.get()));
            guilds.extend(page);
            match next {
                Some(id) => after = Some(GuildId::new(id)),
                None => return Ok(guilds),
            }
        }
    }

    /// Roles and membership needed to resolve channel permissions. `None`
    /// when either lookup fails; every channel is then tried.
    async fn guild_access(&self, guild: &GuildInfo) -> Option<(PartialGuild, Member)> {
        let user_id = UserId::new(self.account.id);
        let lookup = tokio::try_join!(
            self.http.get_guild(guild.id),
            self.http.get_member(guild.id, user_id)
        );
        match lookup {
            Ok(access) => Some(access),
            Err(e) => {
                warn!(
                    guild = %guild.name,
                    error = %e,
                    "could not resolve channel permissions, trying every channel"
                );
                None
            }
        }
    }
}

fn source_failure(context: String, err: serenity::Error) -> LeadhoundError {
    LeadhoundError::Source {
        message: format!("{context}: {err}"),
        source: None,
    }
}

#[async_trait]
impl PluginAdapter for DiscordSource {
    fn name(&self) -> &str {
        &self.account.name
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Source
    }

    async fn health_check(&self) -> Result<HealthStatus, LeadhoundError> {
        match self.http.get_current_user().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(format!("get_current_user failed: {e}"))),
        }
    }
}

#[async_trait]
impl MessageSource for DiscordSource {
    fn account(&self) -> &AccountIdentity {
        &self.account
    }

    async fn list_channels(&self) -> Result<Vec<ChannelInfo>, LeadhoundError> {
        let guilds = self.list_guilds().await?;

        let mut channels = Vec::new();
        let mut unreadable = 0usize;
        for guild in &guilds {
            let list = match self.http.get_channels(guild.id).await {
                Ok(list) => list,
                Err(e) => {
                    warn!(
                        guild = %guild.name,
                        error = %e,
                        "skipping guild whose channels could not be listed"
                    );
                    continue;
                }
            };
            let access = self.guild_access(guild).await;
            for channel in list.iter().filter(|c| is_text_channel(c.kind)) {
                let readable = access.as_ref().is_none_or(|(partial, member)| {
                    can_read_history(partial.user_permissions_in(channel, member))
                });
                if readable {
                    channels.push(channel_info(guild, channel));
                } else {
                    unreadable += 1;
                }
            }
        }
        self.guilds
            .write()
            .await
            .extend(channels.iter().filter_map(|c| Some((c.id, c.guild_id?))));
        debug!(
            account = %self.account.name,
            guilds = guilds.len(),
            channels = channels.len(),
            unreadable,
            "listed discord channels"
        );
        Ok(channels)
    }

    async fn fetch_page(&self, request: HistoryPageRequest) -> Result<Vec<RawMessage>, SourceError> {
        if request.channel_id == 0 || request.before == Some(0) {
            return Err(SourceError::Transport {
                message: format!("invalid history request {request:?}"),
                source: None,
            });
        }
        let limit = request.limit.clamp(1, MAX_PAGE) as u8;
        let mut builder = GetMessages::new().limit(limit);
        if let Some(before) = request.before {
            builder = builder.before(MessageId::new(before));
        }

        let messages = ChannelId::new(request.channel_id)
            .messages(&self.http, builder)
            .await
            .map_err(|e| history_error(status_of(&e), request.channel_id, e.to_string()))?;
        let guild_id = self.guilds.read().await.get(&request.channel_id).copied();
        Ok(messages.iter().map(|m| to_raw_message(m, guild_id)).collect())
    }
}
