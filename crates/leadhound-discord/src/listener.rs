// SPDX-FileCopyrightText: 2026 Leadhound Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway listener feeding live messages into the pipeline.

use std::sync::OnceLock;

use async_trait::async_trait;
use leadhound_config::model::DiscordAccount;
use leadhound_core::{AccountIdentity, IncomingMessage, LeadhoundError};
use serenity::all::{Client, Context, EventHandler, GatewayIntents, Message, Ready};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::handler::{live_channel, to_raw_message};

/// Gateway intents needed to see guild message text.
///
/// `MESSAGE_CONTENT` is privileged and must be enabled for the bot in the
/// developer portal.
pub fn intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
}

/// serenity event handler for one account.
struct Listener {
    account_name: String,
    identity: OnceLock<AccountIdentity>,
    tx: mpsc::Sender<IncomingMessage>,
}

#[async_trait]
impl EventHandler for Listener {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        let identity = AccountIdentity::new(ready.user.id.get(), &self.account_name);
        info!(
            account = %self.account_name,
            user = %ready.user.name,
            guilds = ready.guilds.len(),
            "discord listener connected"
        );
        // Reconnects deliver Ready again with the same user.
        let _ = self.identity.set(identity);
    }

    async fn message(&self, ctx: Context, msg: Message) {
        let Some(identity) = self.identity.get() else {
            return;
        };
        if msg.author.id.get() == identity.id {
            return;
        }

        let channel = live_channel(&ctx.cache, &msg);
        let Some(message) = channel.to_message(to_raw_message(&msg, None)) else {
            debug!(message_id = msg.id.get(), "ignoring message without text");
            return;
        };

        let incoming = IncomingMessage {
            message,
            received_by: identity.clone(),
        };
        if self.tx.send(incoming).await.is_err() {
            debug!(account = %self.account_name, "live pipeline closed, dropping message");
        }
    }
}

/// Connects one account to the gateway and forwards its messages until
/// `shutdown` fires or the connection fails for good.
///
/// The sender is dropped when this returns, so the pipeline sees its input
/// close once every listener has stopped.
pub async fn run_listener(
    account: &DiscordAccount,
    tx: mpsc::Sender<IncomingMessage>,
    shutdown: CancellationToken,
) -> Result<(), LeadhoundError> {
    let handler = Listener {
        account_name: account.name.clone(),
        identity: OnceLock::new(),
        tx,
    };
    let mut client = Client::builder(&account.token, intents())
        .event_handler(handler)
        .await
        .map_err(|e| LeadhoundError::Source {
            message: format!("failed to create discord client for {}: {e}", account.name),
            source: None,
        })?;
    let shards = client.shard_manager.clone();

    tokio::select! {
        result = client.start() => {
            if let Err(e) = result {
                warn!(account = %account.name, error = %e, "discord gateway stopped");
                return Err(LeadhoundError::Source {
                    message: format!("discord gateway for {} stopped: {e}", account.name),
                    source: None,
                });
            }
        }
        _ = shutdown.cancelled() => {
            info!(account = %account.name, "disconnecting discord listener");
            shards.shutdown_all().await;
        }
    }
    Ok(())
}
