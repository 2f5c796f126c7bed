//! Telegram adapter (teloxide).
//!
//! This crate implements the `qarelay-core` SessionConnector over the Telegram Bot API.
//! The sender id of an inbound message is its chat id, so replies land in the same chat.

use async_trait::async_trait;

use teloxide::prelude::*;

pub mod handlers;
pub mod router;

use qarelay_core::{domain::SenderId, errors::Error, messaging::port::SessionConnector, Result};

#[derive(Clone)]
pub struct TelegramConnector {
    bot: Bot,
}

impl TelegramConnector {
    pub fn new(token: impl Into<String>) -> Self {
        Self::from_bot(Bot::new(token))
    }

    pub fn from_bot(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::Transport(format!("telegram error: {e}"))
    }
}

/// Sender id for a Telegram chat.
pub fn sender_for_chat(chat_id: teloxide::types::ChatId) -> SenderId {
    SenderId(chat_id.0.to_string())
}

/// Telegram chat a sender id points back to.
pub fn chat_for_sender(sender: &SenderId) -> Result<teloxide::types::ChatId> {
    sender
        .as_str()
        .trim()
        .parse::<i64>()
        .map(teloxide::types::ChatId)
        .map_err(|_| Error::External(format!("not a telegram chat id: '{sender}'")))
}

#[async_trait]
impl SessionConnector for TelegramConnector {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send_text(&self, to: &SenderId, text: &str) -> Result<()> {
        let chat = chat_for_sender(to)?;
        self.bot
            .send_message(chat, text.to_string())
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }
}
