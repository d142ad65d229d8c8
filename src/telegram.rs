//! Telegram long-polling adapter
//!
//! Turns incoming text messages into `Inbound` values for the session
//! manager and delivers replies, with their quick-reply keyboards, back to
//! the chat.

use crate::runtime::{Inbound, ProductionManager, ReplySink};
use crate::state_machine::{Keyboard, Reply, UserId};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{KeyboardButton, KeyboardMarkup};

/// Reply sink backed by the Bot API
pub struct TelegramSink {
    bot: Bot,
}

impl TelegramSink {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ReplySink for TelegramSink {
    async fn send_reply(&self, user_id: UserId, reply: &Reply) -> Result<(), String> {
        let request = self.bot.send_message(ChatId(user_id.0), reply.text.as_str());
        let result = match &reply.keyboard {
            Some(keyboard) => request.reply_markup(keyboard_markup(keyboard)).await,
            None => request.await,
        };
        result.map(|_| ()).map_err(|e| e.to_string())
    }
}

/// Render a quick-reply keyboard as a Telegram reply keyboard
pub fn keyboard_markup(keyboard: &Keyboard) -> KeyboardMarkup {
    let rows = keyboard
        .rows
        .iter()
        .map(|row| row.iter().map(KeyboardButton::new).collect::<Vec<_>>());

    let markup = KeyboardMarkup::new(rows).resize_keyboard();
    if keyboard.one_time {
        markup.one_time_keyboard()
    } else {
        markup
    }
}

/// Poll for updates until Ctrl-C, forwarding every text message
pub async fn run_polling(bot: Bot, manager: Arc<ProductionManager>) {
    let handler = Update::filter_message().endpoint(forward_message);

    tracing::info!("Polling Telegram for updates");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![manager])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    tracing::info!("Telegram polling stopped");
}

async fn forward_message(msg: Message, manager: Arc<ProductionManager>) -> ResponseResult<()> {
    // Stickers, photos and the like carry no text to react to
    let Some(text) = msg.text() else {
        tracing::debug!(chat_id = msg.chat.id.0, "Ignoring non-text message");
        return Ok(());
    };

    let user_id = UserId(msg.chat.id.0);
    if let Err(e) = manager.dispatch(Inbound::new(user_id, text)).await {
        tracing::error!(%user_id, error = %e, "Failed to dispatch message");
    }

    Ok(())
}
