use async_trait::async_trait;
use teloxide::prelude::*;

use common::{Error, Notifier, Result};

/// Delivers signal text to Telegram chats.
#[derive(Clone)]
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, recipient: i64, text: &str) -> Result<()> {
        self.bot
            .send_message(ChatId(recipient), text)
            .await
            .map_err(|e| Error::Notify(e.to_string()))?;
        Ok(())
    }
}
