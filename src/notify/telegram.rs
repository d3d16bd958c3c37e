use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::requests::Requester;
use teloxide::types::{ChatId, ParseMode};
use teloxide::Bot;
use tracing::info;

use crate::{
    config::TelegramConfig,
    error::{ReminderError, Result},
    notify::{formatters, Notifier, ReminderSummary},
};

/// Sends reminders as Telegram messages. The destination is a chat id.
pub struct TelegramNotifier {
    bot: Bot,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            bot: Bot::new(config.bot_token.clone()),
        }
    }
}

pub fn parse_chat_id(destination: &str) -> Result<ChatId> {
    destination
        .trim()
        .parse::<i64>()
        .map(ChatId)
        .map_err(|_| ReminderError::Notify(format!("invalid Telegram chat id '{}'", destination)))
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, destination: &str, summary: &ReminderSummary) -> Result<()> {
        let chat_id = parse_chat_id(destination)?;

        self.bot
            .send_message(chat_id, formatters::telegram_markdown(summary))
            .parse_mode(ParseMode::Markdown)
            .await
            .map_err(|e| ReminderError::Notify(format!("Telegram send failed: {}", e)))?;

        info!("Reminder for {} sent to chat {}", summary.name, chat_id.0);
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_ids_parse() {
        assert_eq!(parse_chat_id(" 123456 ").unwrap(), ChatId(123456));
        assert_eq!(parse_chat_id("-1001234").unwrap(), ChatId(-1001234));
        assert!(matches!(parse_chat_id("me@example.com"), Err(ReminderError::Notify(_))));
    }
}
