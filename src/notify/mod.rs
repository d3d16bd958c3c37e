pub mod email;
pub mod formatters;
pub mod telegram;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::info;

use crate::{
    config::{Config, NotifyChannel},
    error::Result,
    reminder::status::days_until_renewal,
    storage::models::{BillingPeriod, Subscription},
};

pub use email::EmailNotifier;
pub use telegram::TelegramNotifier;

/// What a reminder message says about one subscription.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReminderSummary {
    pub name: String,
    pub cost: f64,
    pub billing_period: BillingPeriod,
    pub renewal_date: NaiveDate,
    pub website: Option<String>,
    pub days_until_renewal: i64,
}

impl ReminderSummary {
    pub fn from_subscription(subscription: &Subscription, now: DateTime<Utc>) -> Self {
        Self {
            name: subscription.name.clone(),
            cost: subscription.cost,
            billing_period: subscription.billing_period,
            renewal_date: subscription.renewal_date,
            website: subscription.official_website.clone(),
            days_until_renewal: days_until_renewal(subscription.renewal_date, now),
        }
    }
}

/// Delivers one reminder to one destination.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, destination: &str, summary: &ReminderSummary) -> Result<()>;

    /// Short channel name for logs.
    fn channel(&self) -> &'static str;
}

/// Build the notifier for the configured channel, if that channel is set up.
pub fn build_notifier(config: &Config) -> Result<Option<Box<dyn Notifier>>> {
    match config.reminder.channel {
        NotifyChannel::Email => match config.email_settings() {
            Some(email) => Ok(Some(Box::new(EmailNotifier::new(email)?))),
            None => {
                info!("Email reminders disabled - no email API key configured");
                Ok(None)
            }
        },
        NotifyChannel::Telegram => match config.telegram_settings() {
            Some(telegram) => Ok(Some(Box::new(TelegramNotifier::new(telegram)))),
            None => {
                info!("Telegram reminders disabled in config");
                Ok(None)
            }
        },
    }
}
