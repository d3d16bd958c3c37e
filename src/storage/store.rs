use chrono::{DateTime, Utc};

use crate::{error::Result, storage::models::Subscription};

/// The slice of persistence the reminder scheduler needs.
#[cfg_attr(test, mockall::automock)]
pub trait SubscriptionStore {
    /// Full snapshot of every subscription.
    fn list_subscriptions(&self) -> Result<Vec<Subscription>>;

    fn set_last_reminder_sent(&self, id: i64, at: DateTime<Utc>) -> Result<()>;
}
