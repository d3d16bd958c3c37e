use chrono::{DateTime, Utc};

use crate::{reminder::status::days_until_renewal, storage::models::Subscription};

/// The automatic daily pass only fires inside this many days of renewal.
///
/// Deliberately independent of `Subscription::reminder_days`, which only
/// drives [`is_reminder_due`].
pub const AUTO_REMINDER_WINDOW_DAYS: i64 = 5;

/// Unacknowledged reminders are re-sent after this many whole days.
pub const RESEND_AFTER_DAYS: i64 = 5;

/// Outcome of evaluating one subscription for the automatic reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    OutsideWindow { days: i64 },
    NeverSent,
    ResendUnacknowledged,
    NewCycle,
    SentRecently,
    Acknowledged,
}

impl Eligibility {
    pub fn should_notify(&self) -> bool {
        matches!(
            self,
            Eligibility::NeverSent | Eligibility::ResendUnacknowledged | Eligibility::NewCycle
        )
    }
}

impl std::fmt::Display for Eligibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Eligibility::OutsideWindow { days } => {
                write!(f, "outside reminder window ({} days until renewal)", days)
            }
            Eligibility::NeverSent => write!(f, "no reminder sent this cycle"),
            Eligibility::ResendUnacknowledged => {
                write!(f, "reminder unacknowledged for {}+ days", RESEND_AFTER_DAYS)
            }
            Eligibility::NewCycle => write!(f, "acknowledgment predates current renewal"),
            Eligibility::SentRecently => write!(f, "reminder sent recently"),
            Eligibility::Acknowledged => write!(f, "reminder already acknowledged"),
        }
    }
}

/// Decide whether today's automatic pass should remind about `subscription`.
///
/// Inside the window a reminder goes out when:
/// 1. none has been sent, or
/// 2. the last one is unacknowledged and at least [`RESEND_AFTER_DAYS`] old, or
/// 3. the acknowledgment is older than the current renewal date.
pub fn evaluate(subscription: &Subscription, now: DateTime<Utc>) -> Eligibility {
    let days = days_until_renewal(subscription.renewal_date, now);
    if !(0..=AUTO_REMINDER_WINDOW_DAYS).contains(&days) {
        return Eligibility::OutsideWindow { days };
    }

    let Some(last_sent) = subscription.last_reminder_sent else {
        return Eligibility::NeverSent;
    };

    match subscription.reminder_acknowledged {
        None if (now - last_sent).num_days() >= RESEND_AFTER_DAYS => {
            Eligibility::ResendUnacknowledged
        }
        None => Eligibility::SentRecently,
        Some(acknowledged) if renewal_start(subscription) > acknowledged => Eligibility::NewCycle,
        Some(_) => Eligibility::Acknowledged,
    }
}

pub fn should_notify(subscription: &Subscription, now: DateTime<Utc>) -> bool {
    evaluate(subscription, now).should_notify()
}

/// Manual check: is the renewal within the record's own reminder threshold?
pub fn is_reminder_due(subscription: &Subscription, now: DateTime<Utc>) -> bool {
    let days = days_until_renewal(subscription.renewal_date, now);
    let threshold = i64::from(subscription.reminder_days_or_default());
    (0..=threshold).contains(&days)
}

fn renewal_start(subscription: &Subscription) -> DateTime<Utc> {
    subscription
        .renewal_date
        .and_time(chrono::NaiveTime::MIN)
        .and_utc()
}
