use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, Result};

/// Threshold used by the manual due check when a record has none set.
pub const DEFAULT_REMINDER_DAYS: u32 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subscription {
    pub id: i64,
    pub name: String,
    pub cost: f64,
    pub billing_period: BillingPeriod,
    pub renewal_date: NaiveDate,
    pub reminder_days: Option<u32>,
    pub official_website: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub last_reminder_sent: Option<DateTime<Utc>>,
    pub reminder_acknowledged: Option<DateTime<Utc>>,
}

impl Subscription {
    pub fn reminder_days_or_default(&self) -> u32 {
        self.reminder_days.unwrap_or(DEFAULT_REMINDER_DAYS)
    }

    /// Cost normalised to one month.
    pub fn monthly_cost(&self) -> f64 {
        match self.billing_period {
            BillingPeriod::Monthly => self.cost,
            BillingPeriod::Yearly => self.cost / 12.0,
        }
    }

    /// Cost normalised to one year.
    pub fn yearly_cost(&self) -> f64 {
        match self.billing_period {
            BillingPeriod::Monthly => self.cost * 12.0,
            BillingPeriod::Yearly => self.cost,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BillingPeriod {
    Monthly,
    Yearly,
}

impl BillingPeriod {
    /// Unit used in "$20/month" style strings.
    pub fn unit(&self) -> &'static str {
        match self {
            BillingPeriod::Monthly => "month",
            BillingPeriod::Yearly => "year",
        }
    }
}

impl std::fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BillingPeriod::Monthly => write!(f, "monthly"),
            BillingPeriod::Yearly => write!(f, "yearly"),
        }
    }
}

impl std::str::FromStr for BillingPeriod {
    type Err = ReminderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "month" => Ok(BillingPeriod::Monthly),
            "yearly" | "year" | "annual" => Ok(BillingPeriod::Yearly),
            other => Err(ReminderError::InvalidInput(format!(
                "unknown billing period '{}', expected monthly or yearly",
                other
            ))),
        }
    }
}

/// Fields accepted when creating a subscription.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub name: String,
    pub cost: f64,
    pub billing_period: BillingPeriod,
    pub renewal_date: NaiveDate,
    pub reminder_days: Option<u32>,
    pub official_website: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl NewSubscription {
    pub fn new(
        name: impl Into<String>,
        cost: f64,
        billing_period: BillingPeriod,
        renewal_date: NaiveDate,
    ) -> Self {
        Self {
            name: name.into(),
            cost,
            billing_period,
            renewal_date,
            reminder_days: None,
            official_website: None,
            category: None,
            notes: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ReminderError::InvalidInput(
                "name must not be empty".to_string(),
            ));
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(ReminderError::InvalidInput(format!(
                "cost must be a non-negative amount, got {}",
                self.cost
            )));
        }
        validate_reminder_days(self.reminder_days)?;
        Ok(())
    }
}

/// Edits to an existing record. `None` keeps the current value; an empty
/// string clears an optional text field.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    pub name: Option<String>,
    pub cost: Option<f64>,
    pub billing_period: Option<BillingPeriod>,
    pub official_website: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
}

impl SubscriptionUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.cost.is_none()
            && self.billing_period.is_none()
            && self.official_website.is_none()
            && self.category.is_none()
            && self.notes.is_none()
    }

    /// The record as it would look after this update, ready for validation.
    pub fn apply_to(&self, current: &Subscription) -> NewSubscription {
        NewSubscription {
            name: self.name.clone().unwrap_or_else(|| current.name.clone()),
            cost: self.cost.unwrap_or(current.cost),
            billing_period: self.billing_period.unwrap_or(current.billing_period),
            renewal_date: current.renewal_date,
            reminder_days: current.reminder_days,
            official_website: merge_text(&self.official_website, &current.official_website),
            category: merge_text(&self.category, &current.category),
            notes: merge_text(&self.notes, &current.notes),
        }
    }
}

fn merge_text(change: &Option<String>, current: &Option<String>) -> Option<String> {
    match change {
        Some(value) if value.trim().is_empty() => None,
        Some(value) => Some(value.trim().to_string()),
        None => current.clone(),
    }
}

pub fn validate_reminder_days(days: Option<u32>) -> Result<()> {
    match days {
        Some(0) => Err(ReminderError::InvalidInput(
            "reminder days must be at least 1".to_string(),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> NewSubscription {
        NewSubscription::new(
            "ChatGPT Plus",
            20.0,
            BillingPeriod::Monthly,
            NaiveDate::from_ymd_opt(2026, 11, 1).expect("valid date"),
        )
    }

    #[test]
    fn validation_rejects_bad_input() {
        assert!(sample().validate().is_ok());

        let mut blank = sample();
        blank.name = "  ".to_string();
        assert!(blank.validate().is_err());

        let mut negative = sample();
        negative.cost = -1.0;
        assert!(negative.validate().is_err());

        let mut nan = sample();
        nan.cost = f64::NAN;
        assert!(nan.validate().is_err());

        let mut zero_days = sample();
        zero_days.reminder_days = Some(0);
        assert!(zero_days.validate().is_err());
    }

    #[test]
    fn update_keeps_untouched_fields_and_clears_blank_ones() {
        let new = sample();
        let current = Subscription {
            id: 7,
            name: new.name.clone(),
            cost: new.cost,
            billing_period: new.billing_period,
            renewal_date: new.renewal_date,
            reminder_days: Some(10),
            official_website: Some("https://openai.com".to_string()),
            category: Some("AI".to_string()),
            notes: None,
            last_reminder_sent: None,
            reminder_acknowledged: None,
        };

        assert!(SubscriptionUpdate::default().is_empty());

        let update = SubscriptionUpdate {
            cost: Some(200.0),
            billing_period: Some(BillingPeriod::Yearly),
            category: Some(" ".to_string()),
            notes: Some("team plan".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());

        let merged = update.apply_to(&current);
        assert_eq!(merged.name, "ChatGPT Plus");
        assert_eq!(merged.cost, 200.0);
        assert_eq!(merged.billing_period, BillingPeriod::Yearly);
        assert_eq!(merged.renewal_date, current.renewal_date);
        assert_eq!(merged.reminder_days, Some(10));
        assert_eq!(merged.official_website.as_deref(), Some("https://openai.com"));
        assert_eq!(merged.category, None);
        assert_eq!(merged.notes.as_deref(), Some("team plan"));
    }

    #[test]
    fn billing_period_parses_loosely() {
        assert_eq!("Monthly".parse::<BillingPeriod>().ok(), Some(BillingPeriod::Monthly));
        assert_eq!("annual".parse::<BillingPeriod>().ok(), Some(BillingPeriod::Yearly));
        assert!("weekly".parse::<BillingPeriod>().is_err());
    }
}
