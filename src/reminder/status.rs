use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Urgency tier derived from how close a renewal is. Never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RenewalStatus {
    Active,
    Warning,
    Urgent,
    Critical,
}

impl std::fmt::Display for RenewalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenewalStatus::Active => write!(f, "active"),
            RenewalStatus::Warning => write!(f, "warning"),
            RenewalStatus::Urgent => write!(f, "urgent"),
            RenewalStatus::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for RenewalStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(RenewalStatus::Active),
            "warning" => Ok(RenewalStatus::Warning),
            "urgent" => Ok(RenewalStatus::Urgent),
            "critical" => Ok(RenewalStatus::Critical),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

/// Whole calendar days from `now`'s UTC date until `renewal_date`.
///
/// Negative once the renewal date has passed. Time of day is ignored.
pub fn days_until_renewal(renewal_date: NaiveDate, now: DateTime<Utc>) -> i64 {
    (renewal_date - now.date_naive()).num_days()
}

pub fn classify(renewal_date: NaiveDate, now: DateTime<Utc>) -> RenewalStatus {
    classify_days(days_until_renewal(renewal_date, now))
}

pub fn classify_days(days: i64) -> RenewalStatus {
    match days {
        // Expired renewals stay critical.
        i64::MIN..=5 => RenewalStatus::Critical,
        6..=14 => RenewalStatus::Urgent,
        15..=30 => RenewalStatus::Warning,
        _ => RenewalStatus::Active,
    }
}
