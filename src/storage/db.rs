use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::{
    error::{ReminderError, Result},
    reminder::status::{classify, days_until_renewal, RenewalStatus},
    storage::{
        models::{
            validate_reminder_days, BillingPeriod, NewSubscription, Subscription,
            SubscriptionUpdate,
        },
        store::SubscriptionStore,
    },
};

/// Renewals this close count as "upcoming" in the stats view.
const UPCOMING_WINDOW_DAYS: i64 = 14;

const SELECT_COLUMNS: &str = "SELECT id, name, cost, billing_period, renewal_date, reminder_days,
        official_website, category, notes, last_reminder_sent, reminder_acknowledged
     FROM subscriptions";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        // No status column: the renewal tier is always derived on read.
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS subscriptions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                cost REAL NOT NULL,
                billing_period TEXT NOT NULL,
                renewal_date TEXT NOT NULL,
                reminder_days INTEGER,
                official_website TEXT,
                category TEXT,
                notes TEXT,
                last_reminder_sent TEXT,
                reminder_acknowledged TEXT
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_renewal_date ON subscriptions(renewal_date)",
            [],
        )?;

        Ok(())
    }

    pub fn create_subscription(&self, new: &NewSubscription) -> Result<Subscription> {
        new.validate()?;

        self.conn.execute(
            "INSERT INTO subscriptions
             (name, cost, billing_period, renewal_date, reminder_days, official_website, category, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                new.name.trim(),
                new.cost,
                new.billing_period.to_string(),
                new.renewal_date,
                new.reminder_days,
                new.official_website,
                new.category,
                new.notes,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        self.get_subscription(id)?
            .ok_or(ReminderError::SubscriptionNotFound(id))
    }

    pub fn get_subscription(&self, id: i64) -> Result<Option<Subscription>> {
        let query = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let subscription = self
            .conn
            .query_row(&query, [id], row_to_subscription)
            .optional()?;
        Ok(subscription)
    }

    pub fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        let query = format!("{} ORDER BY renewal_date ASC, id ASC", SELECT_COLUMNS);
        let mut stmt = self.conn.prepare(&query)?;

        let subscriptions = stmt
            .query_map([], row_to_subscription)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subscriptions)
    }

    pub fn set_last_reminder_sent(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE subscriptions SET last_reminder_sent = ?1 WHERE id = ?2",
            params![at, id],
        )?;
        ensure_updated(updated, id)
    }

    /// Mark the current cycle's reminder as handled by the user.
    pub fn acknowledge_reminder(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE subscriptions SET reminder_acknowledged = ?1 WHERE id = ?2",
            params![at, id],
        )?;
        ensure_updated(updated, id)
    }

    /// Edit the descriptive fields of a record. Renewal date, reminder days
    /// and reminder timestamps have their own operations.
    pub fn update_subscription(&self, id: i64, update: &SubscriptionUpdate) -> Result<Subscription> {
        let current = self
            .get_subscription(id)?
            .ok_or(ReminderError::SubscriptionNotFound(id))?;
        if update.is_empty() {
            return Ok(current);
        }

        let merged = update.apply_to(&current);
        merged.validate()?;

        let updated = self.conn.execute(
            "UPDATE subscriptions
             SET name = ?1, cost = ?2, billing_period = ?3,
                 official_website = ?4, category = ?5, notes = ?6
             WHERE id = ?7",
            params![
                merged.name.trim(),
                merged.cost,
                merged.billing_period.to_string(),
                merged.official_website,
                merged.category,
                merged.notes,
                id,
            ],
        )?;
        ensure_updated(updated, id)?;

        self.get_subscription(id)?
            .ok_or(ReminderError::SubscriptionNotFound(id))
    }

    /// Roll the renewal date. Reminder timestamps are left alone; the
    /// eligibility rules treat them as belonging to the previous cycle.
    pub fn update_renewal_date(&self, id: i64, renewal_date: NaiveDate) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE subscriptions SET renewal_date = ?1 WHERE id = ?2",
            params![renewal_date, id],
        )?;
        ensure_updated(updated, id)
    }

    pub fn update_reminder_days(&self, id: i64, reminder_days: u32) -> Result<()> {
        validate_reminder_days(Some(reminder_days))?;
        let updated = self.conn.execute(
            "UPDATE subscriptions SET reminder_days = ?1 WHERE id = ?2",
            params![reminder_days, id],
        )?;
        ensure_updated(updated, id)
    }

    pub fn delete_subscription(&self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM subscriptions WHERE id = ?1", [id])?;
        ensure_updated(deleted, id)
    }

    pub fn get_stats(&self, now: DateTime<Utc>) -> Result<DatabaseStats> {
        let subscriptions = self.list_subscriptions()?;
        Ok(DatabaseStats::from_subscriptions(&subscriptions, now))
    }
}

impl SubscriptionStore for Database {
    fn list_subscriptions(&self) -> Result<Vec<Subscription>> {
        Database::list_subscriptions(self)
    }

    fn set_last_reminder_sent(&self, id: i64, at: DateTime<Utc>) -> Result<()> {
        Database::set_last_reminder_sent(self, id, at)
    }
}

fn ensure_updated(rows: usize, id: i64) -> Result<()> {
    if rows == 0 {
        return Err(ReminderError::SubscriptionNotFound(id));
    }
    Ok(())
}

fn row_to_subscription(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    let period: String = row.get(3)?;
    let billing_period = period.parse::<BillingPeriod>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(Subscription {
        id: row.get(0)?,
        name: row.get(1)?,
        cost: row.get(2)?,
        billing_period,
        renewal_date: row.get(4)?,
        reminder_days: row.get(5)?,
        official_website: row.get(6)?,
        category: row.get(7)?,
        notes: row.get(8)?,
        last_reminder_sent: row.get(9)?,
        reminder_acknowledged: row.get(10)?,
    })
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct DatabaseStats {
    pub total_subscriptions: usize,
    pub active: usize,
    pub warning: usize,
    pub urgent: usize,
    pub critical: usize,
    pub monthly_spend: f64,
    pub yearly_spend: f64,
    pub upcoming_renewals: usize,
}

impl DatabaseStats {
    pub fn from_subscriptions(subscriptions: &[Subscription], now: DateTime<Utc>) -> Self {
        let mut stats = DatabaseStats {
            total_subscriptions: subscriptions.len(),
            ..Default::default()
        };

        for sub in subscriptions {
            match classify(sub.renewal_date, now) {
                RenewalStatus::Active => stats.active += 1,
                RenewalStatus::Warning => stats.warning += 1,
                RenewalStatus::Urgent => stats.urgent += 1,
                RenewalStatus::Critical => stats.critical += 1,
            }

            stats.monthly_spend += sub.monthly_cost();
            stats.yearly_spend += sub.yearly_cost();

            let days = days_until_renewal(sub.renewal_date, now);
            if (0..=UPCOMING_WINDOW_DAYS).contains(&days) {
                stats.upcoming_renewals += 1;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 14, 9, 0, 0).unwrap()
    }

    fn new_sub(name: &str, cost: f64, period: BillingPeriod, in_days: i64) -> NewSubscription {
        NewSubscription::new(name, cost, period, now().date_naive() + Duration::days(in_days))
    }

    #[test]
    fn create_and_read_back() {
        let db = Database::open_in_memory().unwrap();
        let mut new = new_sub("Netflix", 15.99, BillingPeriod::Monthly, 10);
        new.official_website = Some("https://netflix.com".to_string());
        new.reminder_days = Some(7);

        let created = db.create_subscription(&new).unwrap();
        assert_eq!(created.name, "Netflix");
        assert_eq!(created.billing_period, BillingPeriod::Monthly);
        assert_eq!(created.reminder_days, Some(7));
        assert!(created.last_reminder_sent.is_none());

        let fetched = db.get_subscription(created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(db.get_subscription(created.id + 100).unwrap().is_none());
    }

    #[test]
    fn create_rejects_invalid_input() {
        let db = Database::open_in_memory().unwrap();
        let result = db.create_subscription(&new_sub("Bad", -5.0, BillingPeriod::Yearly, 3));
        assert!(matches!(result, Err(ReminderError::InvalidInput(_))));
        assert!(db.list_subscriptions().unwrap().is_empty());
    }

    #[test]
    fn list_is_ordered_by_renewal_date() {
        let db = Database::open_in_memory().unwrap();
        db.create_subscription(&new_sub("Later", 1.0, BillingPeriod::Monthly, 40)).unwrap();
        db.create_subscription(&new_sub("Sooner", 1.0, BillingPeriod::Monthly, 2)).unwrap();

        let names: Vec<_> = db
            .list_subscriptions()
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, vec!["Sooner", "Later"]);
    }

    #[test]
    fn reminder_timestamps_persist() {
        let db = Database::open_in_memory().unwrap();
        let sub = db
            .create_subscription(&new_sub("Spotify", 11.99, BillingPeriod::Monthly, 3))
            .unwrap();

        db.set_last_reminder_sent(sub.id, now()).unwrap();
        db.acknowledge_reminder(sub.id, now() + Duration::hours(2)).unwrap();

        let fetched = db.get_subscription(sub.id).unwrap().unwrap();
        assert_eq!(fetched.last_reminder_sent, Some(now()));
        assert_eq!(fetched.reminder_acknowledged, Some(now() + Duration::hours(2)));
    }

    #[test]
    fn updates_on_missing_id_report_not_found() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(
            db.set_last_reminder_sent(42, now()),
            Err(ReminderError::SubscriptionNotFound(42))
        ));
        assert!(matches!(
            db.acknowledge_reminder(42, now()),
            Err(ReminderError::SubscriptionNotFound(42))
        ));
        assert!(matches!(
            db.delete_subscription(42),
            Err(ReminderError::SubscriptionNotFound(42))
        ));
    }

    #[test]
    fn renewal_and_reminder_days_updates() {
        let db = Database::open_in_memory().unwrap();
        let sub = db
            .create_subscription(&new_sub("GitHub", 100.0, BillingPeriod::Yearly, 1))
            .unwrap();
        db.set_last_reminder_sent(sub.id, now()).unwrap();

        let next = sub.renewal_date + Duration::days(365);
        db.update_renewal_date(sub.id, next).unwrap();
        db.update_reminder_days(sub.id, 14).unwrap();
        assert!(db.update_reminder_days(sub.id, 0).is_err());

        let fetched = db.get_subscription(sub.id).unwrap().unwrap();
        assert_eq!(fetched.renewal_date, next);
        assert_eq!(fetched.reminder_days, Some(14));
        assert_eq!(fetched.last_reminder_sent, Some(now()));
    }

    #[test]
    fn edit_changes_only_named_fields() {
        let db = Database::open_in_memory().unwrap();
        let mut new = new_sub("Netflx", 15.99, BillingPeriod::Monthly, 4);
        new.reminder_days = Some(7);
        new.category = Some("Video".to_string());
        let sub = db.create_subscription(&new).unwrap();
        db.set_last_reminder_sent(sub.id, now()).unwrap();

        let edited = db
            .update_subscription(
                sub.id,
                &SubscriptionUpdate {
                    name: Some("Netflix".to_string()),
                    cost: Some(179.99),
                    billing_period: Some(BillingPeriod::Yearly),
                    official_website: Some("https://netflix.com".to_string()),
                    category: Some(String::new()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(edited.name, "Netflix");
        assert_eq!(edited.cost, 179.99);
        assert_eq!(edited.billing_period, BillingPeriod::Yearly);
        assert_eq!(edited.official_website.as_deref(), Some("https://netflix.com"));
        assert_eq!(edited.category, None);
        assert_eq!(edited.renewal_date, sub.renewal_date);
        assert_eq!(edited.reminder_days, Some(7));
        assert_eq!(edited.last_reminder_sent, Some(now()));
        assert_eq!(db.get_subscription(sub.id).unwrap().unwrap(), edited);
    }

    #[test]
    fn edit_validates_and_reports_missing_rows() {
        let db = Database::open_in_memory().unwrap();
        let sub = db
            .create_subscription(&new_sub("Hulu", 7.99, BillingPeriod::Monthly, 9))
            .unwrap();

        let blank_name = SubscriptionUpdate {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            db.update_subscription(sub.id, &blank_name),
            Err(ReminderError::InvalidInput(_))
        ));
        let negative = SubscriptionUpdate {
            cost: Some(-1.0),
            ..Default::default()
        };
        assert!(db.update_subscription(sub.id, &negative).is_err());
        assert_eq!(db.get_subscription(sub.id).unwrap().unwrap(), sub);

        assert_eq!(
            db.update_subscription(sub.id, &SubscriptionUpdate::default()).unwrap(),
            sub
        );
        assert!(matches!(
            db.update_subscription(99, &negative),
            Err(ReminderError::SubscriptionNotFound(99))
        ));
    }

    #[test]
    fn delete_removes_row() {
        let db = Database::open_in_memory().unwrap();
        let sub = db
            .create_subscription(&new_sub("Old", 5.0, BillingPeriod::Monthly, 1))
            .unwrap();
        db.delete_subscription(sub.id).unwrap();
        assert!(db.get_subscription(sub.id).unwrap().is_none());
    }

    #[test]
    fn stats_normalise_costs_and_bucket_statuses() {
        let db = Database::open_in_memory().unwrap();
        db.create_subscription(&new_sub("Monthly", 10.0, BillingPeriod::Monthly, 3)).unwrap();
        db.create_subscription(&new_sub("Yearly", 120.0, BillingPeriod::Yearly, 10)).unwrap();
        db.create_subscription(&new_sub("Far", 5.0, BillingPeriod::Monthly, 60)).unwrap();
        db.create_subscription(&new_sub("Expired", 0.0, BillingPeriod::Monthly, -2)).unwrap();

        let stats = db.get_stats(now()).unwrap();
        assert_eq!(stats.total_subscriptions, 4);
        assert_eq!(stats.critical, 2);
        assert_eq!(stats.urgent, 1);
        assert_eq!(stats.warning, 0);
        assert_eq!(stats.active, 1);
        assert_eq!(stats.upcoming_renewals, 2);
        assert!((stats.monthly_spend - 25.0).abs() < 1e-9);
        assert!((stats.yearly_spend - 300.0).abs() < 1e-9);
    }
}
