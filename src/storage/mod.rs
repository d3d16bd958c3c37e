pub mod db;
pub mod models;
pub mod store;

pub use db::{Database, DatabaseStats};
pub use models::{BillingPeriod, NewSubscription, Subscription, SubscriptionUpdate};
pub use store::SubscriptionStore;
