use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Subscription not found: {0}")]
    SubscriptionNotFound(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    TomlError(#[from] toml::ser::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReminderError>;
