use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{error::ReminderError, reminder::DailySchedule};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
    pub email: Option<EmailConfig>,
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "subtrack.db".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotifyChannel {
    Email,
    Telegram,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReminderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_channel")]
    pub channel: NotifyChannel,
    /// Email address or Telegram chat id, depending on `channel`
    pub recipient: Option<String>,
    #[serde(default = "default_run_hour")]
    pub run_at_hour: u32,
    #[serde(default)]
    pub run_at_minute: u32,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            channel: NotifyChannel::Email,
            recipient: None,
            run_at_hour: default_run_hour(),
            run_at_minute: 0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmailConfig {
    pub api_key: String,
    pub from_address: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_channel() -> NotifyChannel {
    NotifyChannel::Email
}

fn default_run_hour() -> u32 {
    9
}

fn default_api_base() -> String {
    "https://api.sendgrid.com".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

impl Config {
    /// Load from an optional config file, overridden by `SUBTRACK_*` env vars.
    ///
    /// Nested keys use a double underscore, e.g. `SUBTRACK_EMAIL__API_KEY`.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SUBTRACK")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReminderError> {
        if self.reminder.run_at_hour >= 24 {
            return Err(ReminderError::Config(format!(
                "reminder.run_at_hour must be 0-23, got {}",
                self.reminder.run_at_hour
            )));
        }
        if self.reminder.run_at_minute >= 60 {
            return Err(ReminderError::Config(format!(
                "reminder.run_at_minute must be 0-59, got {}",
                self.reminder.run_at_minute
            )));
        }
        if let Some(email) = &self.email {
            if email.timeout_secs == 0 {
                return Err(ReminderError::Config(
                    "email.timeout_secs must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn schedule(&self) -> DailySchedule {
        DailySchedule::new(self.reminder.run_at_hour, self.reminder.run_at_minute)
    }

    /// Destination for automatic reminders, if reminders are switched on.
    pub fn recipient(&self) -> Option<&str> {
        if !self.reminder.enabled {
            return None;
        }
        self.reminder
            .recipient
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Email settings, only when an API key is actually present.
    pub fn email_settings(&self) -> Option<&EmailConfig> {
        self.email
            .as_ref()
            .filter(|e| !e.api_key.trim().is_empty())
    }

    pub fn telegram_settings(&self) -> Option<&TelegramConfig> {
        self.telegram
            .as_ref()
            .filter(|t| t.notifications_enabled && !t.bot_token.trim().is_empty())
    }

    /// Write the built-in defaults as TOML, refusing to clobber an existing
    /// file. Values loaded from the environment are never written out.
    pub fn write_default_file(path: &Path) -> Result<bool, ReminderError> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(anyhow::Error::from)?;
        }
        let body = toml::to_string_pretty(&Config::default())?;
        std::fs::write(path, body).map_err(anyhow::Error::from)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid_and_disabled() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reminder.run_at_hour, 9);
        assert!(config.recipient().is_none());
        assert!(config.email_settings().is_none());
        assert!(config.telegram_settings().is_none());
    }

    #[test]
    fn rejects_out_of_range_run_time() {
        let mut config = Config::default();
        config.reminder.run_at_hour = 24;
        assert!(matches!(config.validate(), Err(ReminderError::Config(_))));

        config.reminder.run_at_hour = 23;
        config.reminder.run_at_minute = 60;
        assert!(matches!(config.validate(), Err(ReminderError::Config(_))));
    }

    #[test]
    fn blank_recipient_and_key_count_as_absent() {
        let mut config = Config::default();
        config.reminder.recipient = Some("   ".to_string());
        config.email = Some(EmailConfig {
            api_key: "".to_string(),
            from_address: "me@example.com".to_string(),
            api_base: default_api_base(),
            timeout_secs: 10,
        });
        assert!(config.recipient().is_none());
        assert!(config.email_settings().is_none());

        config.reminder.recipient = Some("me@example.com".to_string());
        config.reminder.enabled = false;
        assert!(config.recipient().is_none());
    }

    #[test]
    fn parses_toml_with_defaults() {
        let raw = r#"
            [reminder]
            recipient = "me@example.com"
            run_at_hour = 7

            [email]
            api_key = "SG.key"
            from_address = "bot@example.com"
        "#;
        let config: Config = toml::from_str(raw).expect("valid toml");
        assert_eq!(config.database.path, "subtrack.db");
        assert_eq!(config.reminder.channel, NotifyChannel::Email);
        assert_eq!(config.recipient(), Some("me@example.com"));
        let email = config.email_settings().expect("email configured");
        assert_eq!(email.api_base, "https://api.sendgrid.com");
        assert_eq!(email.timeout_secs, 10);
    }

    #[test]
    fn default_file_is_not_overwritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config").join("default.toml");

        assert!(Config::write_default_file(&path).expect("write"));
        assert!(!Config::write_default_file(&path).expect("second write"));

        let written = std::fs::read_to_string(&path).expect("read back");
        let parsed: Config = toml::from_str(&written).expect("round trip");
        assert_eq!(parsed.reminder.run_at_hour, 9);
    }

    #[test]
    fn default_file_carries_no_credentials() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("default.toml");
        assert!(Config::write_default_file(&path).expect("write"));

        let written = std::fs::read_to_string(&path).expect("read back");
        assert!(!written.contains("api_key"));
        assert!(!written.contains("bot_token"));

        let parsed: Config = toml::from_str(&written).expect("round trip");
        assert!(parsed.email.is_none());
        assert!(parsed.telegram.is_none());
        assert!(parsed.recipient().is_none());
    }
}
