pub mod config;
pub mod error;
pub mod notify;
pub mod reminder;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{ReminderError, Result};
