use chrono::{DateTime, NaiveDate, Utc};
use colored::{ColoredString, Colorize};

use crate::{
    notify::formatters::format_amount,
    reminder::status::RenewalStatus,
    storage::models::{BillingPeriod, Subscription},
};

pub const SUBSCRIPTION_HEADERS: [&str; 7] =
    ["ID", "Name", "Cost", "Renews", "Days", "Last Reminder", "Status"];
pub const SUBSCRIPTION_WIDTHS: [usize; 7] = [5, 24, 16, 12, 6, 24, 8];

/// One `subtrack list` row; the colored status goes last so its escape
/// codes never shift the padded columns.
pub fn subscription_row(sub: &Subscription, status: RenewalStatus, days: i64) -> Vec<String> {
    vec![
        sub.id.to_string(),
        truncate(&sub.name, SUBSCRIPTION_WIDTHS[1]),
        format_cost(sub.cost, sub.billing_period),
        format_date(&sub.renewal_date),
        days.to_string(),
        format_optional_timestamp(&sub.last_reminder_sent),
        colorize_status(status).to_string(),
    ]
}

/// Format a cost with its billing unit, e.g. "$20/month"
pub fn format_cost(cost: f64, period: BillingPeriod) -> String {
    format!("{}/{}", format_amount(cost), period.unit())
}

pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Format timestamp in human-readable format
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_optional_timestamp(timestamp: &Option<DateTime<Utc>>) -> String {
    timestamp
        .as_ref()
        .map(format_timestamp)
        .unwrap_or_else(|| "-".to_string())
}

pub fn colorize_status(status: RenewalStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        RenewalStatus::Active => label.green(),
        RenewalStatus::Warning => label.yellow(),
        RenewalStatus::Urgent => label.truecolor(255, 140, 0),
        RenewalStatus::Critical => label.red().bold(),
    }
}

/// Truncate long names so table columns stay aligned
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let kept: String = text.chars().take(width.saturating_sub(3)).collect();
    format!("{}...", kept)
}

/// Prompt user for yes/no confirmation
pub fn confirm_action(prompt: &str) -> bool {
    use std::io::{self, Write};

    print!("{} (y/N): ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }

    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Print a formatted table border
pub fn print_table_border(width: usize) {
    println!("{}", "=".repeat(width));
}

/// Print a table row with columns
pub fn print_table_row(columns: &[&str], widths: &[usize]) {
    let mut row = String::new();
    for (i, col) in columns.iter().enumerate() {
        if i < widths.len() {
            row.push_str(&format!("{:<width$}  ", col, width = widths[i]));
        }
    }
    println!("{}", row.trim_end());
}
