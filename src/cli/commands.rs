use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "subtrack")]
#[command(about = "Track subscription renewals and send reminder notifications")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file (extension optional)
    #[arg(short, long, global = true, default_value = "config/default")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize database and write a default configuration file
    Init,

    /// Run the daily reminder scheduler until interrupted
    Daemon,

    /// Run a single reminder check now
    Run {
        /// Evaluate only, don't send or record anything
        #[arg(long)]
        dry_run: bool,

        /// Evaluate as of this date (YYYY-MM-DD) instead of now; implies --dry-run
        #[arg(long)]
        as_of: Option<String>,
    },

    /// List subscriptions with their renewal status
    List {
        /// Filter by status (active, warning, urgent, critical, all)
        #[arg(short, long, default_value = "all")]
        status: String,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show subscriptions inside their own reminder window
    Due,

    /// Add a subscription
    Add {
        /// Display name
        name: String,

        /// Cost per billing period
        #[arg(long)]
        cost: f64,

        /// Billing period (monthly, yearly)
        #[arg(long, default_value = "monthly")]
        period: String,

        /// Next renewal date (YYYY-MM-DD)
        #[arg(long)]
        renews: String,

        /// Days before renewal the manual due check starts flagging it
        #[arg(long)]
        reminder_days: Option<u32>,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Edit a subscription's details (pass an empty string to clear a field)
    Edit {
        id: i64,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        cost: Option<f64>,

        /// Billing period (monthly, yearly)
        #[arg(long)]
        period: Option<String>,

        #[arg(long)]
        website: Option<String>,

        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        notes: Option<String>,
    },

    /// Move a subscription's renewal date forward
    Renew {
        id: i64,

        /// New renewal date (YYYY-MM-DD)
        date: String,
    },

    /// Acknowledge the current reminder for a subscription
    Ack {
        id: i64,
    },

    /// Change how many days ahead a subscription is considered due
    ReminderDays {
        id: i64,
        days: u32,
    },

    /// Send a reminder for one subscription right now
    Remind {
        id: i64,
    },

    /// Delete a subscription
    Delete {
        id: i64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show spend and renewal statistics
    Stats {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Send a sample reminder to the configured recipient
    TestNotify,
}
