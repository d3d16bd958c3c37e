mod cli;

use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use clap::Parser;
use cli::{Cli, Commands};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use subtrack::{
    error::{self, ReminderError},
    notify::{self, ReminderSummary},
    reminder::{self, Clock, ManualClock, ReminderScheduler, RenewalStatus, RunOutcome, SystemClock},
    storage::{self, BillingPeriod, NewSubscription, SubscriptionUpdate},
    utils, Config,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("subtrack=info,warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Init => initialize(&config, &cli.config),

        Commands::Daemon => {
            info!("Starting reminder daemon ({})", config.schedule());
            run_daemon(&config).await
        }

        Commands::Run { dry_run, as_of } => run_check(&config, dry_run, as_of.as_deref()).await,

        Commands::List { status, format } => list_subscriptions(&config, &status, &format),

        Commands::Due => show_due(&config),

        Commands::Add {
            name,
            cost,
            period,
            renews,
            reminder_days,
            website,
            category,
            notes,
        } => add_subscription(
            &config,
            NewSubscriptionArgs {
                name,
                cost,
                period,
                renews,
                reminder_days,
                website,
                category,
                notes,
            },
        ),

        Commands::Edit {
            id,
            name,
            cost,
            period,
            website,
            category,
            notes,
        } => edit_subscription(&config, id, name, cost, period, website, category, notes),

        Commands::Renew { id, date } => renew_subscription(&config, id, &date),

        Commands::Ack { id } => acknowledge(&config, id),

        Commands::ReminderDays { id, days } => update_reminder_days(&config, id, days),

        Commands::Remind { id } => send_manual_reminder(&config, id).await,

        Commands::Delete { id, yes } => delete_subscription(&config, id, yes),

        Commands::Stats { format } => show_stats(&config, &format),

        Commands::TestNotify => test_notify(&config).await,
    };

    if let Err(e) = result {
        error!("{}", format!("Error: {}", e).red());
        std::process::exit(1);
    }
}

fn open_db(config: &Config) -> error::Result<storage::Database> {
    storage::Database::new(&config.database.path)
}

fn parse_date(raw: &str) -> error::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
        ReminderError::InvalidInput(format!("invalid date '{}' (expected YYYY-MM-DD): {}", raw, e))
    })
}

fn find_subscription(db: &storage::Database, id: i64) -> error::Result<storage::Subscription> {
    db.get_subscription(id)?
        .ok_or(ReminderError::SubscriptionNotFound(id))
}

fn config_file_path(raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("toml")
    }
}

fn initialize(config: &Config, config_path: &str) -> error::Result<()> {
    println!("{}", "Initializing subtrack...".green());
    let _db = open_db(config)?;
    println!("{}", "✓ Database initialized".green());

    let path = config_file_path(config_path);
    if Config::write_default_file(&path)? {
        println!("{} {}", "✓ Wrote default configuration to".green(), path.display());
    } else {
        println!("{} {}", "✓ Configuration already present at".green(), path.display());
    }

    println!("\n{}", "Configuration:".cyan());
    println!("  Database:      {}", config.database.path);
    println!("  Channel:       {:?}", config.reminder.channel);
    println!("  Recipient:     {}", config.recipient().unwrap_or("(not set)"));
    println!("  Schedule:      {}", config.schedule());

    println!("\n{}", "Ready to use! Try running:".cyan());
    println!("  {} to add a subscription", "subtrack add \"Netflix\" --cost 15.99 --renews 2026-11-01".yellow());
    println!("  {} to see what would be sent today", "subtrack run --dry-run".yellow());
    println!("  {} to start the daily scheduler", "subtrack daemon".yellow());
    Ok(())
}

async fn run_daemon(config: &Config) -> error::Result<()> {
    let notifier = notify::build_notifier(config)?;
    let recipient = config.recipient().map(str::to_string);

    let (Some(notifier), Some(recipient)) = (notifier, recipient) else {
        println!(
            "{}",
            "⚠️  Reminders disabled - configure a recipient and a notification channel".yellow()
        );
        return Ok(());
    };

    println!("{} {}", "✓ Reminders enabled via".green(), notifier.channel());

    let scheduler = ReminderScheduler::new(
        open_db(config)?,
        Some(notifier),
        Some(recipient),
        Arc::new(SystemClock),
    );

    scheduler
        .run_until(config.schedule(), async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;

    Ok(())
}

async fn run_check(config: &Config, dry_run: bool, as_of: Option<&str>) -> error::Result<()> {
    let clock: Arc<dyn Clock> = match as_of {
        Some(raw) => {
            let date = parse_date(raw)?;
            let time = NaiveTime::from_hms_opt(config.reminder.run_at_hour, config.reminder.run_at_minute, 0)
                .unwrap_or(NaiveTime::MIN);
            Arc::new(ManualClock::new(date.and_time(time).and_utc()))
        }
        None => Arc::new(SystemClock),
    };
    let dry_run = dry_run || as_of.is_some();

    let notifier = if dry_run {
        None
    } else {
        notify::build_notifier(config)?
    };

    let scheduler = ReminderScheduler::new(
        open_db(config)?,
        notifier,
        config.recipient().map(str::to_string),
        clock,
    )
    .with_dry_run(dry_run);

    match scheduler.run_once().await? {
        RunOutcome::Completed(report) => {
            if dry_run {
                println!("{}", "DRY RUN: No reminders were sent".yellow());
            }
            report.print_summary();
        }
        RunOutcome::Disabled(reason) => {
            println!("{} {}", "Reminders disabled:".yellow(), reason);
        }
        RunOutcome::AlreadyRunning => {
            println!("{}", "A reminder check is already running".yellow());
        }
    }

    Ok(())
}

fn list_subscriptions(config: &Config, status: &str, format: &str) -> error::Result<()> {
    let filter = match status.trim().to_lowercase().as_str() {
        "all" => None,
        other => Some(other.parse::<RenewalStatus>().map_err(ReminderError::InvalidInput)?),
    };

    let db = open_db(config)?;
    let now = Utc::now();

    let rows: Vec<_> = db
        .list_subscriptions()?
        .into_iter()
        .map(|sub| {
            let status = reminder::classify(sub.renewal_date, now);
            let days = reminder::days_until_renewal(sub.renewal_date, now);
            (sub, status, days)
        })
        .filter(|(_, status, _)| filter.map_or(true, |f| f == *status))
        .collect();

    if format == "json" {
        let json: Vec<_> = rows
            .iter()
            .map(|(sub, status, days)| {
                serde_json::json!({
                    "subscription": sub,
                    "status": status,
                    "days_until_renewal": days,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("{}", "No subscriptions found".yellow());
        return Ok(());
    }

    let width: usize = utils::SUBSCRIPTION_WIDTHS.iter().map(|w| w + 2).sum();
    utils::print_table_border(width);
    utils::print_table_row(&utils::SUBSCRIPTION_HEADERS, &utils::SUBSCRIPTION_WIDTHS);
    utils::print_table_border(width);

    for (sub, status, days) in &rows {
        let row = utils::subscription_row(sub, *status, *days);
        let columns: Vec<&str> = row.iter().map(String::as_str).collect();
        utils::print_table_row(&columns, &utils::SUBSCRIPTION_WIDTHS);
    }
    utils::print_table_border(width);

    Ok(())
}

fn show_due(config: &Config) -> error::Result<()> {
    let db = open_db(config)?;
    let now = Utc::now();

    let due: Vec<_> = db
        .list_subscriptions()?
        .into_iter()
        .filter(|sub| reminder::is_reminder_due(sub, now))
        .collect();

    if due.is_empty() {
        println!("{}", "Nothing due for a reminder".green());
        return Ok(());
    }

    println!("{}", "=== Due for Reminder ===".cyan().bold());
    for sub in &due {
        let days = reminder::days_until_renewal(sub.renewal_date, now);
        println!(
            "  [{}] {} renews {} ({} days, threshold {}) - {}",
            sub.id,
            sub.name,
            utils::format_date(&sub.renewal_date),
            days,
            sub.reminder_days_or_default(),
            utils::colorize_status(reminder::classify(sub.renewal_date, now))
        );
    }

    Ok(())
}

struct NewSubscriptionArgs {
    name: String,
    cost: f64,
    period: String,
    renews: String,
    reminder_days: Option<u32>,
    website: Option<String>,
    category: Option<String>,
    notes: Option<String>,
}

fn add_subscription(config: &Config, args: NewSubscriptionArgs) -> error::Result<()> {
    let billing_period: BillingPeriod = args.period.parse()?;
    let mut new = NewSubscription::new(args.name, args.cost, billing_period, parse_date(&args.renews)?);
    new.reminder_days = args.reminder_days;
    new.official_website = args.website;
    new.category = args.category;
    new.notes = args.notes;

    let db = open_db(config)?;
    let created = db.create_subscription(&new)?;

    println!(
        "{} {} (id {}), renews {} - {}",
        "✓ Added".green(),
        created.name,
        created.id,
        utils::format_date(&created.renewal_date),
        utils::colorize_status(reminder::classify(created.renewal_date, Utc::now()))
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn edit_subscription(
    config: &Config,
    id: i64,
    name: Option<String>,
    cost: Option<f64>,
    period: Option<String>,
    website: Option<String>,
    category: Option<String>,
    notes: Option<String>,
) -> error::Result<()> {
    let update = SubscriptionUpdate {
        name,
        cost,
        billing_period: period.map(|p| p.parse::<BillingPeriod>()).transpose()?,
        official_website: website,
        category,
        notes,
    };
    if update.is_empty() {
        return Err(ReminderError::InvalidInput(
            "nothing to change, pass at least one field".to_string(),
        ));
    }

    let db = open_db(config)?;
    let edited = db.update_subscription(id, &update)?;
    info!("Subscription {} updated", id);
    println!(
        "{} {} (id {}) - {}",
        "✓ Updated".green(),
        edited.name,
        edited.id,
        utils::format_cost(edited.cost, edited.billing_period)
    );
    Ok(())
}

fn renew_subscription(config: &Config, id: i64, date: &str) -> error::Result<()> {
    let renewal_date = parse_date(date)?;
    let db = open_db(config)?;
    let current = find_subscription(&db, id)?;

    if renewal_date <= current.renewal_date {
        warn!(
            "New renewal date {} is not after the current one ({})",
            renewal_date, current.renewal_date
        );
    }

    db.update_renewal_date(id, renewal_date)?;
    println!(
        "{} {} now renews {}",
        "✓".green(),
        current.name,
        utils::format_date(&renewal_date)
    );
    Ok(())
}

fn acknowledge(config: &Config, id: i64) -> error::Result<()> {
    let db = open_db(config)?;
    let sub = find_subscription(&db, id)?;
    db.acknowledge_reminder(id, Utc::now())?;
    info!("Reminder acknowledged for {}", sub.name);
    println!("{} Reminder acknowledged for {}", "✓".green(), sub.name);
    Ok(())
}

fn update_reminder_days(config: &Config, id: i64, days: u32) -> error::Result<()> {
    let db = open_db(config)?;
    let sub = find_subscription(&db, id)?;
    db.update_reminder_days(id, days)?;
    println!("{} {} reminder threshold set to {} days", "✓".green(), sub.name, days);
    Ok(())
}

async fn send_manual_reminder(config: &Config, id: i64) -> error::Result<()> {
    let db = open_db(config)?;
    let sub = find_subscription(&db, id)?;

    let notifier = notify::build_notifier(config)?
        .ok_or_else(|| ReminderError::Config("no notification channel configured".to_string()))?;
    let recipient = config
        .recipient()
        .ok_or_else(|| ReminderError::Config("reminder.recipient is not set".to_string()))?;

    let now = Utc::now();
    info!("Sending reminder for subscription {} ({})", sub.id, sub.name);
    notifier
        .send(recipient, &ReminderSummary::from_subscription(&sub, now))
        .await?;

    if let Err(e) = db.set_last_reminder_sent(sub.id, now) {
        error!(
            "Reminder for {} was sent but not recorded, it may be sent again: {}",
            sub.name, e
        );
    }

    println!("{} Reminder for {} sent to {}", "✓".green(), sub.name, recipient);
    Ok(())
}

fn delete_subscription(config: &Config, id: i64, yes: bool) -> error::Result<()> {
    let db = open_db(config)?;
    let sub = find_subscription(&db, id)?;

    if !yes && !utils::confirm_action(&format!("Delete {}?", sub.name)) {
        println!("Cancelled");
        return Ok(());
    }

    db.delete_subscription(id)?;
    println!("{} Deleted {}", "✓".green(), sub.name);
    Ok(())
}

fn show_stats(config: &Config, format: &str) -> error::Result<()> {
    let db = open_db(config)?;
    let stats = db.get_stats(Utc::now())?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "=== Subscription Statistics ===".cyan().bold());
    println!("\nSubscriptions:");
    println!("  Total:      {}", stats.total_subscriptions);
    println!("  Active:     {}", stats.active.to_string().green());
    println!("  Warning:    {}", stats.warning.to_string().yellow());
    println!("  Urgent:     {}", stats.urgent.to_string().truecolor(255, 140, 0));
    println!("  Critical:   {}", stats.critical.to_string().red());

    println!("\nSpend:");
    println!("  Monthly:    ${:.2}", stats.monthly_spend);
    println!("  Yearly:     ${:.2}", stats.yearly_spend);

    println!("\nUpcoming renewals (14 days): {}", stats.upcoming_renewals);
    Ok(())
}

async fn test_notify(config: &Config) -> error::Result<()> {
    let notifier = notify::build_notifier(config)?
        .ok_or_else(|| ReminderError::Config("no notification channel configured".to_string()))?;
    let recipient = config
        .recipient()
        .ok_or_else(|| ReminderError::Config("reminder.recipient is not set".to_string()))?;

    let summary = ReminderSummary {
        name: "Sample Subscription".to_string(),
        cost: 20.0,
        billing_period: BillingPeriod::Monthly,
        renewal_date: Utc::now().date_naive() + Duration::days(3),
        website: None,
        days_until_renewal: 3,
    };

    println!("Sending test reminder via {} to {}...", notifier.channel(), recipient);
    notifier.send(recipient, &summary).await?;
    println!("{}", "✓ Test reminder sent".green());
    Ok(())
}
