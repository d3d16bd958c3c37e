use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{
    error::Result,
    notify::{Notifier, ReminderSummary},
    reminder::{
        clock::Clock,
        eligibility::evaluate,
        schedule::{until, DailySchedule},
        status::{classify, days_until_renewal},
    },
    storage::store::SubscriptionStore,
};

/// Aggregate result of one reminder pass.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub evaluated: usize,
    pub notified: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Sent, but the timestamp write failed. Counted in `notified` too.
    pub unrecorded: usize,
    pub dry_run: bool,
}

impl RunReport {
    fn new(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at,
            evaluated: 0,
            notified: 0,
            failed: 0,
            skipped: 0,
            unrecorded: 0,
            dry_run,
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Reminder Check Summary ===");
        println!("As of:          {}", self.started_at.format("%Y-%m-%d %H:%M UTC"));
        println!("Evaluated:      {}", self.evaluated);
        if self.dry_run {
            println!("Would notify:   {}", self.notified);
        } else {
            println!("Notified:       {} ✓", self.notified);
            println!("Failed:         {} ✗", self.failed);
        }
        println!("Skipped:        {}", self.skipped);
        if self.unrecorded > 0 {
            println!("Unrecorded:     {} (sent, timestamp not saved)", self.unrecorded);
        }
        println!("==============================");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(RunReport),
    Disabled(String),
    AlreadyRunning,
}

enum Dispatch<'a> {
    DryRun,
    Live {
        notifier: &'a dyn Notifier,
        recipient: &'a str,
    },
}

/// Clears the running flag when a pass ends, however it ends.
struct RunGuard<'a>(&'a AtomicBool);

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(flag))
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Daily reminder driver: snapshot the store, decide, notify, record.
pub struct ReminderScheduler<S: SubscriptionStore> {
    store: S,
    notifier: Option<Box<dyn Notifier>>,
    recipient: Option<String>,
    clock: Arc<dyn Clock>,
    dry_run: bool,
    running: AtomicBool,
}

impl<S: SubscriptionStore> ReminderScheduler<S> {
    pub fn new(
        store: S,
        notifier: Option<Box<dyn Notifier>>,
        recipient: Option<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            notifier,
            recipient,
            clock,
            dry_run: false,
            running: AtomicBool::new(false),
        }
    }

    /// Evaluate and log without sending or writing anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn dispatch(&self) -> std::result::Result<Dispatch<'_>, String> {
        if self.dry_run {
            return Ok(Dispatch::DryRun);
        }
        let Some(notifier) = self.notifier.as_deref() else {
            return Err("no notifier configured".to_string());
        };
        let Some(recipient) = self.recipient.as_deref() else {
            return Err("no reminder recipient configured".to_string());
        };
        Ok(Dispatch::Live {
            notifier,
            recipient,
        })
    }

    /// Run one full pass over every subscription.
    ///
    /// Only a failure to enumerate subscriptions is returned as an error;
    /// per-subscription send or write failures are logged and counted.
    pub async fn run_once(&self) -> Result<RunOutcome> {
        let dispatch = match self.dispatch() {
            Ok(dispatch) => dispatch,
            Err(reason) => {
                info!("Reminder check skipped: {}", reason);
                return Ok(RunOutcome::Disabled(reason));
            }
        };

        let Some(_guard) = RunGuard::acquire(&self.running) else {
            warn!("Reminder check already in progress, skipping");
            return Ok(RunOutcome::AlreadyRunning);
        };

        let now = self.clock.now();
        let mut report = RunReport::new(now, self.dry_run);

        match &dispatch {
            Dispatch::DryRun => info!("Running reminder check (dry run)"),
            Dispatch::Live { notifier, .. } => {
                info!("Running reminder check via {}", notifier.channel())
            }
        }

        let subscriptions = self.store.list_subscriptions()?;
        debug!("Loaded {} subscriptions", subscriptions.len());

        for subscription in &subscriptions {
            report.evaluated += 1;

            let days = days_until_renewal(subscription.renewal_date, now);
            let eligibility = evaluate(subscription, now);
            debug!(
                "{} (id {}): {} days, status {}, {}",
                subscription.name,
                subscription.id,
                days,
                classify(subscription.renewal_date, now),
                eligibility
            );

            if !eligibility.should_notify() {
                report.skipped += 1;
                continue;
            }

            let (notifier, recipient) = match &dispatch {
                Dispatch::DryRun => {
                    info!(
                        "DRY RUN: would remind about {} ({} days until renewal)",
                        subscription.name, days
                    );
                    report.notified += 1;
                    continue;
                }
                Dispatch::Live {
                    notifier,
                    recipient,
                } => (*notifier, *recipient),
            };

            info!(
                "Sending reminder for {} ({} days until renewal)",
                subscription.name, days
            );
            let summary = ReminderSummary::from_subscription(subscription, now);

            if let Err(e) = notifier.send(recipient, &summary).await {
                report.failed += 1;
                warn!("Failed to send reminder for {}: {}", subscription.name, e);
                continue;
            }

            report.notified += 1;
            if let Err(e) = self.store.set_last_reminder_sent(subscription.id, now) {
                report.unrecorded += 1;
                error!(
                    "Reminder for {} (id {}) was sent but not recorded, it may be sent again: {}",
                    subscription.name, subscription.id, e
                );
            }
        }

        info!(
            "Reminder check complete: {} evaluated, {} notified, {} failed",
            report.evaluated, report.notified, report.failed
        );

        Ok(RunOutcome::Completed(report))
    }

    /// Fire once per day at `schedule` until `shutdown` resolves.
    ///
    /// Shutdown is only observed while idle; a pass in progress always finishes.
    pub async fn run_until<F>(&self, schedule: DailySchedule, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Reminder scheduler started ({})", schedule);

        let mut last_fired = None;
        loop {
            let now = self.clock.now();
            let next = schedule.next_after_slot(now, last_fired);
            info!("Next reminder check at {}", next.format("%Y-%m-%d %H:%M UTC"));

            tokio::select! {
                _ = tokio::time::sleep(until(next, now)) => {}
                _ = &mut shutdown => {
                    info!("Reminder scheduler stopping");
                    return;
                }
            }

            last_fired = Some(next);
            match self.run_once().await {
                Ok(RunOutcome::Completed(report)) => debug!("Run report: {:?}", report),
                Ok(RunOutcome::Disabled(reason)) => info!("Reminders disabled: {}", reason),
                Ok(RunOutcome::AlreadyRunning) => {}
                Err(e) => error!("Reminder check failed: {}", e),
            }
        }
    }
}
