pub mod clock;
pub mod eligibility;
pub mod schedule;
pub mod scheduler;
pub mod status;

pub use clock::{Clock, ManualClock, SystemClock};
pub use eligibility::{evaluate, is_reminder_due, should_notify, Eligibility};
pub use schedule::DailySchedule;
pub use scheduler::{ReminderScheduler, RunOutcome, RunReport};
pub use status::{classify, days_until_renewal, RenewalStatus};
