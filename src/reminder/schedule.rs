use chrono::{DateTime, Duration, NaiveTime, Utc};

/// A single daily firing time, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    hour: u32,
    minute: u32,
}

impl DailySchedule {
    /// Out-of-range values are clamped; `Config::validate` rejects them first.
    pub fn new(hour: u32, minute: u32) -> Self {
        Self {
            hour: hour.min(23),
            minute: minute.min(59),
        }
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }

    fn time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0).unwrap_or(NaiveTime::MIN)
    }

    /// The first firing strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.time()).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }

    /// Like [`next_after`](Self::next_after), but never returns a slot at or
    /// before `last_fired`, even when the clock reads earlier than it.
    pub fn next_after_slot(
        &self,
        now: DateTime<Utc>,
        last_fired: Option<DateTime<Utc>>,
    ) -> DateTime<Utc> {
        match last_fired {
            Some(last) if last > now => self.next_after(last),
            _ => self.next_after(now),
        }
    }

    pub fn wait_duration(&self, now: DateTime<Utc>) -> std::time::Duration {
        until(self.next_after(now), now)
    }
}

/// Time left until `at`, zero if it has passed.
pub fn until(at: DateTime<Utc>, now: DateTime<Utc>) -> std::time::Duration {
    (at - now).to_std().unwrap_or(std::time::Duration::ZERO)
}

impl std::fmt::Display for DailySchedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "daily at {:02}:{:02} UTC", self.hour, self.minute)
    }
}
