use chrono::{DateTime, Utc};

/// Certificates with fewer days than this left are reported.
pub const EXPIRY_THRESHOLD_DAYS: f64 = 30.0;

const MILLIS_PER_DAY: f64 = 24.0 * 60.0 * 60.0 * 1000.0;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Expiry {
    pub expired: bool,
    /// Whole days left, rounded half away from zero. Negative once expired.
    pub days_until_expiry: i64,
}

/// Fractional days from `now` until `not_after`.
pub fn days_remaining(not_after: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    (not_after - now).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// Returns the expiry state when `not_after` is inside the reporting window,
/// `None` when the certificate is comfortably valid.
pub fn evaluate(not_after: DateTime<Utc>, now: DateTime<Utc>) -> Option<Expiry> {
    let days = days_remaining(not_after, now);
    if not_after >= now && days >= EXPIRY_THRESHOLD_DAYS {
        return None;
    }

    Some(Expiry {
        expired: days < 0.0,
        days_until_expiry: days.round() as i64,
    })
}
