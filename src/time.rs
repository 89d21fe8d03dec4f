use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[cfg_attr(not(test), allow(dead_code))]
struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

#[cfg_attr(not(test), allow(dead_code))]
pub fn fixed_clock(timestamp: i64) -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        Utc.timestamp_opt(timestamp, 0).single().unwrap_or_default(),
    ))
}

/// The most recent day the pageview metrics have been published for.
/// Rankings are keyed by UTC day and only appear once the day is over.
pub fn reference_date(clock: &dyn Clock) -> NaiveDate {
    let today = clock.now().date_naive();
    today.pred_opt().unwrap_or(today)
}
