//! Clearance date prediction for pending statement lines
//!
//! The bank posts transactions in a nightly batch with a 22:00 local cutoff
//! and does not process on weekends. A pending line seen at `now` is
//! assumed to post on the date returned by [`clearance_date`].

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Timelike, Weekday};

/// Local hour at which the bank stops accepting same-day postings
pub const CUTOFF_HOUR: u32 = 22;

/// Predict the posting date of a pending transaction observed at `now`
pub fn clearance_date(now: &DateTime<FixedOffset>) -> NaiveDate {
    let before_cutoff = now.hour() < CUTOFF_HOUR;

    // Friday after cutoff skips the weekend and Monday's batch
    let days_ahead = match now.weekday() {
        Weekday::Fri if before_cutoff => 0,
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        Weekday::Sun => 1,
        _ if before_cutoff => 0,
        _ => 1,
    };

    now.date_naive() + Duration::days(days_ahead)
}
