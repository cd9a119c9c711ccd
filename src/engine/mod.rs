//! Pure attendance logic. Nothing in here performs I/O; callers hand in a
//! snapshot of the roster and the record log.

pub mod clock;
pub mod metrics;
pub mod schedule;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

/// Minutes elapsed since midnight, seconds ignored.
pub fn minutes_since_midnight(time: chrono::NaiveTime) -> u32 {
    use chrono::Timelike;
    time.hour() * 60 + time.minute()
}

/// Calendar day of an instant in the operational timezone.
pub fn local_day(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}
