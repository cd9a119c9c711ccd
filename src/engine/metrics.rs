use std::collections::HashSet;

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, Weekday};

use crate::engine::{local_day, minutes_since_midnight};
use crate::engine::schedule::WORKDAY_START_MINUTES;
use crate::model::attendance::{AttendanceRecord, EventKind};
use crate::model::employee::Employee;

fn entries<'a>(
    employee_id: &'a str,
    records: &'a [AttendanceRecord],
) -> impl Iterator<Item = &'a AttendanceRecord> + 'a {
    records
        .iter()
        .filter(move |r| r.employee_id == employee_id && r.event_type == EventKind::Entrada)
}

/// Distinct days on which the employee clocked an entrada.
pub fn entry_dates(employee_id: &str, records: &[AttendanceRecord]) -> HashSet<NaiveDate> {
    entries(employee_id, records).map(|r| r.event_date).collect()
}

pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Entradas strictly after 08:00. No grace period is applied.
pub fn late_entries(employee_id: &str, records: &[AttendanceRecord]) -> usize {
    entries(employee_id, records)
        .filter(|r| minutes_since_midnight(r.event_time) > WORKDAY_START_MINUTES)
        .count()
}

/// Weekdays in `created_on..=today` without an entrada. `today` itself is never counted.
pub fn absent_weekdays(
    employee_id: &str,
    created_on: NaiveDate,
    records: &[AttendanceRecord],
    today: NaiveDate,
) -> usize {
    let attended = entry_dates(employee_id, records);

    created_on
        .iter_days()
        .take_while(|day| *day <= today)
        .filter(|day| is_weekday(*day))
        .filter(|day| *day != today && !attended.contains(day))
        .count()
}

/// Lateness count for a roster member; 0 when the identifier is unknown.
pub fn count_lateness(
    employee_id: &str,
    roster: &[Employee],
    records: &[AttendanceRecord],
) -> usize {
    match roster.iter().find(|e| e.employee_id == employee_id) {
        Some(_) => late_entries(employee_id, records),
        None => 0,
    }
}

/// Absence days for a roster member; 0 when the identifier is unknown.
///
/// The creation instant is converted to a calendar day with `offset`, the
/// operational timezone.
pub fn count_absences(
    employee_id: &str,
    roster: &[Employee],
    records: &[AttendanceRecord],
    today: NaiveDate,
    offset: FixedOffset,
) -> usize {
    match roster.iter().find(|e| e.employee_id == employee_id) {
        Some(employee) => {
            let created_on = local_day(employee.created_at, offset);
            absent_weekdays(employee_id, created_on, records, today)
        }
        None => 0,
    }
}

/// Everything the profile view shows about one employee.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeStats {
    pub total_records: usize,
    pub attended_days: usize,
    pub absence_days: usize,
    pub lateness_count: usize,
    pub last_record: Option<AttendanceRecord>,
}

impl EmployeeStats {
    pub fn compute(
        employee: &Employee,
        records: &[AttendanceRecord],
        today: NaiveDate,
        offset: FixedOffset,
    ) -> Self {
        let id = employee.employee_id.as_str();
        let created_on = local_day(employee.created_at, offset);
        let own: Vec<&AttendanceRecord> = records.iter().filter(|r| r.employee_id == id).collect();

        // latest by date, then time
        let last_record = own
            .iter()
            .max_by(|a, b| {
                a.event_date
                    .cmp(&b.event_date)
                    .then_with(|| a.event_time.cmp(&b.event_time))
            })
            .map(|r| (*r).clone());

        Self {
            total_records: own.len(),
            attended_days: entry_dates(id, records).len(),
            absence_days: absent_weekdays(id, created_on, records, today),
            lateness_count: late_entries(id, records),
            last_record,
        }
    }
}

/// Headline numbers for one day of records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailySummary {
    pub total_employees: usize,
    pub present: usize,
    pub records: usize,
    /// Time of the last record in log order.
    pub last_activity: Option<NaiveTime>,
}

impl DailySummary {
    pub fn compute(roster: &[Employee], todays_records: &[AttendanceRecord]) -> Self {
        let present: HashSet<&str> = todays_records
            .iter()
            .map(|r| r.employee_id.as_str())
            .collect();

        Self {
            total_employees: roster.len(),
            present: present.len(),
            records: todays_records.len(),
            last_activity: todays_records.last().map(|r| r.event_time),
        }
    }
}
