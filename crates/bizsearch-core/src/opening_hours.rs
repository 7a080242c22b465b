//! Opening hours compression
//!
//! Turns the provider's per-day table into the presentation form, merging
//! runs of consecutive weekdays that share an identical schedule.

use crate::{RawOpeningHours, TimeRange, Weekday, WorkingHours, WorkingHoursEntry};

/// Compress a per-day table into weekday ranges.
///
/// Days are walked Monday..Sunday. Two neighbours merge iff their raw
/// schedules are equal, closed days included. Sunday and Monday are not
/// neighbours: a run never wraps around the week.
pub fn compress_opening_hours(raw: &RawOpeningHours) -> WorkingHours {
    let mut entries = Vec::new();

    let mut run_start = Weekday::Monday;
    let mut run_end = Weekday::Monday;
    let mut run_hours = raw.day(Weekday::Monday);

    for day in Weekday::ALL.into_iter().skip(1) {
        let hours = raw.day(day);
        if hours != run_hours {
            entries.push(close_run(run_start, run_end, run_hours));
            run_start = day;
            run_hours = hours;
        }
        run_end = day;
    }
    entries.push(close_run(run_start, run_end, run_hours));

    WorkingHours::from_entries(entries)
}

fn close_run(first: Weekday, last: Weekday, hours: Option<&[TimeRange]>) -> WorkingHoursEntry {
    WorkingHoursEntry::new(first, last, hours.map(<[TimeRange]>::to_vec))
}
