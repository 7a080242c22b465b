//! Opening hours types
//!
//! `RawOpeningHours` is the per-day table as the provider sends it.
//! `WorkingHours` is the presentation form where consecutive days sharing a
//! schedule are merged under one `"First-Last"` label.

use crate::{TimeRange, Weekday};
use serde::de::{self, Deserializer, IgnoredAny, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors produced when reading compressed working hours back
#[derive(Error, Debug, PartialEq, Eq)]
pub enum HoursError {
    #[error("Unknown working hours label: {0}")]
    UnknownLabel(String),

    #[error("Working hours do not cover the week exactly once")]
    InvalidPartition,
}

/// Per-weekday opening intervals. An empty list means closed that day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOpeningHours {
    days: [Vec<TimeRange>; 7],
}

impl RawOpeningHours {
    /// All seven days closed
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, day: Weekday, hours: Vec<TimeRange>) -> Self {
        self.set_day(day, hours);
        self
    }

    pub fn set_day(&mut self, day: Weekday, hours: Vec<TimeRange>) {
        self.days[day.index()] = hours;
    }

    /// Intervals for a day, or `None` when closed
    pub fn day(&self, day: Weekday) -> Option<&[TimeRange]> {
        let hours = &self.days[day.index()];
        if hours.is_empty() {
            None
        } else {
            Some(hours)
        }
    }

    pub fn is_closed(&self, day: Weekday) -> bool {
        self.days[day.index()].is_empty()
    }
}

/// Reads the provider's `days` object: keys are weekday names in any case,
/// values are interval lists or `null`. Unknown keys are skipped.
impl<'de> Deserialize<'de> for RawOpeningHours {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DaysVisitor;

        impl<'de> Visitor<'de> for DaysVisitor {
            type Value = RawOpeningHours;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of weekday names to opening intervals")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut raw = RawOpeningHours::new();
                while let Some(key) = map.next_key::<String>()? {
                    match Weekday::from_name(&key) {
                        Some(day) => {
                            let hours = map.next_value::<Option<Vec<TimeRange>>>()?;
                            raw.set_day(day, hours.unwrap_or_default());
                        }
                        None => {
                            map.next_value::<IgnoredAny>()?;
                        }
                    }
                }
                Ok(raw)
            }

            // A provider that sends `null` for the whole table means closed all week
            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(RawOpeningHours::new())
            }
        }

        deserializer.deserialize_any(DaysVisitor)
    }
}

/// One compressed row: a run of consecutive days sharing `hours`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingHoursEntry {
    pub first: Weekday,
    pub last: Weekday,
    /// `None` when closed
    pub hours: Option<Vec<TimeRange>>,
}

impl WorkingHoursEntry {
    pub fn new(first: Weekday, last: Weekday, hours: Option<Vec<TimeRange>>) -> Self {
        Self { first, last, hours }
    }

    /// `"Monday"` for a single day, `"Monday-Friday"` for a run
    pub fn label(&self) -> String {
        if self.first == self.last {
            self.first.name().to_string()
        } else {
            format!("{}-{}", self.first, self.last)
        }
    }

    pub fn days(&self) -> impl Iterator<Item = Weekday> + '_ {
        Weekday::ALL
            .into_iter()
            .filter(move |day| (self.first..=self.last).contains(day))
    }

    fn parse_label(label: &str) -> Result<(Weekday, Weekday), HoursError> {
        let unknown = || HoursError::UnknownLabel(label.to_string());
        match label.split_once('-') {
            Some((first, last)) => {
                let first = Weekday::from_name(first).ok_or_else(unknown)?;
                let last = Weekday::from_name(last).ok_or_else(unknown)?;
                if first >= last {
                    return Err(unknown());
                }
                Ok((first, last))
            }
            None => {
                let day = Weekday::from_name(label).ok_or_else(unknown)?;
                Ok((day, day))
            }
        }
    }
}

/// Compressed weekly schedule, entries kept in canonical weekday order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingHours {
    entries: Vec<WorkingHoursEntry>,
}

impl WorkingHours {
    /// Wrap entries that already partition the week in order.
    pub fn from_entries(entries: Vec<WorkingHoursEntry>) -> Self {
        Self { entries }
    }

    /// Like [`WorkingHours::from_entries`] but checks the partition first.
    pub fn try_from_entries(entries: Vec<WorkingHoursEntry>) -> Result<Self, HoursError> {
        if !Self::partitions_week(&entries) {
            return Err(HoursError::InvalidPartition);
        }
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[WorkingHoursEntry] {
        &self.entries
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(WorkingHoursEntry::label).collect()
    }

    /// Look up a row by label. The outer `None` means no such label.
    pub fn get(&self, label: &str) -> Option<Option<&[TimeRange]>> {
        self.entries
            .iter()
            .find(|entry| entry.label() == label)
            .map(|entry| entry.hours.as_deref())
    }

    /// Re-expand the ranges into a per-day table
    pub fn expand(&self) -> RawOpeningHours {
        let mut raw = RawOpeningHours::new();
        for entry in &self.entries {
            for day in entry.days() {
                raw.set_day(day, entry.hours.clone().unwrap_or_default());
            }
        }
        raw
    }

    fn partitions_week(entries: &[WorkingHoursEntry]) -> bool {
        let mut next = 0;
        for entry in entries {
            if entry.first.index() != next || entry.last < entry.first {
                return false;
            }
            next = entry.last.index() + 1;
        }
        next == Weekday::ALL.len()
    }
}

impl Serialize for WorkingHours {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.label(), &entry.hours)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for WorkingHours {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct WorkingHoursVisitor;

        impl<'de> Visitor<'de> for WorkingHoursVisitor {
            type Value = WorkingHours;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of weekday labels to opening intervals")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::new();
                while let Some((label, hours)) =
                    map.next_entry::<String, Option<Vec<TimeRange>>>()?
                {
                    let (first, last) =
                        WorkingHoursEntry::parse_label(&label).map_err(de::Error::custom)?;
                    // An empty list is closed, same as null
                    let hours = hours.filter(|hours| !hours.is_empty());
                    entries.push(WorkingHoursEntry::new(first, last, hours));
                }
                WorkingHours::try_from_entries(entries).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_map(WorkingHoursVisitor)
    }
}
