//! Date windows for report streams
//!
//! Windows start at the bookmark, clamped to the attribution window, and
//! step forward by the stream's window size until they reach now. The last
//! window is cut short at now. Report calls take inclusive calendar dates,
//! so a window `[start, end)` asks for `start.date()` through the day
//! before `end`.

use crate::types::{format_date, JsonObject, JsonValue};
use chrono::{DateTime, Duration, NaiveDate, Utc};

/// First window start: the bookmark, but no earlier than the attribution window
pub fn initial_start(
    bookmark: DateTime<Utc>,
    now: DateTime<Utc>,
    attribution_days: i64,
) -> DateTime<Utc> {
    Duration::try_days(attribution_days)
        .and_then(|lookback| now.checked_sub_signed(lookback))
        .map_or(bookmark, |earliest| bookmark.max(earliest))
}

/// A half-open fetch window `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    /// Inclusive start
    pub start: DateTime<Utc>,
    /// Exclusive end
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// First day requested
    pub fn date_from(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Last day requested, never before the first
    pub fn date_to(&self) -> NaiveDate {
        (self.end - Duration::days(1))
            .date_naive()
            .max(self.date_from())
    }

    /// Whether the request covers a single calendar day
    pub fn is_single_day(&self) -> bool {
        self.date_from() == self.date_to()
    }

    /// Tag describing the requested days
    pub fn tag(&self) -> WindowTag {
        if self.is_single_day() {
            WindowTag::Day(self.date_from())
        } else {
            WindowTag::Range {
                start_date: self.date_from(),
                end_date: self.date_to(),
            }
        }
    }
}

/// Fields identifying which days a report record covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowTag {
    /// `date`
    Day(NaiveDate),
    /// `start_date` and `end_date`, both inclusive
    Range {
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

impl WindowTag {
    /// Write the tag fields into a record
    pub fn apply(&self, record: &mut JsonObject) {
        match self {
            WindowTag::Day(date) => {
                record.insert("date".to_string(), JsonValue::String(format_date(*date)));
            }
            WindowTag::Range {
                start_date,
                end_date,
            } => {
                record.insert(
                    "start_date".to_string(),
                    JsonValue::String(format_date(*start_date)),
                );
                record.insert(
                    "end_date".to_string(),
                    JsonValue::String(format_date(*end_date)),
                );
            }
        }
    }
}

/// Iterator over contiguous windows from a start up to now
#[derive(Debug, Clone)]
pub struct DateWindows {
    next_start: DateTime<Utc>,
    now: DateTime<Utc>,
    size: Option<Duration>,
}

impl Iterator for DateWindows {
    type Item = DateWindow;

    fn next(&mut self) -> Option<DateWindow> {
        if self.next_start >= self.now {
            return None;
        }

        let end = match self.size {
            Some(size) => (self.next_start + size).min(self.now),
            None => self.now,
        };
        let window = DateWindow {
            start: self.next_start,
            end,
        };
        self.next_start = end;
        Some(window)
    }
}

/// Windows of `size_days` from `start` to `now`; a single window when no size is set
pub fn date_windows(start: DateTime<Utc>, now: DateTime<Utc>, size_days: Option<i64>) -> DateWindows {
    DateWindows {
        next_start: start,
        now,
        size: size_days.map(Duration::days),
    }
}
