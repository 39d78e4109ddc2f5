//! Time types for mirrored occurrences.
//!
//! This module provides [`EventTime`] for representing occurrence boundaries
//! (either a specific instant or an all-day calendar date), and
//! [`SyncWindow`] for the bounded range a sync cycle operates on.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Represents one boundary of a canonical occurrence.
///
/// - **DateTime**: A specific point in time, stored as UTC
/// - **AllDay**: A calendar date without a time component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum EventTime {
    /// A specific instant, stored in UTC.
    DateTime(DateTime<Utc>),
    /// An all-day boundary date.
    AllDay(NaiveDate),
}

impl EventTime {
    /// Creates a new `EventTime::DateTime` from a UTC datetime.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }

    /// Creates a new `EventTime::AllDay` from a date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self::AllDay(date)
    }

    /// Returns `true` if this is an all-day boundary.
    pub fn is_all_day(&self) -> bool {
        matches!(self, Self::AllDay(_))
    }

    /// Returns the date portion of this boundary.
    ///
    /// Instants are reduced to their UTC calendar date.
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::DateTime(dt) => dt.date_naive(),
            Self::AllDay(date) => *date,
        }
    }

    /// Converts to a UTC datetime for comparison purposes.
    ///
    /// All-day boundaries map to midnight UTC on that date.
    pub fn to_utc_datetime(&self) -> DateTime<Utc> {
        match self {
            Self::DateTime(dt) => *dt,
            Self::AllDay(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// Returns this boundary as an all-day date boundary.
    pub fn to_all_day(self) -> Self {
        Self::AllDay(self.date())
    }
}

impl PartialOrd for EventTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_utc_datetime().cmp(&other.to_utc_datetime())
    }
}

/// The range a sync cycle considers, creates and deletes mirrors in.
///
/// Represents a half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (exclusive).
    pub end: DateTime<Utc>,
}

impl SyncWindow {
    /// Creates a new sync window.
    ///
    /// An `end` before `start` is clamped to `start`, giving an empty window.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end: end.max(start),
        }
    }

    /// Creates the window reaching `lookback_days` before and
    /// `lookahead_days` after `now`.
    ///
    /// Bounds saturate at the earliest and latest representable instants.
    pub fn around(now: DateTime<Utc>, lookback_days: u32, lookahead_days: u32) -> Self {
        let start = now
            .checked_sub_signed(Duration::days(i64::from(lookback_days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let end = now
            .checked_add_signed(Duration::days(i64::from(lookahead_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Self { start, end }
    }

    /// Returns this window grown by `margin` on both sides.
    pub fn widened(&self, margin: Duration) -> Self {
        Self {
            start: self.start.checked_sub_signed(margin).unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: self.end.checked_add_signed(margin).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// Checks if a datetime falls within this window.
    pub fn contains(&self, dt: DateTime<Utc>) -> bool {
        self.start <= dt && dt < self.end
    }

    /// Checks if an occurrence with the given boundaries intersects this window.
    ///
    /// An occurrence intersects if it starts before the window ends and ends
    /// after the window starts. Zero-length occurrences intersect when their
    /// instant lies inside the window.
    ///
    /// All-day occurrences are compared by calendar date: they intersect when
    /// one of their days is a day the window touches. Their dates carry no
    /// timezone, so no instant comparison is made for them.
    pub fn overlaps_event(&self, event_start: &EventTime, event_end: &EventTime) -> bool {
        if let (EventTime::AllDay(first), EventTime::AllDay(end)) = (event_start, event_end) {
            let last = if end > first { *end - Duration::days(1) } else { *first };
            return *first <= self.last_date() && last >= self.first_date();
        }
        let start = event_start.to_utc_datetime();
        let end = event_end.to_utc_datetime();
        if start == end {
            return self.contains(start);
        }
        start < self.end && end > self.start
    }

    /// Returns the first calendar date touched by this window.
    pub fn first_date(&self) -> NaiveDate {
        self.start.date_naive()
    }

    /// Returns the last calendar date touched by this window.
    ///
    /// The end is exclusive, so a window ending at midnight stops on the
    /// previous day.
    pub fn last_date(&self) -> NaiveDate {
        let date = self.end.date_naive();
        if self.end.time() == NaiveTime::MIN && self.end > self.start {
            date - Duration::days(1)
        } else {
            date
        }
    }
}
