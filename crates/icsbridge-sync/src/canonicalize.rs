//! Raw occurrence normalization.
//!
//! [`canonicalize`] is the single place where absent or ambiguous feed
//! attributes are resolved: floating times are read as UTC, any date-only
//! boundary makes the whole occurrence all-day, and a missing free/busy
//! signal means busy. All-day dates are taken in the feed's own wall clock,
//! never after a UTC conversion.

use chrono::Utc;
use icsbridge_core::{CanonicalEvent, EventTime};
use icsbridge_providers::{RawOccurrence, RawTime};
use thiserror::Error;

/// Why an occurrence was left out of the wanted set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// The feed marked the occurrence as cancelled.
    #[error("occurrence is cancelled")]
    Cancelled,
    /// The occurrence has no usable start.
    #[error("occurrence has no start")]
    MissingStart,
    /// The occurrence has no usable end.
    #[error("occurrence has no end")]
    MissingEnd,
}

/// Normalizes a raw occurrence.
///
/// # Errors
///
/// Returns the [`SkipReason`] when the occurrence must not be mirrored.
pub fn canonicalize(raw: &RawOccurrence) -> Result<CanonicalEvent, SkipReason> {
    if raw.is_cancelled() {
        return Err(SkipReason::Cancelled);
    }
    let start = raw.start.ok_or(SkipReason::MissingStart)?;
    let end = raw.end.ok_or(SkipReason::MissingEnd)?;

    let all_day = raw.all_day || start.is_date() || end.is_date();
    let (start, end) = if all_day {
        (to_local_date(start), to_local_date(end))
    } else {
        (to_event_time(start), to_event_time(end))
    };

    let mut event = CanonicalEvent::new(raw.uid.clone(), start, end);
    if event.is_all_day && event.end <= event.start {
        // All-day end dates are exclusive; keep at least one day.
        event.end = EventTime::from_date(event.start.date() + chrono::Duration::days(1));
    }

    event.title = clean_text(raw.summary.as_deref());
    event.location = clean_text(raw.location.as_deref());
    event.description = clean_text(raw.description.as_deref());
    event.busy = is_busy(raw);
    Ok(event)
}

fn to_event_time(time: RawTime) -> EventTime {
    match time {
        RawTime::DateTime(dt) => EventTime::from_utc(dt.with_timezone(&Utc)),
        RawTime::Floating(naive) => EventTime::from_utc(naive.and_utc()),
        RawTime::Date(date) => EventTime::from_date(date),
    }
}

fn to_local_date(time: RawTime) -> EventTime {
    let date = match time {
        RawTime::DateTime(dt) => dt.date_naive(),
        RawTime::Floating(naive) => naive.date(),
        RawTime::Date(date) => date,
    };
    EventTime::from_date(date)
}

/// Only an explicit free signal makes an occurrence free.
fn is_busy(raw: &RawOccurrence) -> bool {
    let transparent = raw
        .transparency
        .as_deref()
        .is_some_and(|t| t.trim().eq_ignore_ascii_case("TRANSPARENT"));
    let free = raw
        .show_as
        .as_deref()
        .is_some_and(|s| s.trim().eq_ignore_ascii_case("FREE"));
    !(transparent || free)
}

fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn fixed(s: &str) -> RawTime {
        RawTime::DateTime(DateTime::parse_from_rfc3339(s).unwrap())
    }

    fn timed(uid: &str) -> RawOccurrence {
        RawOccurrence {
            uid: uid.to_string(),
            start: Some(fixed("2024-03-01T10:00:00+01:00")),
            end: Some(fixed("2024-03-01T11:00:00+01:00")),
            ..RawOccurrence::default()
        }
    }

    #[test]
    fn timed_occurrence_is_normalized_to_utc() {
        let event = canonicalize(&timed("a").with_summary("  Assembly ")).unwrap();
        assert!(!event.is_all_day);
        assert_eq!(
            event.start,
            EventTime::from_utc(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
        );
        assert_eq!(event.title.as_deref(), Some("Assembly"));
        assert!(event.busy);
    }

    #[test]
    fn date_boundaries_make_all_day() {
        let raw = RawOccurrence::new("sports", date(2024, 3, 1), date(2024, 3, 3));
        let event = canonicalize(&raw).unwrap();
        assert!(event.is_all_day);
        assert_eq!(event.start, EventTime::from_date(date(2024, 3, 1)));
        assert_eq!(event.end, EventTime::from_date(date(2024, 3, 3)));
    }

    #[test]
    fn mixed_boundaries_make_all_day() {
        let raw = RawOccurrence {
            uid: "mixed".to_string(),
            start: Some(RawTime::Date(date(2024, 3, 1))),
            end: Some(fixed("2024-03-02T00:00:00Z")),
            ..RawOccurrence::default()
        };
        let event = canonicalize(&raw).unwrap();
        assert!(event.is_all_day);
        assert_eq!(event.end, EventTime::from_date(date(2024, 3, 2)));
    }

    #[test]
    fn all_day_flag_forces_dates() {
        let raw = timed("flagged").with_all_day(true);
        let event = canonicalize(&raw).unwrap();
        assert!(event.is_all_day);
        assert_eq!(event.start, EventTime::from_date(date(2024, 3, 1)));
        assert_eq!(event.end, EventTime::from_date(date(2024, 3, 2)));
    }

    #[test]
    fn all_day_flag_keeps_local_date_east_of_utc() {
        let raw = RawOccurrence::new(
            "u1",
            fixed("2024-03-01T00:00:00+01:00"),
            fixed("2024-03-02T00:00:00+01:00"),
        )
        .with_all_day(true);
        let event = canonicalize(&raw).unwrap();
        assert_eq!(event.start, EventTime::from_date(date(2024, 3, 1)));
        assert_eq!(event.end, EventTime::from_date(date(2024, 3, 2)));
    }

    #[test]
    fn all_day_flag_keeps_local_date_west_of_utc() {
        let raw = RawOccurrence::new(
            "u2",
            fixed("2024-03-01T20:00:00-08:00"),
            fixed("2024-03-01T21:00:00-08:00"),
        )
        .with_all_day(true);
        let event = canonicalize(&raw).unwrap();
        assert_eq!(event.start, EventTime::from_date(date(2024, 3, 1)));
        assert_eq!(event.end, EventTime::from_date(date(2024, 3, 2)));
    }

    #[test]
    fn floating_time_is_utc() {
        let naive = date(2024, 3, 1).and_hms_opt(8, 30, 0).unwrap();
        let raw = RawOccurrence::new("floating", naive, naive + chrono::Duration::hours(1));
        let event = canonicalize(&raw).unwrap();
        assert_eq!(event.start, EventTime::from_utc(naive.and_utc()));
    }

    #[test]
    fn reversed_range_is_clamped() {
        let raw = RawOccurrence {
            uid: "rev".to_string(),
            start: Some(fixed("2024-03-01T11:00:00Z")),
            end: Some(fixed("2024-03-01T10:00:00Z")),
            ..RawOccurrence::default()
        };
        let event = canonicalize(&raw).unwrap();
        assert_eq!(event.end, event.start);
    }

    #[test]
    fn cancelled_and_incomplete_are_skipped() {
        assert_eq!(
            canonicalize(&timed("c").with_status("CANCELLED")),
            Err(SkipReason::Cancelled)
        );
        assert_eq!(
            canonicalize(&timed("c").with_status("canceled")),
            Err(SkipReason::Cancelled)
        );

        let mut raw = timed("nostart");
        raw.start = None;
        assert_eq!(canonicalize(&raw), Err(SkipReason::MissingStart));

        let mut raw = timed("noend");
        raw.end = None;
        assert_eq!(canonicalize(&raw), Err(SkipReason::MissingEnd));
    }

    #[test]
    fn transparency_derivation() {
        assert!(canonicalize(&timed("a")).unwrap().busy);
        assert!(canonicalize(&timed("a").with_transparency("OPAQUE")).unwrap().busy);
        assert!(!canonicalize(&timed("a").with_transparency("transparent")).unwrap().busy);
        assert!(!canonicalize(&timed("a").with_show_as("Free")).unwrap().busy);
        assert!(canonicalize(&timed("a").with_show_as("BUSY")).unwrap().busy);
        assert!(canonicalize(&timed("a").with_show_as("TENTATIVE")).unwrap().busy);
    }

    #[test]
    fn blank_text_is_none() {
        let event = canonicalize(&timed("a").with_location("   ").with_description("")).unwrap();
        assert!(event.location.is_none());
        assert!(event.description.is_none());
        assert!(event.title.is_none());
    }
}
