//! RRULE expansion for recurring feed events.
//!
//! A series master is expanded into concrete occurrences around the sync
//! window. `EXDATE` removes instances, `RDATE` adds them, and a `VEVENT`
//! carrying a `RECURRENCE-ID` replaces the generated instance it points at.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use icsbridge_core::SyncWindow;
use rrule::RRuleSet;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::RawOccurrence;

use super::parse::{FeedEvent, IcsTime, resolve_tz};

/// Upper bound on generated instances per series.
const MAX_OCCURRENCES: u16 = 1000;

/// Turns parsed events into occurrences.
///
/// Non-recurring events pass through unchanged. Overrides are always
/// emitted, including cancelled ones, so the canonicalizer sees them.
pub(crate) fn expand_events(events: Vec<FeedEvent>, window: &SyncWindow) -> Vec<RawOccurrence> {
    let mut overridden: HashMap<String, HashSet<DateTime<Utc>>> = HashMap::new();
    for event in &events {
        if let Some(ref recurrence_id) = event.recurrence_id {
            overridden
                .entry(event.uid.clone())
                .or_default()
                .insert(recurrence_id.instant());
        }
    }

    let empty = HashSet::new();
    let mut occurrences = Vec::new();
    for event in &events {
        let is_master = event.recurrence_id.is_none() && event.rrule.is_some();
        if !is_master {
            occurrences.push(event.to_raw());
            continue;
        }

        let overrides = overridden.get(&event.uid).unwrap_or(&empty);
        match expand_series(event, overrides, window) {
            Ok(instances) => occurrences.extend(instances),
            Err(e) => {
                warn!(uid = %event.uid, error = %e, "Cannot expand recurring event, keeping first instance");
                occurrences.push(event.to_raw());
            }
        }
    }
    occurrences
}

/// Expands one series master, skipping instances replaced by overrides.
fn expand_series(
    master: &FeedEvent,
    overrides: &HashSet<DateTime<Utc>>,
    window: &SyncWindow,
) -> ProviderResult<Vec<RawOccurrence>> {
    let (Some(start), Some(rrule)) = (&master.start, &master.rrule) else {
        return Ok(vec![master.to_raw()]);
    };

    let rrule_str = build_rrule_string(start, rrule, &master.rdates, &master.exdates);
    let rrule_set: RRuleSet = rrule_str.parse().map_err(|e| {
        ProviderError::feed(format!("Failed to parse RRULE for event '{}': {}", master.uid, e))
    })?;

    // Instances starting before the window may still overlap it.
    let tz: rrule::Tz = Utc.into();
    let after = (window.start - master.length() - Duration::seconds(1)).with_timezone(&tz);
    let before = (window.end + Duration::seconds(1)).with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);
    if result.limited {
        debug!(uid = %master.uid, limit = MAX_OCCURRENCES, "Recurrence expansion truncated");
    }

    Ok(result
        .dates
        .iter()
        .map(|dt| occurrence_time(dt, start))
        .filter(|time| !overrides.contains(&time.instant()))
        .map(|time| master.occurrence_at(&time))
        .collect())
}

/// Builds the iCalendar text block the rrule parser expects.
fn build_rrule_string(
    start: &IcsTime,
    rrule: &str,
    rdates: &[IcsTime],
    exdates: &[IcsTime],
) -> String {
    let mut lines = vec![
        format_time("DTSTART", start),
        format!("RRULE:{}", normalize_until(rrule)),
    ];
    lines.extend(rdates.iter().map(|t| format_time("RDATE", t)));
    lines.extend(exdates.iter().map(|t| format_time("EXDATE", t)));
    lines.join("\n")
}

/// Formats a property line. The rrule crate needs date-times, so dates
/// become midnight UTC; floating times and unknown zones are read as UTC.
fn format_time(name: &str, time: &IcsTime) -> String {
    match time {
        IcsTime::Date(d) => format!("{}:{}T000000Z", name, d.format("%Y%m%d")),
        IcsTime::Utc(dt) => format!("{}:{}", name, dt.format("%Y%m%dT%H%M%SZ")),
        IcsTime::Floating(naive) => format!("{}:{}Z", name, naive.format("%Y%m%dT%H%M%S")),
        IcsTime::Zoned { date_time, tzid } => match resolve_tz(tzid) {
            Some(tz) => format!(
                "{};TZID={}:{}",
                name,
                tz.name(),
                date_time.format("%Y%m%dT%H%M%S")
            ),
            None => format!("{}:{}Z", name, date_time.format("%Y%m%dT%H%M%S")),
        },
    }
}

/// Rewrites a date-only or floating `UNTIL` as UTC, which the rrule crate
/// requires once `DTSTART` carries a timezone.
fn normalize_until(rrule: &str) -> String {
    rrule
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") && !value.ends_with('Z') => {
                if value.len() == 8 {
                    format!("{}={}T235959Z", key, value)
                } else {
                    format!("{}={}Z", key, value)
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Converts a generated instance back to the kind of the series start.
fn occurrence_time(dt: &DateTime<rrule::Tz>, master_start: &IcsTime) -> IcsTime {
    match master_start {
        IcsTime::Date(_) => IcsTime::Date(dt.date_naive()),
        IcsTime::Utc(_) => IcsTime::Utc(dt.with_timezone(&Utc)),
        IcsTime::Floating(_) => IcsTime::Floating(dt.naive_utc()),
        IcsTime::Zoned { tzid, .. } => IcsTime::Zoned {
            date_time: dt.naive_local(),
            tzid: tzid.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::parse_feed;
    use crate::raw_event::RawTime;
    use chrono::{NaiveDate, TimeZone};

    fn window(start: (i32, u32, u32), end: (i32, u32, u32)) -> SyncWindow {
        SyncWindow::new(
            Utc.with_ymd_and_hms(start.0, start.1, start.2, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(end.0, end.1, end.2, 0, 0, 0).unwrap(),
        )
    }

    fn start_instant(occ: &RawOccurrence) -> DateTime<Utc> {
        match occ.start {
            Some(RawTime::DateTime(dt)) => dt.with_timezone(&Utc),
            ref other => panic!("expected instant, got {:?}", other),
        }
    }

    #[test]
    fn weekly_series_with_exdate_and_override() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   VERSION:2.0\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:club@school\r\n\
                   DTSTART;TZID=Europe/London:20240304T090000\r\n\
                   DTEND;TZID=Europe/London:20240304T100000\r\n\
                   RRULE:FREQ=WEEKLY;COUNT=4\r\n\
                   EXDATE;TZID=Europe/London:20240311T090000\r\n\
                   SUMMARY:Chess club\r\n\
                   END:VEVENT\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:club@school\r\n\
                   RECURRENCE-ID;TZID=Europe/London:20240318T090000\r\n\
                   DTSTART;TZID=Europe/London:20240318T140000\r\n\
                   DTEND;TZID=Europe/London:20240318T150000\r\n\
                   SUMMARY:Chess club (moved)\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";

        let occurrences = parse_feed(ics, &window((2024, 3, 1), (2024, 4, 30))).unwrap();
        let mut starts: Vec<_> = occurrences.iter().map(start_instant).collect();
        starts.sort();

        assert_eq!(
            starts,
            vec![
                Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 18, 14, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 25, 9, 0, 0).unwrap(),
            ]
        );

        let moved = occurrences
            .iter()
            .find(|o| o.summary.as_deref() == Some("Chess club (moved)"))
            .unwrap();
        assert_eq!(moved.uid, "club@school");
    }

    #[test]
    fn all_day_series_keeps_dates() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:camp\r\n\
                   DTSTART;VALUE=DATE:20240610\r\n\
                   DTEND;VALUE=DATE:20240612\r\n\
                   RRULE:FREQ=WEEKLY;UNTIL=20240624\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";

        let occurrences = parse_feed(ics, &window((2024, 6, 1), (2024, 7, 31))).unwrap();
        let date = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();

        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences[0].start, Some(RawTime::Date(date(10))));
        assert_eq!(occurrences[0].end, Some(RawTime::Date(date(12))));
        assert_eq!(occurrences[2].start, Some(RawTime::Date(date(24))));
        assert_eq!(occurrences[2].end, Some(RawTime::Date(date(26))));
        assert!(occurrences.iter().all(|o| o.all_day));
    }

    #[test]
    fn expansion_is_bounded_by_window() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:daily\r\n\
                   DTSTART:20240101T080000Z\r\n\
                   DTEND:20240101T083000Z\r\n\
                   RRULE:FREQ=DAILY\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";

        let occurrences = parse_feed(ics, &window((2024, 3, 1), (2024, 3, 8))).unwrap();
        assert_eq!(occurrences.len(), 7);
        assert_eq!(
            start_instant(&occurrences[0]),
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn invalid_rrule_keeps_master() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:broken\r\n\
                   DTSTART:20240301T080000Z\r\n\
                   DTEND:20240301T090000Z\r\n\
                   RRULE:FREQ=SOMETIMES\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR\r\n";

        let occurrences = parse_feed(ics, &window((2024, 3, 1), (2024, 3, 8))).unwrap();
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].uid, "broken");
    }

    #[test]
    fn until_normalization() {
        assert_eq!(
            normalize_until("FREQ=WEEKLY;UNTIL=20240624"),
            "FREQ=WEEKLY;UNTIL=20240624T235959Z"
        );
        assert_eq!(
            normalize_until("FREQ=DAILY;UNTIL=20240624T100000"),
            "FREQ=DAILY;UNTIL=20240624T100000Z"
        );
        assert_eq!(
            normalize_until("FREQ=DAILY;UNTIL=20240624T100000Z;COUNT=3"),
            "FREQ=DAILY;UNTIL=20240624T100000Z;COUNT=3"
        );
    }
}
