//! iCalendar (RFC 5545) parsing for feed occurrences.
//!
//! Each `VEVENT` becomes a [`FeedEvent`]; recurring series are then expanded
//! by [`super::recurrence`] into one [`RawOccurrence`] per instance.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::parser::{Component, Property, read_calendar, unfold};
use icalendar::{CalendarDateTime, DatePerhapsTime};
use icsbridge_core::SyncWindow;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{RawOccurrence, RawTime};

use super::recurrence::expand_events;

/// A date or date-time value as written in the feed, before timezone
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum IcsTime {
    Date(NaiveDate),
    Utc(DateTime<Utc>),
    Floating(NaiveDateTime),
    Zoned { date_time: NaiveDateTime, tzid: String },
}

impl From<DatePerhapsTime> for IcsTime {
    fn from(value: DatePerhapsTime) -> Self {
        match value {
            DatePerhapsTime::Date(date) => Self::Date(date),
            DatePerhapsTime::DateTime(CalendarDateTime::Utc(dt)) => Self::Utc(dt),
            DatePerhapsTime::DateTime(CalendarDateTime::Floating(naive)) => Self::Floating(naive),
            DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid }) => {
                Self::Zoned { date_time, tzid }
            }
        }
    }
}

impl IcsTime {
    fn from_property(prop: &Property) -> Option<Self> {
        DatePerhapsTime::try_from(prop).ok().map(Self::from)
    }

    pub(crate) fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Resolves the value to a [`RawTime`]. Unknown TZIDs degrade to
    /// floating time.
    pub(crate) fn to_raw(&self) -> RawTime {
        match self {
            Self::Date(date) => RawTime::Date(*date),
            Self::Utc(dt) => RawTime::DateTime(dt.fixed_offset()),
            Self::Floating(naive) => RawTime::Floating(*naive),
            Self::Zoned { date_time, tzid } => match resolve_tz(tzid) {
                Some(tz) => RawTime::DateTime(localize(&tz, date_time).fixed_offset()),
                None => {
                    debug!(tzid = %tzid, "Unknown TZID, treating time as floating");
                    RawTime::Floating(*date_time)
                }
            },
        }
    }

    /// The instant this value denotes. Dates and floating times read as UTC.
    pub(crate) fn instant(&self) -> DateTime<Utc> {
        match self.to_raw() {
            RawTime::DateTime(dt) => dt.with_timezone(&Utc),
            RawTime::Floating(naive) => naive.and_utc(),
            RawTime::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }

    /// Moves the value by `delta`, keeping its kind. Dates move by whole days.
    pub(crate) fn shifted(&self, delta: Duration) -> Self {
        match self {
            Self::Date(date) => Self::Date(*date + Duration::days(delta.num_days())),
            Self::Utc(dt) => Self::Utc(*dt + delta),
            Self::Floating(naive) => Self::Floating(*naive + delta),
            Self::Zoned { date_time, tzid } => Self::Zoned {
                date_time: *date_time + delta,
                tzid: tzid.clone(),
            },
        }
    }
}

/// Looks up an IANA timezone by TZID.
pub(crate) fn resolve_tz(tzid: &str) -> Option<Tz> {
    tzid.trim()
        .trim_matches('"')
        .trim_start_matches('/')
        .parse::<Tz>()
        .ok()
}

fn localize(tz: &Tz, local: &NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(local) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Skipped by a DST transition
        LocalResult::None => tz
            .from_local_datetime(&(*local + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| tz.from_utc_datetime(local)),
    }
}

/// One `VEVENT` from the feed.
#[derive(Debug, Clone, Default)]
pub(crate) struct FeedEvent {
    pub uid: String,
    pub start: Option<IcsTime>,
    pub end: Option<IcsTime>,
    pub rrule: Option<String>,
    pub rdates: Vec<IcsTime>,
    pub exdates: Vec<IcsTime>,
    pub recurrence_id: Option<IcsTime>,
    pub all_day: bool,
    pub status: Option<String>,
    pub transparency: Option<String>,
    pub show_as: Option<String>,
    pub summary: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

impl FeedEvent {
    /// Distance between start and end; whole days for date-only events.
    pub(crate) fn length(&self) -> Duration {
        match (&self.start, &self.end) {
            (Some(IcsTime::Date(start)), Some(IcsTime::Date(end))) => {
                Duration::days((*end - *start).num_days())
            }
            (Some(start), Some(end)) => end.instant() - start.instant(),
            _ => Duration::zero(),
        }
    }

    /// The event as a single occurrence.
    pub(crate) fn to_raw(&self) -> RawOccurrence {
        self.build(self.start.as_ref(), self.end.as_ref())
    }

    /// The occurrence of a series starting at `start`.
    pub(crate) fn occurrence_at(&self, start: &IcsTime) -> RawOccurrence {
        let end = start.shifted(self.length());
        self.build(Some(start), Some(&end))
    }

    fn build(&self, start: Option<&IcsTime>, end: Option<&IcsTime>) -> RawOccurrence {
        RawOccurrence {
            uid: self.uid.clone(),
            status: self.status.clone(),
            start: start.map(IcsTime::to_raw),
            end: end.map(IcsTime::to_raw),
            all_day: self.all_day,
            transparency: self.transparency.clone(),
            show_as: self.show_as.clone(),
            summary: self.summary.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
        }
    }
}

/// Parses ICS content into occurrences, expanding recurring series that may
/// intersect `window`.
///
/// # Errors
///
/// Returns a feed error if the content is not an iCalendar document.
/// Individual malformed events are skipped.
pub fn parse_feed(content: &str, window: &SyncWindow) -> ProviderResult<Vec<RawOccurrence>> {
    let trimmed = content.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with("BEGIN:VCALENDAR") {
        return Err(ProviderError::feed("Response is not an iCalendar document"));
    }

    let unfolded = unfold(trimmed);
    let calendar = read_calendar(&unfolded)
        .map_err(|e| ProviderError::feed(format!("Failed to parse ICS content: {}", e)))?;

    let events: Vec<FeedEvent> = calendar
        .components
        .iter()
        .filter(|c| c.name == "VEVENT")
        .filter_map(parse_event)
        .collect();

    debug!(events = events.len(), "Parsed feed");
    Ok(expand_events(events, window))
}

/// Parses a single VEVENT component.
fn parse_event(vevent: &Component) -> Option<FeedEvent> {
    let Some(uid) = text(vevent, "UID") else {
        warn!("Skipping VEVENT without UID");
        return None;
    };

    let start = vevent.find_prop("DTSTART").and_then(IcsTime::from_property);
    let end = vevent
        .find_prop("DTEND")
        .and_then(IcsTime::from_property)
        .or_else(|| {
            let start = start.as_ref()?;
            let duration = vevent
                .find_prop("DURATION")
                .and_then(|p| parse_duration(p.val.as_ref()));
            Some(match duration {
                Some(duration) => start.shifted(duration),
                None => default_end(start),
            })
        });

    let all_day = start.as_ref().is_some_and(IcsTime::is_date)
        || vevent
            .find_prop("X-MICROSOFT-CDO-ALLDAYEVENT")
            .is_some_and(|p| p.val.as_ref().eq_ignore_ascii_case("TRUE"));

    let exdates = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_time_list)
        .collect();
    let rdates = vevent
        .properties
        .iter()
        .filter(|p| p.name == "RDATE")
        .flat_map(parse_time_list)
        .collect();

    Some(FeedEvent {
        uid,
        start,
        end,
        rrule: vevent.find_prop("RRULE").map(|p| p.val.to_string()),
        rdates,
        exdates,
        recurrence_id: vevent
            .find_prop("RECURRENCE-ID")
            .and_then(IcsTime::from_property),
        all_day,
        status: text(vevent, "STATUS"),
        transparency: text(vevent, "TRANSP"),
        show_as: text(vevent, "X-MICROSOFT-CDO-BUSYSTATUS"),
        summary: text(vevent, "SUMMARY"),
        location: text(vevent, "LOCATION"),
        description: text(vevent, "DESCRIPTION"),
    })
}

/// RFC 5545 default end: the next day for dates, the start instant otherwise.
fn default_end(start: &IcsTime) -> IcsTime {
    match start {
        IcsTime::Date(date) => IcsTime::Date(*date + Duration::days(1)),
        other => other.clone(),
    }
}

/// Parses a `DURATION` value such as `PT1H30M` or `P2D`.
fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim().trim_start_matches('+');
    let duration = iso8601::duration(value).ok()?;
    let std_duration: std::time::Duration = duration.into();
    Duration::from_std(std_duration).ok()
}

/// Returns an unescaped, non-empty text property.
fn text(component: &Component, name: &str) -> Option<String> {
    component
        .find_prop(name)
        .map(|p| unescape(p.val.as_ref()))
        .filter(|s| !s.trim().is_empty())
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Parses an EXDATE/RDATE property, which may carry several comma
/// separated values sharing one TZID or VALUE parameter.
fn parse_time_list(prop: &Property) -> Vec<IcsTime> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            if is_date || s.len() == 8 {
                return NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .map(IcsTime::Date);
            }
            if let Some(utc) = s.strip_suffix('Z') {
                return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| IcsTime::Utc(dt.and_utc()));
            }
            let naive = NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;
            Some(match tzid {
                Some(ref tz) => IcsTime::Zoned {
                    date_time: naive,
                    tzid: tz.clone(),
                },
                None => IcsTime::Floating(naive),
            })
        })
        .collect()
}
