//! Raw occurrence type produced by feed sources.
//!
//! A [`RawOccurrence`] carries one occurrence exactly as the feed described
//! it, before any normalization. Optional attributes that feeds may or may
//! not provide (status, transparency, busy status) are explicit `Option`
//! fields; resolving their absence is the canonicalizer's job.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// One boundary of a raw occurrence as found in the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum RawTime {
    /// An instant with a known UTC offset.
    DateTime(DateTime<FixedOffset>),
    /// A wall-clock time without timezone information.
    Floating(NaiveDateTime),
    /// A bare calendar date (all-day boundary).
    Date(NaiveDate),
}

impl RawTime {
    /// Returns true if this boundary is a bare date.
    pub fn is_date(&self) -> bool {
        matches!(self, Self::Date(_))
    }
}

impl From<NaiveDate> for RawTime {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<FixedOffset>> for RawTime {
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<NaiveDateTime> for RawTime {
    fn from(dt: NaiveDateTime) -> Self {
        Self::Floating(dt)
    }
}

/// An occurrence read from the feed.
///
/// Recurring series are expected to be expanded by the feed source, so every
/// value describes a single concrete occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawOccurrence {
    /// The feed's identifier for the event (ICS `UID`).
    pub uid: String,

    /// The event status (e.g. "CONFIRMED", "TENTATIVE", "CANCELLED").
    pub status: Option<String>,

    /// When the occurrence starts, if the feed gave a usable value.
    pub start: Option<RawTime>,

    /// When the occurrence ends, if the feed gave a usable value.
    pub end: Option<RawTime>,

    /// Whether the feed flagged the occurrence as all-day.
    pub all_day: bool,

    /// The ICS `TRANSP` value ("OPAQUE" / "TRANSPARENT"). Absent means busy.
    pub transparency: Option<String>,

    /// A show-as / busy-status hint (e.g. `X-MICROSOFT-CDO-BUSYSTATUS`).
    pub show_as: Option<String>,

    /// The event title.
    pub summary: Option<String>,

    /// The event location.
    pub location: Option<String>,

    /// The event description.
    pub description: Option<String>,
}

impl RawOccurrence {
    /// Creates a raw occurrence with the given uid and boundaries.
    pub fn new(uid: impl Into<String>, start: impl Into<RawTime>, end: impl Into<RawTime>) -> Self {
        Self {
            uid: uid.into(),
            start: Some(start.into()),
            end: Some(end.into()),
            ..Self::default()
        }
    }

    /// Returns true if the feed marked this occurrence as cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.status.as_deref().is_some_and(|s| {
            s.eq_ignore_ascii_case("cancelled") || s.eq_ignore_ascii_case("canceled")
        })
    }

    /// Builder method to set the status.
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    /// Builder method to set the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the transparency.
    pub fn with_transparency(mut self, transparency: impl Into<String>) -> Self {
        self.transparency = Some(transparency.into());
        self
    }

    /// Builder method to set the show-as hint.
    pub fn with_show_as(mut self, show_as: impl Into<String>) -> Self {
        self.show_as = Some(show_as.into());
        self
    }

    /// Builder method to flag the occurrence as all-day.
    pub fn with_all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }
}
