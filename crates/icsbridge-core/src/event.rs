//! Canonical occurrence and identity types.
//!
//! A [`CanonicalEvent`] is what every feed occurrence is reduced to before
//! it is compared against the mirror calendar. Each one is addressed by an
//! [`IdentityKey`] that stays the same across sync cycles.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::time::EventTime;

/// Separator between the uid and the start fragment of an identity key.
pub const KEY_SEPARATOR: char = '|';

/// A stable identifier for one logical occurrence of a feed event.
///
/// Built from the feed uid and the normalized start of the occurrence, so
/// recurring instances of the same uid get distinct keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityKey(String);

impl IdentityKey {
    /// Wraps an already-derived key string (e.g. one read back from a mirror).
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the uid portion of the key.
    pub fn uid(&self) -> &str {
        self.0
            .rsplit_once(KEY_SEPARATOR)
            .map(|(uid, _)| uid)
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for IdentityKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A feed occurrence after normalization.
///
/// Both boundaries are either instants in UTC or (for all-day occurrences)
/// calendar dates with an exclusive end date. `end >= start` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// The feed uid this occurrence came from.
    pub uid: String,
    /// When the occurrence starts.
    pub start: EventTime,
    /// When the occurrence ends (exclusive date for all-day occurrences).
    pub end: EventTime,
    /// Whether the occurrence spans whole calendar days.
    pub is_all_day: bool,
    /// The occurrence title, if any.
    pub title: Option<String>,
    /// The occurrence location, if any.
    pub location: Option<String>,
    /// The occurrence description, if any.
    pub description: Option<String>,
    /// Whether the occurrence should block time (opaque) on the mirror.
    pub busy: bool,
}

impl CanonicalEvent {
    /// Creates a busy, untitled occurrence.
    ///
    /// If `end` precedes `start` it is clamped to `start`. Mixing an all-day
    /// boundary with an instant reduces both boundaries to dates.
    pub fn new(uid: impl Into<String>, start: EventTime, end: EventTime) -> Self {
        let is_all_day = start.is_all_day() || end.is_all_day();
        let (start, end) = if is_all_day {
            (start.to_all_day(), end.to_all_day())
        } else {
            (start, end)
        };
        let end = if end < start { start } else { end };

        Self {
            uid: uid.into(),
            start,
            end,
            is_all_day,
            title: None,
            location: None,
            description: None,
            busy: true,
        }
    }

    /// Returns the title when it carries visible text.
    pub fn effective_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
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

    /// Builder method to set busy/free.
    pub fn with_busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }
}
