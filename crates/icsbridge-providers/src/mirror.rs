//! Wire types for mirrored items on the target calendar.
//!
//! [`MirrorBody`] is what the sync engine writes; [`MirrorItem`] is what the
//! calendar hands back. Both use the Google Calendar v3 event JSON layout, so
//! they serialize directly into request bodies and deserialize directly from
//! list responses.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use icsbridge_core::{EventTime, IdentityKey, SyncWindow};
use serde::{Deserialize, Serialize};

/// Private property flagging an item as created by icsbridge.
pub const MARKER_PROPERTY: &str = "ics_bridge";
/// Value of [`MARKER_PROPERTY`] on mirrored items.
pub const MARKER_VALUE: &str = "true";
/// Private property holding the occurrence's identity key.
pub const KEY_PROPERTY: &str = "ics_key";
/// Private property holding the feed uid.
pub const UID_PROPERTY: &str = "ics_uid";

/// Start or end of a mirrored item.
///
/// Exactly one of `date` (all-day) or `date_time` (RFC 3339 instant) is set
/// on bodies we write. Both keys are always serialized so that a patch
/// switching between all-day and timed clears the stale field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorTime {
    /// ISO date (`YYYY-MM-DD`) for all-day items.
    #[serde(default)]
    pub date: Option<String>,
    /// RFC 3339 instant for timed items.
    #[serde(default)]
    pub date_time: Option<String>,
    /// IANA timezone echoed by the calendar; never written.
    #[serde(default, skip_serializing)]
    pub time_zone: Option<String>,
}

impl MirrorTime {
    /// Creates an all-day boundary.
    pub fn date(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Self::default()
        }
    }

    /// Creates a timed boundary.
    pub fn date_time(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            ..Self::default()
        }
    }

    /// Returns whichever of `date_time` or `date` is populated.
    pub fn effective(&self) -> Option<&str> {
        self.date_time
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.date.as_deref().filter(|s| !s.is_empty()))
    }

    /// Parses the populated field back into an [`EventTime`].
    pub fn to_event_time(&self) -> Option<EventTime> {
        if let Some(date_time) = self.date_time.as_deref().filter(|s| !s.is_empty()) {
            return DateTime::parse_from_rfc3339(date_time)
                .ok()
                .map(|dt| EventTime::from_utc(dt.with_timezone(&Utc)));
        }
        self.date
            .as_deref()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(EventTime::from_date)
    }
}

/// Item visibility on the target calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Calendar default visibility.
    #[default]
    Default,
    /// Visible to everyone who can see the calendar.
    Public,
    /// Details visible only to calendar owners.
    Private,
    /// Treated as private by the calendar.
    Confidential,
}

impl Visibility {
    /// Returns the wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Public => "public",
            Self::Private => "private",
            Self::Confidential => "confidential",
        }
    }
}

/// Whether the item blocks time on the calendar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transparency {
    /// Busy.
    #[default]
    Opaque,
    /// Free.
    Transparent,
}

impl Transparency {
    /// Maps a busy flag to a transparency.
    pub fn from_busy(busy: bool) -> Self {
        if busy { Self::Opaque } else { Self::Transparent }
    }

    /// Returns the wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opaque => "opaque",
            Self::Transparent => "transparent",
        }
    }
}

/// Extended properties attached to a calendar item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedProperties {
    /// Properties visible only to the calendar owner's API clients.
    #[serde(default)]
    pub private: BTreeMap<String, String>,
}

impl ExtendedProperties {
    /// Builds the marker block identifying a mirrored item.
    pub fn marker(key: &IdentityKey, uid: &str) -> Self {
        let mut private = BTreeMap::new();
        private.insert(MARKER_PROPERTY.to_string(), MARKER_VALUE.to_string());
        private.insert(KEY_PROPERTY.to_string(), key.as_str().to_string());
        private.insert(UID_PROPERTY.to_string(), uid.to_string());
        Self { private }
    }
}

/// Where a mirrored item came from, shown by calendar UIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSource {
    /// Label for the source.
    pub title: String,
    /// Feed URL.
    pub url: String,
}

/// The desired state of one mirrored item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorBody {
    /// Visible title (blank for busy blockers).
    pub summary: String,
    /// Visible location.
    pub location: Option<String>,
    /// Visible description.
    pub description: Option<String>,
    /// Start boundary.
    pub start: MirrorTime,
    /// End boundary.
    pub end: MirrorTime,
    /// Visibility; always private for mirrors.
    pub visibility: Visibility,
    /// Busy/free.
    pub transparency: Transparency,
    /// Marker and identity metadata.
    pub extended_properties: ExtendedProperties,
    /// Feed attribution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<MirrorSource>,
}

impl MirrorBody {
    /// Returns the identity key embedded in the body.
    pub fn identity_key(&self) -> Option<IdentityKey> {
        self.extended_properties
            .private
            .get(KEY_PROPERTY)
            .map(|k| IdentityKey::new(k.as_str()))
    }
}

/// An item read back from the target calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorItem {
    /// Calendar-assigned identifier.
    pub id: String,
    /// Item status ("confirmed", "cancelled", ...).
    #[serde(default)]
    pub status: Option<String>,
    /// Visible title.
    #[serde(default)]
    pub summary: Option<String>,
    /// Visible location.
    #[serde(default)]
    pub location: Option<String>,
    /// Visible description.
    #[serde(default)]
    pub description: Option<String>,
    /// Start boundary.
    #[serde(default)]
    pub start: MirrorTime,
    /// End boundary.
    #[serde(default)]
    pub end: MirrorTime,
    /// Visibility; omitted by the API when it is the default.
    #[serde(default)]
    pub visibility: Option<String>,
    /// Transparency; omitted by the API when it is opaque.
    #[serde(default)]
    pub transparency: Option<String>,
    /// Extended properties, including our marker.
    #[serde(default)]
    pub extended_properties: Option<ExtendedProperties>,
    /// Last modification time reported by the calendar.
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
}

impl MirrorItem {
    /// Builds the item a calendar would return after storing `body` under `id`.
    pub fn from_body(id: impl Into<String>, body: &MirrorBody) -> Self {
        Self {
            id: id.into(),
            status: Some("confirmed".to_string()),
            summary: Some(body.summary.clone()),
            location: body.location.clone(),
            description: body.description.clone(),
            start: body.start.clone(),
            end: body.end.clone(),
            visibility: Some(body.visibility.as_str().to_string()),
            transparency: Some(body.transparency.as_str().to_string()),
            extended_properties: Some(body.extended_properties.clone()),
            updated: None,
        }
    }

    /// Returns a private extended property value.
    pub fn private_property(&self, name: &str) -> Option<&str> {
        self.extended_properties
            .as_ref()
            .and_then(|p| p.private.get(name))
            .map(String::as_str)
    }

    /// Returns true if the item carries the mirror marker.
    pub fn is_marked(&self) -> bool {
        self.private_property(MARKER_PROPERTY) == Some(MARKER_VALUE)
    }

    /// Returns the identity key stored on the item.
    pub fn identity_key(&self) -> Option<IdentityKey> {
        self.private_property(KEY_PROPERTY)
            .filter(|k| !k.is_empty())
            .map(IdentityKey::new)
    }
}

/// Query for one page of the mirror inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorQuery {
    /// Lower bound (exclusive) on item end.
    pub time_min: DateTime<Utc>,
    /// Upper bound (exclusive) on item start.
    pub time_max: DateTime<Utc>,
    /// Exact-match private property filter (`name`, `value`).
    pub private_property: (String, String),
    /// Page size.
    pub max_results: u32,
    /// Expand recurring items into single occurrences.
    pub single_events: bool,
    /// Include deleted items.
    pub show_deleted: bool,
}

impl MirrorQuery {
    /// Maximum page size accepted by the Calendar API.
    pub const MAX_PAGE_SIZE: u32 = 2500;

    /// Builds the inventory query for a sync window.
    ///
    /// The calendar places all-day items in its own timezone, which can be up
    /// to a day away from UTC, so the query reaches one day past each end of
    /// the window. Callers narrow the result back to the window themselves.
    pub fn for_window(window: &SyncWindow) -> Self {
        let reach = window.widened(Duration::days(1));
        Self {
            time_min: reach.start,
            time_max: reach.end,
            private_property: (MARKER_PROPERTY.to_string(), MARKER_VALUE.to_string()),
            max_results: Self::MAX_PAGE_SIZE,
            single_events: true,
            show_deleted: false,
        }
    }

    /// Renders the private property filter as `name=value`.
    pub fn private_property_filter(&self) -> String {
        format!("{}={}", self.private_property.0, self.private_property.1)
    }
}

/// One page of a mirror listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirrorPage {
    /// Items on this page.
    pub items: Vec<MirrorItem>,
    /// Continuation token, if more pages follow.
    pub next_page_token: Option<String>,
}
