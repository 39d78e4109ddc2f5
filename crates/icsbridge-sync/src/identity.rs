//! Identity keys for occurrences.
//!
//! A key is `uid|fragment`, where the fragment is the ISO date of an all-day
//! occurrence or the RFC 3339 UTC start (`+00:00` offset) of a timed one.
//! Keys are written onto every mirror, so the format must never change.

use chrono::SecondsFormat;
use icsbridge_core::{CanonicalEvent, EventTime, IdentityKey, KEY_SEPARATOR};

/// Derives the identity key of the occurrence of `uid` starting at `start`.
pub fn derive_key(uid: &str, start: &EventTime) -> IdentityKey {
    let fragment = match start {
        EventTime::AllDay(date) => date.format("%Y-%m-%d").to_string(),
        EventTime::DateTime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, false),
    };
    IdentityKey::new(format!("{}{}{}", uid, KEY_SEPARATOR, fragment))
}

/// Derives the identity key of a canonical occurrence.
pub fn event_key(event: &CanonicalEvent) -> IdentityKey {
    derive_key(&event.uid, &event.start)
}
