//! Feed and target calendar providers.
//!
//! This crate provides everything the sync engine needs to talk to the
//! outside world:
//!
//! - [`FeedSource`] - A read-only source of occurrences ([`ics::IcsFeed`])
//! - [`TargetCalendar`] - The calendar receiving mirrors ([`google::GoogleCalendarClient`])
//! - [`RawOccurrence`] - One occurrence exactly as the feed described it
//! - [`MirrorBody`] / [`MirrorItem`] - Mirror wire types, written and read back
//! - [`ProviderError`] - Error types for remote operations
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                     ┌─────────────────┐
//! │   ICS feed URL  │                     │  Google API     │
//! └────────┬────────┘                     └────────▲────────┘
//!          │                                       │
//!          ▼                                       │
//! ┌─────────────────┐                     ┌────────┴─────────────┐
//! │    IcsFeed      │                     │ GoogleCalendarClient │
//! └────────┬────────┘                     └────────▲─────────────┘
//!          │ FeedSource                            │ TargetCalendar
//!          ▼                                       │
//!   Vec<RawOccurrence> ──────► sync engine ──► MirrorBody / MirrorItem
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod google;
#[cfg(feature = "ics")]
pub mod ics;
pub mod mirror;
pub mod provider;
pub mod raw_event;

// Re-export main types at crate root
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use mirror::{
    ExtendedProperties, KEY_PROPERTY, MARKER_PROPERTY, MARKER_VALUE, MirrorBody, MirrorItem,
    MirrorPage, MirrorQuery, MirrorSource, MirrorTime, Transparency, UID_PROPERTY, Visibility,
};
pub use provider::{BoxFuture, FeedSource, TargetCalendar};
pub use raw_event::{RawOccurrence, RawTime};
