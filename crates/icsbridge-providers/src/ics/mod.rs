//! ICS feed source.
//!
//! This module provides [`IcsFeed`], a [`FeedSource`](crate::FeedSource)
//! that downloads a published iCalendar URL and turns it into occurrences.
//!
//! # Features
//!
//! - `webcal://` URLs
//! - `TZID` resolution against the IANA database
//! - `RRULE`/`RDATE`/`EXDATE` expansion around the sync window
//! - `RECURRENCE-ID` overrides
//! - Missing `DTEND` derived from `DURATION` or RFC 5545 defaults
//!
//! # Example
//!
//! ```ignore
//! use icsbridge_providers::ics::{IcsFeed, IcsFeedConfig};
//!
//! let feed = IcsFeed::new(IcsFeedConfig::new("https://example.com/school.ics")?)?;
//! let occurrences = feed.fetch(&window).await?;
//! ```

mod config;
mod feed;
mod parse;
mod recurrence;

pub use config::IcsFeedConfig;
pub use feed::IcsFeed;
pub use parse::parse_feed;
