//! Google Calendar target.
//!
//! This module provides a [`GoogleCalendarClient`] that writes mirrors to a
//! Google calendar through the Calendar API v3.
//!
//! # Authentication
//!
//! The client reads an already-issued OAuth access token from a JSON file
//! before each request. Obtaining and refreshing that token is left to an
//! external helper; an expired or revoked token surfaces as
//! [`ProviderErrorCode::AuthenticationFailed`](crate::ProviderErrorCode::AuthenticationFailed).
//!
//! # Example
//!
//! ```ignore
//! use icsbridge_providers::google::{GoogleCalendarClient, GoogleConfig};
//!
//! let config = GoogleConfig::new("family@group.calendar.google.com")
//!     .with_token_path("/var/lib/icsbridge/token.json");
//! let client = GoogleCalendarClient::new(config)?;
//! ```

mod client;
mod config;
mod tokens;

pub use client::GoogleCalendarClient;
pub use config::{CALENDAR_API_BASE, GoogleConfig};
pub use tokens::{AccessToken, TokenFile};
