//! Engine configuration.
//!
//! A [`SyncConfig`] is built once by the caller and handed to the
//! [`SyncEngine`](crate::SyncEngine); nothing is read from the environment
//! at cycle time.

use chrono::{DateTime, Utc};
use icsbridge_core::SyncWindow;
use icsbridge_providers::MirrorSource;
use serde::{Deserialize, Serialize};

/// How mirrored items are rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSettings {
    /// Text prepended to every mirrored title.
    pub title_prefix: String,
    /// Blank the visible text of every mirror, keeping only busy time.
    pub busy_blockers: bool,
    /// Title used when the feed gives none.
    pub fallback_title: String,
    /// Attribution attached to each mirror.
    pub source: Option<MirrorSource>,
}

impl MirrorSettings {
    /// Default fallback title.
    pub const DEFAULT_FALLBACK_TITLE: &'static str = "Untitled event";
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            title_prefix: String::new(),
            busy_blockers: false,
            fallback_title: Self::DEFAULT_FALLBACK_TITLE.to_string(),
            source: None,
        }
    }
}

/// Configuration consumed by the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Identifier of the target calendar, for logging.
    pub calendar_id: String,
    /// Days before now covered by the window.
    pub lookback_days: u32,
    /// Days after now covered by the window.
    pub lookahead_days: u32,
    /// Rendering options.
    pub mirror: MirrorSettings,
}

impl SyncConfig {
    /// Default lookback in days.
    pub const DEFAULT_LOOKBACK_DAYS: u32 = 1;

    /// Default lookahead in days.
    pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 30;

    /// Largest lookback or lookahead accepted from configuration.
    pub const MAX_WINDOW_DAYS: u32 = 3660;

    /// Creates a configuration for `calendar_id` with default settings.
    pub fn new(calendar_id: impl Into<String>) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            lookback_days: Self::DEFAULT_LOOKBACK_DAYS,
            lookahead_days: Self::DEFAULT_LOOKAHEAD_DAYS,
            mirror: MirrorSettings::default(),
        }
    }

    /// Sets the window extent.
    pub fn with_window_days(mut self, lookback_days: u32, lookahead_days: u32) -> Self {
        self.lookback_days = lookback_days;
        self.lookahead_days = lookahead_days;
        self
    }

    /// Sets the rendering options.
    pub fn with_mirror(mut self, mirror: MirrorSettings) -> Self {
        self.mirror = mirror;
        self
    }

    /// Returns the window a cycle started at `now` operates on.
    pub fn window_at(&self, now: DateTime<Utc>) -> SyncWindow {
        SyncWindow::around(now, self.lookback_days, self.lookahead_days)
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new("primary")
    }
}
