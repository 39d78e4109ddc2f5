//! One fetch, plan and apply cycle.
//!
//! [`SyncEngine`] owns the feed, the target calendar and the at-most-one
//! cycle guard. Callers never hold a lock: a cycle started while another is
//! running fails immediately with [`SyncError::AlreadyRunning`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use chrono::{DateTime, Utc};
use icsbridge_core::{IdentityKey, SyncWindow};
use icsbridge_providers::{FeedSource, MirrorBody, RawOccurrence, TargetCalendar};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::applier::{SyncResult, apply};
use crate::body::build_body;
use crate::canonicalize::canonicalize;
use crate::config::{MirrorSettings, SyncConfig};
use crate::error::SyncError;
use crate::identity::event_key;
use crate::inventory::{index_inventory, read_inventory};
use crate::pacing::Pacing;
use crate::planner::plan;

/// Where a cycle currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CyclePhase {
    Idle = 0,
    FetchingFeed = 1,
    FetchingMirror = 2,
    Planning = 3,
    Applying = 4,
}

impl CyclePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::FetchingFeed,
            2 => Self::FetchingMirror,
            3 => Self::Planning,
            4 => Self::Applying,
            _ => Self::Idle,
        }
    }

    /// Returns a short name for this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::FetchingFeed => "fetching_feed",
            Self::FetchingMirror => "fetching_mirror",
            Self::Planning => "planning",
            Self::Applying => "applying",
        }
    }
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reconciliation engine.
pub struct SyncEngine {
    feed: Arc<dyn FeedSource>,
    target: Arc<dyn TargetCalendar>,
    config: SyncConfig,
    pacing: Pacing,
    running: AtomicBool,
    phase: AtomicU8,
}

impl SyncEngine {
    /// Creates an engine mirroring `feed` onto `target`.
    pub fn new(
        feed: Arc<dyn FeedSource>,
        target: Arc<dyn TargetCalendar>,
        config: SyncConfig,
        pacing: Pacing,
    ) -> Self {
        Self {
            feed,
            target,
            config,
            pacing,
            running: AtomicBool::new(false),
            phase: AtomicU8::new(CyclePhase::Idle as u8),
        }
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the phase of the running cycle, or `Idle`.
    pub fn phase(&self) -> CyclePhase {
        CyclePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    /// Returns true while a cycle is in progress.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Runs one cycle for the window around the current time.
    ///
    /// # Errors
    ///
    /// See [`SyncEngine::run_cycle_at`].
    pub async fn try_run_cycle(&self) -> Result<SyncResult, SyncError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Runs one cycle for the window around `now`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyRunning`] without doing anything if
    /// another cycle holds the guard. Feed, inventory and authentication
    /// failures abort the cycle; per-item write failures do not.
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<SyncResult, SyncError> {
        let _guard = CycleGuard::acquire(&self.running, &self.phase)?;
        let window = self.config.window_at(now);

        let span = info_span!(
            "sync_cycle",
            calendar = %self.config.calendar_id,
            window_start = %window.start,
            window_end = %window.end,
        );
        self.run_guarded(&window).instrument(span).await
    }

    async fn run_guarded(&self, window: &SyncWindow) -> Result<SyncResult, SyncError> {
        self.set_phase(CyclePhase::FetchingFeed);
        let occurrences = self.feed.fetch(window).await.map_err(SyncError::Feed)?;
        let wanted = build_wanted(&occurrences, window, &self.config.mirror);
        debug!(
            occurrences = occurrences.len(),
            wanted = wanted.len(),
            "Built wanted set"
        );

        self.set_phase(CyclePhase::FetchingMirror);
        let items = read_inventory(self.target.as_ref(), window, &self.pacing)
            .await
            .map_err(|e| {
                if e.code().is_auth() {
                    SyncError::Authentication(e)
                } else {
                    SyncError::Inventory(e)
                }
            })?;

        self.set_phase(CyclePhase::Planning);
        let inventory = index_inventory(items);
        let wanted_count = wanted.len();
        let sync_plan = plan(wanted, inventory);
        debug!(
            creates = sync_plan.creates.len(),
            updates = sync_plan.updates.len(),
            deletes = sync_plan.deletes.len(),
            unchanged = sync_plan.unchanged,
            "Planned cycle"
        );

        self.set_phase(CyclePhase::Applying);
        let mut result = apply(&sync_plan, self.target.as_ref(), &self.pacing).await?;
        result.wanted = wanted_count;

        info!(
            wanted = result.wanted,
            created = result.created,
            updated = result.updated,
            deleted = result.deleted,
            unchanged = result.unchanged,
            failed = result.failed,
            "Sync cycle finished"
        );
        Ok(result)
    }

    fn set_phase(&self, phase: CyclePhase) {
        self.phase.store(phase as u8, Ordering::Release);
    }
}

impl fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncEngine")
            .field("feed", &self.feed.name())
            .field("target", &self.target.name())
            .field("config", &self.config)
            .field("phase", &self.phase())
            .finish()
    }
}

/// Turns feed occurrences into the desired mirrors, keyed by identity.
///
/// Occurrences that cannot be canonicalized or fall outside the window are
/// dropped. When two occurrences share a key the first one wins.
fn build_wanted(
    occurrences: &[RawOccurrence],
    window: &SyncWindow,
    settings: &MirrorSettings,
) -> BTreeMap<IdentityKey, MirrorBody> {
    let mut wanted = BTreeMap::new();
    for raw in occurrences {
        let event = match canonicalize(raw) {
            Ok(event) => event,
            Err(reason) => {
                debug!(uid = %raw.uid, %reason, "Skipping occurrence");
                continue;
            }
        };
        if !window.overlaps_event(&event.start, &event.end) {
            continue;
        }
        let key = event_key(&event);
        if wanted.contains_key(&key) {
            warn!(key = %key, "Feed repeats an occurrence, keeping the first");
            continue;
        }
        let body = build_body(&event, &key, settings);
        wanted.insert(key, body);
    }
    wanted
}

/// Holds the in-progress flag for the duration of a cycle.
struct CycleGuard<'a> {
    running: &'a AtomicBool,
    phase: &'a AtomicU8,
}

impl<'a> CycleGuard<'a> {
    fn acquire(running: &'a AtomicBool, phase: &'a AtomicU8) -> Result<Self, SyncError> {
        running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SyncError::AlreadyRunning)?;
        Ok(Self { running, phase })
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        self.phase.store(CyclePhase::Idle as u8, Ordering::Release);
        self.running.store(false, Ordering::Release);
    }
}
