//! Background scheduler for sync cycles.
//!
//! The scheduler runs a cycle, waits the poll interval after it completes,
//! and repeats until stopped. A [`SchedulerHandle`] can also trigger a cycle
//! directly; it goes through the engine's own guard, so it is rejected while
//! the scheduled cycle runs.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use icsbridge_sync::{SyncEngine, SyncError, SyncResult};
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, error, info};

use crate::error::{ServerError, ServerResult};
use crate::history::{DEFAULT_HISTORY_CAPACITY, SyncHistory, SyncRecord};

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Pause between the end of one cycle and the start of the next.
    pub poll_interval: Duration,
    /// Cycles kept in the history.
    pub history_capacity: usize,
}

impl SchedulerConfig {
    /// Default poll interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(900);

    /// Creates a config with the given poll interval.
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            ..Default::default()
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

/// Commands that can be sent to the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerCommand {
    /// Stop after the current cycle.
    Stop,
}

/// Scheduler state.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    /// Number of consecutive failed cycles.
    pub consecutive_failures: u32,
    /// Last successful cycle.
    pub last_sync: Option<DateTime<Utc>>,
    /// Last cycle, successful or not.
    pub last_attempt: Option<DateTime<Utc>>,
    /// Last error message.
    pub last_error: Option<String>,
    /// Recent cycles.
    pub history: SyncHistory,
}

impl SchedulerState {
    /// Creates a new scheduler state.
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: SyncHistory::new(history_capacity),
            ..Self::default()
        }
    }

    /// Records a completed cycle.
    pub fn record_success(&mut self, at: DateTime<Utc>, result: SyncResult) {
        self.consecutive_failures = 0;
        self.last_sync = Some(at);
        self.last_attempt = Some(at);
        self.last_error = None;
        self.history.push(SyncRecord::success(at, result));
    }

    /// Records a failed cycle.
    pub fn record_failure(&mut self, at: DateTime<Utc>, error: impl Into<String>) {
        let error = error.into();
        self.consecutive_failures += 1;
        self.last_attempt = Some(at);
        self.last_error = Some(error.clone());
        self.history.push(SyncRecord::failure(at, error));
    }

    /// Records the outcome of a cycle. Rejected cycles leave no trace.
    fn record(&mut self, outcome: &Result<SyncResult, SyncError>) {
        let now = Utc::now();
        match outcome {
            Ok(result) => self.record_success(now, *result),
            Err(SyncError::AlreadyRunning) => {}
            Err(e) => self.record_failure(now, e.to_string()),
        }
    }
}

/// Shared scheduler state.
pub type SharedSchedulerState = Arc<RwLock<SchedulerState>>;

/// Runs sync cycles on a fixed interval.
pub struct Scheduler {
    config: SchedulerConfig,
    engine: Arc<SyncEngine>,
    state: SharedSchedulerState,
    command_tx: mpsc::Sender<SchedulerCommand>,
    command_rx: mpsc::Receiver<SchedulerCommand>,
}

impl Scheduler {
    /// Creates a scheduler driving `engine`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a zero poll interval.
    pub fn new(config: SchedulerConfig, engine: Arc<SyncEngine>) -> ServerResult<Self> {
        if config.poll_interval.is_zero() {
            return Err(ServerError::config("poll interval must be greater than zero"));
        }
        let (command_tx, command_rx) = mpsc::channel(16);
        Ok(Self {
            state: Arc::new(RwLock::new(SchedulerState::new(config.history_capacity))),
            config,
            engine,
            command_tx,
            command_rx,
        })
    }

    /// Returns a handle for triggering cycles and stopping the scheduler.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            command_tx: self.command_tx.clone(),
            state: self.state.clone(),
            engine: self.engine.clone(),
        }
    }

    /// Returns the shared state.
    pub fn state(&self) -> SharedSchedulerState {
        self.state.clone()
    }

    /// Runs cycles until a [`SchedulerCommand::Stop`] arrives.
    ///
    /// Commands are only read between cycles; a running cycle is never
    /// interrupted.
    pub async fn run(mut self) {
        info!(
            poll_secs = self.config.poll_interval.as_secs(),
            "Scheduler started"
        );

        loop {
            self.run_cycle().await;

            debug!(
                delay_secs = self.config.poll_interval.as_secs(),
                "Scheduling next cycle"
            );
            tokio::select! {
                _ = tokio::time::sleep(self.config.poll_interval) => {}
                cmd = self.command_rx.recv() => match cmd {
                    Some(SchedulerCommand::Stop) | None => {
                        info!("Scheduler stopping");
                        break;
                    }
                }
            }
        }
    }

    async fn run_cycle(&self) {
        let outcome = self.engine.try_run_cycle().await;
        match &outcome {
            Ok(_) => {}
            Err(SyncError::AlreadyRunning) => {
                debug!("Manual cycle in progress, skipping scheduled cycle");
            }
            Err(e) => error!(error = %e, "Sync cycle failed"),
        }
        self.state.write().await.record(&outcome);
    }
}

/// Handle to a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    command_tx: mpsc::Sender<SchedulerCommand>,
    state: SharedSchedulerState,
    engine: Arc<SyncEngine>,
}

impl SchedulerHandle {
    /// Runs a cycle now, in the caller's task.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::AlreadyRunning`] if a cycle is in progress, or
    /// the error that failed the cycle.
    pub async fn trigger(&self) -> Result<SyncResult, SyncError> {
        info!("Manual sync triggered");
        let outcome = self.engine.try_run_cycle().await;
        self.state.write().await.record(&outcome);
        outcome
    }

    /// Asks the scheduler to stop after its current cycle.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::SchedulerStopped`] if the scheduler is gone.
    pub async fn stop(&self) -> ServerResult<()> {
        self.command_tx
            .send(SchedulerCommand::Stop)
            .await
            .map_err(|_| ServerError::SchedulerStopped)
    }

    /// Returns true while a cycle is running.
    pub fn is_syncing(&self) -> bool {
        self.engine.is_running()
    }

    /// Returns a snapshot of the scheduler state.
    pub async fn state(&self) -> SchedulerState {
        self.state.read().await.clone()
    }

    /// Returns a snapshot of the history.
    pub async fn history(&self) -> SyncHistory {
        self.state.read().await.history.clone()
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("syncing", &self.engine.is_running())
            .finish_non_exhaustive()
    }
}
