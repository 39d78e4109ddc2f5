//! Run command: the sync daemon in the foreground.
//!
//! Cycles run on the poll interval until SIGINT or SIGTERM. A cycle in
//! progress at shutdown is allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use icsbridge_server::{Scheduler, SchedulerHandle};
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// How long shutdown waits for a running cycle.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Starts the scheduler and blocks until a shutdown signal.
pub async fn run(config: &ClientConfig, print_history: bool) -> ClientResult<()> {
    let engine = Arc::new(super::build_engine(config)?);
    let scheduler = Scheduler::new(config.scheduler_config(), engine)?;
    let handle = scheduler.handle();
    let mut task = tokio::spawn(scheduler.run());

    info!(poll_seconds = config.schedule.poll_seconds, "icsbridge running");

    tokio::select! {
        signal = shutdown_signal() => signal?,
        joined = &mut task => {
            return joined.map_err(|e| ClientError::Server(format!("scheduler task failed: {}", e)));
        }
    }

    info!("Shutting down...");
    if let Err(e) = handle.stop().await {
        warn!(error = %e, "Failed to send stop command to scheduler");
    }
    if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
        warn!("Sync cycle still running at shutdown, abandoning it");
    }

    if print_history {
        print_history_json(&handle).await?;
    }

    info!("icsbridge stopped");
    Ok(())
}

async fn print_history_json(handle: &SchedulerHandle) -> ClientResult<()> {
    let history = handle.history().await;
    let text = history
        .to_json()
        .map_err(|e| ClientError::Server(format!("failed to serialize history: {}", e)))?;
    println!("{}", text);
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> ClientResult<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = sigterm.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> ClientResult<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
