//! Daemon side of icsbridge: the sync scheduler and its history.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use icsbridge_server::{Scheduler, SchedulerConfig};
//!
//! let scheduler = Scheduler::new(SchedulerConfig::default(), Arc::new(engine))?;
//! let handle = scheduler.handle();
//! tokio::spawn(scheduler.run());
//!
//! // Later, from anywhere:
//! let result = handle.trigger().await?;
//! handle.stop().await?;
//! ```

mod error;
mod history;
mod scheduler;

pub use error::{ServerError, ServerResult};
pub use history::{DEFAULT_HISTORY_CAPACITY, SyncHistory, SyncRecord};
pub use scheduler::{
    Scheduler, SchedulerCommand, SchedulerConfig, SchedulerHandle, SchedulerState,
    SharedSchedulerState,
};
