//! Core types: time, canonical events, identity keys, tracing

pub mod event;
pub mod time;
pub mod tracing;

pub use event::{CanonicalEvent, IdentityKey, KEY_SEPARATOR};
pub use time::{EventTime, SyncWindow};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
