//! Reconciliation engine for icsbridge.
//!
//! Each cycle turns feed occurrences into desired mirrors, lists the mirrors
//! already on the target calendar, and applies the smallest set of writes
//! that makes the two agree:
//!
//! 1. [`canonicalize`] every [`RawOccurrence`](icsbridge_providers::RawOccurrence)
//! 2. key it with [`derive_key`] and render it with [`build_body`]
//! 3. [`read_inventory`] and [`index_inventory`] the existing mirrors
//! 4. [`plan`] the creates, updates and deletes
//! 5. [`apply`] the plan with pacing and per-item failure isolation
//!
//! [`SyncEngine`] drives the steps and guards against overlapping cycles.

pub mod applier;
pub mod body;
pub mod canonicalize;
pub mod config;
pub mod engine;
pub mod equality;
pub mod error;
pub mod identity;
pub mod inventory;
pub mod pacing;
pub mod planner;

pub use applier::{SyncResult, WriteOutcome, apply};
pub use body::build_body;
pub use canonicalize::{SkipReason, canonicalize};
pub use config::{MirrorSettings, SyncConfig};
pub use engine::{CyclePhase, SyncEngine};
pub use equality::{MirrorProjection, is_equivalent};
pub use error::SyncError;
pub use identity::{derive_key, event_key};
pub use inventory::{Inventory, index_inventory, read_inventory};
pub use pacing::{DelayRange, Pacing};
pub use planner::{
    DeleteReason, PlannedCreate, PlannedDelete, PlannedUpdate, SyncPlan, plan,
};
