//! Instance lock registry
//!
//! This module provides:
//! - **Lock data**: the progress payload, exclusive to one lock or shared
//!   (reference-counted) across every lock bound to one concrete instance
//! - **Locks**: the (owner, map, difficulty) bindings with expiry and
//!   extension state
//! - **Registry**: the central owner of both stores, admission policy, and
//!   the warn/reset orchestration

mod announcer;
mod data;
mod instance_lock;
mod registry;
mod update;

#[cfg(test)]
mod registry_tests;

pub use announcer::{LogAnnouncer, ResetAnnouncer};
pub use data::{LockData, LockPayload};
pub use instance_lock::InstanceLock;
pub use registry::{Lifecycle, LockRegistry};
pub use update::{Admission, LockUpdateEvent};
