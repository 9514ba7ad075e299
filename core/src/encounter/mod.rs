//! Boss encounter state machine
//!
//! This module provides:
//! - **Definitions**: per-map encounter scripts (loaded from TOML) listing
//!   bosses, their doors, minions, and per-difficulty entries
//! - **Tracker**: per-instance runtime state with the transition rules
//! - **Signals**: typed events emitted by transitions, consumed by the lock
//!   registry for persistence and by door/notification plumbing

mod definition;
mod machine;
mod signal;
mod state;

pub use definition::{
    BossDefinition, DoorBinding, DungeonScript, EncounterBoundary, EncounterEntry, MinionBinding,
    ScriptConfig, load_script_from_file, load_script_from_str,
};
pub use machine::{EncounterTracker, RejectReason, Transition};
pub use signal::{BossStateUpdate, EncounterSignal};
pub use state::{DoorKind, EncounterState, door_open};
