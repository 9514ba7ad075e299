//! Signals emitted by encounter transitions
//!
//! A transition returns its signals to the caller instead of invoking
//! callbacks; the driving code (lock registry, door plumbing, client
//! notification layer) routes them.

use std::time::Duration;

use wardstone_types::{BossId, DoorId};

use super::state::EncounterState;

/// Payload the lock registry merges into the persisted save document when a
/// boss reaches `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BossStateUpdate {
    pub boss: BossId,
    pub state: EncounterState,
    /// Completed-mask bit of this encounter, if it has one.
    pub bit: Option<u8>,
    /// Mask after the transition.
    pub completed_mask: u32,
}

/// Typed event raised by one encounter transition.
#[derive(Debug, Clone, PartialEq)]
pub enum EncounterSignal {
    /// Fight started (entered `InProgress`).
    EncounterStarted { boss: BossId },

    /// Fight over, one way or the other (entered `Done` or `Fail`).
    EncounterEnded { boss: BossId, state: EncounterState },

    /// Combat-resurrection charge accrual begins at this interval.
    CombatResChargesStarted { interval: Duration },

    /// Combat-resurrection charge accrual stops.
    CombatResChargesStopped,

    /// Door open/closed state after the transition.
    DoorUpdate { door: DoorId, open: bool },

    /// Persistable state change, consumed by the lock registry.
    BossUpdate(BossStateUpdate),
}
