//! Lock update events and admission decisions

use wardstone_types::{EntranceId, InstanceId};

/// The write event the registry merges into a lock.
///
/// Built from an encounter's boss-state-update signal plus the codec's
/// re-serialized document.
#[derive(Debug, Clone, PartialEq)]
pub struct LockUpdateEvent {
    /// Concrete instance the progress happened in; `UNBOUND` for maps that
    /// never bind locks to an instance id.
    pub instance: InstanceId,

    /// Full serialized save document (overwrites the stored one).
    pub document: String,

    /// Bits OR'd into the lock's completed mask.
    pub completed_mask: u32,

    /// New entrance, when the completed encounter declares one.
    pub entrance: Option<EntranceId>,
}

impl LockUpdateEvent {
    pub fn new(instance: InstanceId, document: String, completed_mask: u32) -> Self {
        Self { instance, document, completed_mask, entrance: None }
    }

    pub fn with_entrance(mut self, entrance: EntranceId) -> Self {
        self.entrance = Some(entrance);
        self
    }
}

/// Outcome of an admission check against a candidate instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,

    /// Flex maps: the player has completed encounters the candidate copy
    /// has not; entering would let them skip required fights.
    MissingProgress,

    /// Per-encounter maps: the player is already bound to a different
    /// concrete instance.
    BoundElsewhere,
}

impl Admission {
    pub fn is_allowed(self) -> bool {
        self == Admission::Allowed
    }
}
