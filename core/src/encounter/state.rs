//! Encounter states and the door-open policy

use serde::{Deserialize, Serialize};

/// Discrete state of one boss encounter.
///
/// `ToBeDecided` exists only between tracker construction and the first
/// initialization write; it is never persisted. `Done` is terminal: no
/// transition may leave it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum EncounterState {
    #[default]
    NotStarted = 0,
    InProgress = 1,
    Fail = 2,
    Done = 3,
    Special = 4,
    ToBeDecided = 5,
}

impl EncounterState {
    /// States that must not survive a save/load cycle: an instance never
    /// resumes mid-combat.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            EncounterState::InProgress | EncounterState::Fail | EncounterState::Special
        )
    }

    /// Numeric form written into save documents.
    pub fn to_save(self) -> u8 {
        self as u8
    }

    /// Decode a persisted state value.
    ///
    /// Transient states clamp down to `NotStarted`, as do values written by
    /// an unknown future revision. Only `NotStarted` and `Done` survive.
    pub fn from_save(value: u64) -> EncounterState {
        match value {
            3 => EncounterState::Done,
            _ => EncounterState::NotStarted,
        }
    }
}

impl std::fmt::Display for EncounterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EncounterState::NotStarted => "not_started",
            EncounterState::InProgress => "in_progress",
            EncounterState::Fail => "fail",
            EncounterState::Done => "done",
            EncounterState::Special => "special",
            EncounterState::ToBeDecided => "to_be_decided",
        };
        f.write_str(s)
    }
}

/// How a door reacts to the state of its bound encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorKind {
    /// Entrance to the boss room: open unless the fight is running.
    Room,
    /// Passage onward: opens once the encounter is done.
    Passage,
    /// Spawn hole for adds: open only while the fight is running.
    SpawnHole,
}

/// The door open/closed policy, recomputed on every encounter transition.
pub fn door_open(kind: DoorKind, state: EncounterState) -> bool {
    match kind {
        DoorKind::Room => state != EncounterState::InProgress,
        DoorKind::Passage => state == EncounterState::Done,
        DoorKind::SpawnHole => state == EncounterState::InProgress,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_round_trip_clamps() {
        assert_eq!(EncounterState::from_save(EncounterState::Done.to_save() as u64), EncounterState::Done);
        for transient in [EncounterState::InProgress, EncounterState::Fail, EncounterState::Special] {
            assert_eq!(EncounterState::from_save(transient.to_save() as u64), EncounterState::NotStarted);
        }
        // Unknown future value
        assert_eq!(EncounterState::from_save(17), EncounterState::NotStarted);
    }

    #[test]
    fn test_door_policy() {
        assert!(door_open(DoorKind::Room, EncounterState::NotStarted));
        assert!(!door_open(DoorKind::Room, EncounterState::InProgress));
        assert!(door_open(DoorKind::Room, EncounterState::Done));

        assert!(!door_open(DoorKind::Passage, EncounterState::NotStarted));
        assert!(!door_open(DoorKind::Passage, EncounterState::InProgress));
        assert!(door_open(DoorKind::Passage, EncounterState::Done));

        assert!(!door_open(DoorKind::SpawnHole, EncounterState::NotStarted));
        assert!(door_open(DoorKind::SpawnHole, EncounterState::InProgress));
        assert!(!door_open(DoorKind::SpawnHole, EncounterState::Done));
    }
}
