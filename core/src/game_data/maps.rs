//! Static map table
//!
//! Maps lockable map ids to their lock model, reset cadence, and entrance
//! data. This is template data the rest of the subsystem treats as ground
//! truth; maps absent from the table have no reset schedule and are never
//! locked.

use phf::phf_map;
use wardstone_types::{Difficulty, EntranceId, MapId};

use crate::reset::ResetCadence;

/// How a map's lock payload and admission behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockModel {
    /// One canonical save per concrete instance id, shared by every
    /// participant; admission is unrestricted beyond holding the lock.
    InstanceBound,
    /// Independent per-encounter locks; a player already bound to a
    /// different concrete instance may not enter another copy.
    PerEncounter,
    /// Per-encounter locks with flex admission: any copy whose completed
    /// encounters are a superset of the player's own.
    Flex,
}

/// Template data for one lockable map.
pub struct MapEntry {
    pub name: &'static str,

    /// Identifier of the lock family, used as part of the durable row key.
    pub lock_id: u32,

    pub lock_model: LockModel,

    pub default_entrance: EntranceId,

    /// Reset cadence per difficulty (indexed by `Difficulty`); `None` means
    /// the difficulty does not exist for this map.
    pub cadences: [Option<ResetCadence>; 3],
}

impl MapEntry {
    pub fn cadence(&self, difficulty: Difficulty) -> Option<ResetCadence> {
        self.cadences[difficulty as usize]
    }

    /// Whether this map has a reset schedule (and thus locks) on the given
    /// difficulty.
    pub fn has_reset_schedule(&self, difficulty: Difficulty) -> bool {
        self.cadence(difficulty).is_some()
    }
}

const WEEK_SECS: i64 = 7 * 86_400;
const THREE_DAYS_SECS: i64 = 3 * 86_400;

/// Map template table indexed by map id
pub static MAP_TABLE: phf::Map<u32, MapEntry> = phf_map! {
    // Five-player dungeons: daily normal/heroic, weekly mythic.
    90u32 => MapEntry {
        name: "Gloomvault",
        lock_id: 1,
        lock_model: LockModel::Flex,
        default_entrance: EntranceId(1),
        cadences: [
            Some(ResetCadence::Daily),
            Some(ResetCadence::Daily),
            Some(ResetCadence::Weekly),
        ],
    },
    104u32 => MapEntry {
        name: "The Sunken Bastion",
        lock_id: 2,
        lock_model: LockModel::Flex,
        default_entrance: EntranceId(1),
        cadences: [
            Some(ResetCadence::Daily),
            Some(ResetCadence::Daily),
            Some(ResetCadence::Weekly),
        ],
    },

    // Raids: shared state per concrete instance, weekly cadence.
    230u32 => MapEntry {
        name: "Emberspire Citadel",
        lock_id: 10,
        lock_model: LockModel::InstanceBound,
        default_entrance: EntranceId(1),
        cadences: [
            Some(ResetCadence::Weekly),
            Some(ResetCadence::Weekly),
            Some(ResetCadence::Weekly),
        ],
    },
    249u32 => MapEntry {
        name: "Halls of the Moon King",
        lock_id: 11,
        lock_model: LockModel::InstanceBound,
        default_entrance: EntranceId(2),
        cadences: [
            Some(ResetCadence::Periodic { raw_duration_secs: WEEK_SECS }),
            Some(ResetCadence::Periodic { raw_duration_secs: WEEK_SECS }),
            None,
        ],
    },

    // Legacy raid on a three-day period, per-encounter locks.
    309u32 => MapEntry {
        name: "Temple of the Verdant Coil",
        lock_id: 12,
        lock_model: LockModel::PerEncounter,
        default_entrance: EntranceId(1),
        cadences: [
            Some(ResetCadence::Periodic { raw_duration_secs: THREE_DAYS_SECS }),
            None,
            None,
        ],
    },

    // Open sanctum: no reset schedule on any difficulty, never locked.
    400u32 => MapEntry {
        name: "Sanctum of Echoes",
        lock_id: 0,
        lock_model: LockModel::PerEncounter,
        default_entrance: EntranceId(1),
        cadences: [None, None, None],
    },
};

/// Look up a map's template entry.
pub fn lookup_map(map: MapId) -> Option<&'static MapEntry> {
    MAP_TABLE.get(&map.0)
}

/// Reset cadence for a (map, difficulty), if it has one.
pub fn map_cadence(map: MapId, difficulty: Difficulty) -> Option<ResetCadence> {
    lookup_map(map).and_then(|entry| entry.cadence(difficulty))
}

/// All map ids in the table, for schedule bootstrap.
pub fn all_map_ids() -> impl Iterator<Item = MapId> {
    MAP_TABLE.keys().map(|id| MapId(*id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let entry = lookup_map(MapId(230)).expect("raid present");
        assert_eq!(entry.name, "Emberspire Citadel");
        assert_eq!(entry.lock_model, LockModel::InstanceBound);
        assert!(entry.has_reset_schedule(Difficulty::Mythic));
    }

    #[test]
    fn test_unlisted_map_has_no_schedule() {
        assert!(lookup_map(MapId(9999)).is_none());
        assert_eq!(map_cadence(MapId(9999), Difficulty::Normal), None);
    }

    #[test]
    fn test_difficulty_gaps() {
        assert!(map_cadence(MapId(249), Difficulty::Mythic).is_none());
        assert!(map_cadence(MapId(249), Difficulty::Heroic).is_some());
        assert!(!lookup_map(MapId(400)).unwrap().has_reset_schedule(Difficulty::Normal));
    }
}
