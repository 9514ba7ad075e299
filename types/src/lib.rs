//! Shared identifier and key types for Wardstone
//!
//! This crate contains the small serializable types that are shared between
//! the lock/reset engine (wardstone-core) and its frontends. Everything here
//! is plain data: ids are opaque newtypes, keys are the hashable composites
//! the registry indexes by.

use serde::{Deserialize, Serialize};

pub mod formatting;

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// Identifier of a shareable map (dungeon or raid template).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MapId(pub u32);

/// Identifier of one concrete, separately-simulated copy of a map.
///
/// Zero is reserved: a lock with instance id 0 is not yet bound to a
/// concrete copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(pub u32);

impl InstanceId {
    pub const UNBOUND: InstanceId = InstanceId(0);

    /// Whether this id refers to a concrete instance copy.
    pub fn is_bound(self) -> bool {
        self.0 != 0
    }
}

/// Identifier of the owner of a lock: a player or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

/// Identifier of a boss encounter within a map's encounter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BossId(pub u32);

/// Identifier of a door game object bound to an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DoorId(pub u64);

/// Identifier of a creature spawned by an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CreatureId(pub u64);

/// Identifier of a map entrance location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntranceId(pub u32);

// ─────────────────────────────────────────────────────────────────────────────
// Difficulty
// ─────────────────────────────────────────────────────────────────────────────

/// Difficulty tier of an instanced map.
///
/// Lock rows, reset schedules, and encounter definitions are all keyed per
/// difficulty; two difficulties of the same map never share progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Normal,
    Heroic,
    Mythic,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Normal, Difficulty::Heroic, Difficulty::Mythic];

    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Normal => "normal",
            Difficulty::Heroic => "heroic",
            Difficulty::Mythic => "mythic",
        }
    }

    /// Parse from the lowercase name used in config files and the CLI.
    pub fn parse(s: &str) -> Option<Difficulty> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Some(Difficulty::Normal),
            "heroic" => Some(Difficulty::Heroic),
            "mythic" => Some(Difficulty::Mythic),
            _ => None,
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Composite keys
// ─────────────────────────────────────────────────────────────────────────────

/// The (map, difficulty) pair everything in the lock subsystem is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapDifficultyKey {
    pub map: MapId,
    pub difficulty: Difficulty,
}

impl MapDifficultyKey {
    pub fn new(map: MapId, difficulty: Difficulty) -> Self {
        Self { map, difficulty }
    }
}

impl std::fmt::Display for MapDifficultyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.map.0, self.difficulty)
    }
}

/// Full key of one owner's lock: owner plus (map, difficulty).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockKey {
    pub owner: OwnerId,
    pub map_difficulty: MapDifficultyKey,
}

impl LockKey {
    pub fn new(owner: OwnerId, map_difficulty: MapDifficultyKey) -> Self {
        Self { owner, map_difficulty }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_id_bound() {
        assert!(!InstanceId::UNBOUND.is_bound());
        assert!(InstanceId(7).is_bound());
    }

    #[test]
    fn test_difficulty_parse_roundtrip() {
        for d in Difficulty::ALL {
            assert_eq!(Difficulty::parse(d.as_str()), Some(d));
        }
        assert_eq!(Difficulty::parse("HEROIC"), Some(Difficulty::Heroic));
        assert_eq!(Difficulty::parse("epic"), None);
    }

    #[test]
    fn test_key_display() {
        let key = MapDifficultyKey::new(MapId(603), Difficulty::Heroic);
        assert_eq!(key.to_string(), "603/heroic");
    }
}
