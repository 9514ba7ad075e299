//! Encounter script definition types
//!
//! Definitions are loaded from TOML config files and describe a map's boss
//! encounters: completed-mask bits, bound doors and minions, spatial
//! boundaries, and per-difficulty entries.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use wardstone_types::{BossId, CreatureId, Difficulty, DoorId, EntranceId};

use super::state::DoorKind;

// ═══════════════════════════════════════════════════════════════════════════
// Root Config Structure
// ═══════════════════════════════════════════════════════════════════════════

/// Script header for an encounter config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScriptConfig {
    /// Identity string of the script, written into every save document's
    /// header and validated on load.
    pub header: String,

    /// Map this script drives.
    #[serde(default)]
    pub map: u32,

    /// Entrance used when no encounter-derived entrance applies.
    #[serde(default)]
    pub default_entrance: EntranceId,
}

/// Root structure for encounter config files (TOML).
///
/// ```toml
/// [script]
/// header = "instance_blackrock_depths"
/// map = 230
///
/// [[boss]]
/// id = 0
/// name = "High Interrogator"
/// bit = 0
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DungeonScript {
    pub script: ScriptConfig,

    /// Boss encounter definitions, ordered by boss id.
    #[serde(default, rename = "boss")]
    pub bosses: Vec<BossDefinition>,
}

// ═══════════════════════════════════════════════════════════════════════════
// Boss Definition
// ═══════════════════════════════════════════════════════════════════════════

/// A door game object bound to an encounter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DoorBinding {
    pub door: DoorId,
    pub kind: DoorKind,
}

/// A creature spawned and owned by an encounter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MinionBinding {
    pub creature: CreatureId,

    /// World-boss-tagged minions must be dead before the encounter may
    /// enter `Done`.
    #[serde(default)]
    pub world_boss: bool,
}

/// Spatial boundary of an encounter's arena.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "shape")]
pub enum EncounterBoundary {
    Circle { center: [f32; 2], radius: f32 },
    Rect { min: [f32; 2], max: [f32; 2] },
}

impl EncounterBoundary {
    pub fn contains(&self, point: [f32; 2]) -> bool {
        match self {
            EncounterBoundary::Circle { center, radius } => {
                let dx = point[0] - center[0];
                let dy = point[1] - center[1];
                dx * dx + dy * dy <= radius * radius
            }
            EncounterBoundary::Rect { min, max } => {
                point[0] >= min[0] && point[0] <= max[0] && point[1] >= min[1] && point[1] <= max[1]
            }
        }
    }
}

/// Per-difficulty entry for an encounter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncounterEntry {
    pub difficulty: Difficulty,

    /// Display name for this difficulty's version of the fight.
    #[serde(default)]
    pub name: String,

    /// Entrance players resume from once this encounter is completed.
    #[serde(default)]
    pub entrance: Option<EntranceId>,
}

/// Definition of one boss encounter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BossDefinition {
    /// Index into the script's encounter list (and the save document's
    /// boss-state array).
    pub id: BossId,

    /// Display name
    #[serde(default)]
    pub name: String,

    /// Completed-bitmask bit set when this encounter reaches `Done`.
    /// Encounters without a bit never contribute to the mask.
    #[serde(default)]
    pub bit: Option<u8>,

    /// Doors recomputed on every transition of this encounter.
    #[serde(default, alias = "door")]
    pub doors: Vec<DoorBinding>,

    /// Minions owned by this encounter.
    #[serde(default, alias = "minion")]
    pub minions: Vec<MinionBinding>,

    /// Arena boundary (informational for the world sim; carried here so a
    /// script file fully describes the fight).
    #[serde(default)]
    pub boundary: Option<EncounterBoundary>,

    /// Per-difficulty entries (empty = applies to all difficulties).
    #[serde(default, alias = "entry")]
    pub entries: Vec<EncounterEntry>,
}

impl BossDefinition {
    /// Entry for a specific difficulty, if one is declared.
    pub fn entry_for(&self, difficulty: Difficulty) -> Option<&EncounterEntry> {
        self.entries.iter().find(|e| e.difficulty == difficulty)
    }

    /// Whether this encounter exists on the given difficulty.
    pub fn applies_to(&self, difficulty: Difficulty) -> bool {
        self.entries.is_empty() || self.entry_for(difficulty).is_some()
    }

    /// Entrance declared for the given difficulty.
    pub fn entrance_for(&self, difficulty: Difficulty) -> Option<EntranceId> {
        self.entry_for(difficulty).and_then(|e| e.entrance)
    }

    /// Whether the given creature is one of this encounter's
    /// world-boss-tagged minions.
    pub fn is_world_boss_minion(&self, creature: CreatureId) -> bool {
        self.minions.iter().any(|m| m.world_boss && m.creature == creature)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Loading
// ═══════════════════════════════════════════════════════════════════════════

/// Load an encounter script from a TOML file.
pub fn load_script_from_file(path: &Path) -> Result<DungeonScript, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    load_script_from_str(&content).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
}

/// Parse an encounter script from TOML text.
pub fn load_script_from_str(content: &str) -> Result<DungeonScript, String> {
    let script: DungeonScript = toml::from_str(content).map_err(|e| e.to_string())?;

    if script.script.header.is_empty() {
        return Err("script header must not be empty".to_string());
    }

    // Boss ids must be dense: they index the save document positionally.
    for (idx, boss) in script.bosses.iter().enumerate() {
        if boss.id.0 as usize != idx {
            return Err(format!(
                "boss id {} at position {} (ids must be dense and in order)",
                boss.id.0, idx
            ));
        }
    }

    Ok(script)
}
