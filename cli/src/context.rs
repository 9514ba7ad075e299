use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use wardstone_core::config::{ResetConfig, ResetConfigExt};
use wardstone_core::encounter::{DungeonScript, EncounterTracker};
use wardstone_core::game_data::{LockModel, lookup_map};
use wardstone_core::lock::LockRegistry;
use wardstone_core::save::SaveCodec;
use wardstone_core::storage::MemoryStore;
use wardstone_types::{Difficulty, MapDifficultyKey, MapId};

/// One loaded encounter script plus its live tracker and codec.
pub struct ScriptSession {
    pub script: DungeonScript,
    pub tracker: EncounterTracker,
    pub codec: SaveCodec,
    pub key: MapDifficultyKey,
}

impl ScriptSession {
    pub fn new(script: DungeonScript, difficulty: Difficulty) -> Self {
        let map = MapId(script.script.map);
        let scoped_save = lookup_map(map)
            .map(|entry| entry.lock_model == LockModel::InstanceBound)
            .unwrap_or(false);

        let tracker = EncounterTracker::new(&script, difficulty, scoped_save);
        let codec = SaveCodec::new(script.script.header.clone(), script.bosses.len());

        Self {
            script,
            tracker,
            codec,
            key: MapDifficultyKey::new(map, difficulty),
        }
    }
}

/// Holds all shared state for the CLI shell.
/// This is a lightweight container - logic lives in the core types.
#[derive(Clone)]
pub struct CliContext {
    pub store: Arc<MemoryStore>,
    pub registry: Arc<LockRegistry>,

    /// Simulated clock, advanced by the `tick` command.
    pub clock: Arc<RwLock<DateTime<Utc>>>,

    /// The active encounter script session. None until `script` loads one.
    pub session: Arc<RwLock<Option<ScriptSession>>>,
}

impl CliContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let registry = Arc::new(LockRegistry::new(store.clone(), ResetConfig::load()));

        Self {
            store,
            registry,
            clock: Arc::new(RwLock::new(Utc::now())),
            session: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn now(&self) -> DateTime<Utc> {
        *self.clock.read().await
    }
}

impl Default for CliContext {
    fn default() -> Self {
        Self::new()
    }
}
