//! Row shapes exchanged with the durable store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wardstone_types::{Difficulty, EntranceId, InstanceId, MapId, OwnerId};

/// One owner's lock row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRow {
    pub owner: OwnerId,
    pub map: MapId,
    pub lock_id: u32,
    pub instance: InstanceId,
    pub difficulty: Difficulty,
    pub document: String,
    pub completed_mask: u32,
    pub entrance: EntranceId,
    pub expiry: DateTime<Utc>,
    pub extended: bool,
}

/// The canonical progress row shared by every lock bound to one concrete
/// instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedRow {
    pub instance: InstanceId,
    pub document: String,
    pub completed_mask: u32,
    pub entrance: EntranceId,
}

/// Everything `load_all_locks` returns.
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    pub locks: Vec<LockRow>,
    pub shared: Vec<SharedRow>,
}
