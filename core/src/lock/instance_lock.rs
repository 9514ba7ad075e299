//! The per-owner instance lock

use chrono::{DateTime, Utc};
use wardstone_types::{Difficulty, InstanceId, MapDifficultyKey, MapId};

use super::data::{LockData, LockPayload};

/// A time-bounded binding of one owner to one (map, difficulty), usually to
/// a concrete instance copy.
///
/// Lives in the registry's temporary store between first transfer and first
/// encounter progress, then in the permanent store until expiry or explicit
/// unbind. The registry hands out clones; shared payloads stay connected
/// through their inner `Arc`.
#[derive(Debug, Clone)]
pub struct InstanceLock {
    pub map: MapId,
    pub difficulty: Difficulty,
    pub instance: InstanceId,
    pub expiry: DateTime<Utc>,
    pub extended: bool,

    /// Owner is currently inside the bound instance.
    pub in_use: bool,

    pub payload: LockPayload,
}

impl InstanceLock {
    pub fn new(
        map: MapId,
        difficulty: Difficulty,
        instance: InstanceId,
        expiry: DateTime<Utc>,
        payload: LockPayload,
    ) -> Self {
        Self { map, difficulty, instance, expiry, extended: false, in_use: false, payload }
    }

    pub fn key(&self) -> MapDifficultyKey {
        MapDifficultyKey::new(self.map, self.difficulty)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry <= now
    }

    /// Expired locks kept alive by the extension flag still count as
    /// active.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.is_expired(now) || self.extended
    }

    /// Snapshot of the payload data.
    pub fn data(&self) -> LockData {
        self.payload.data()
    }

    pub fn completed_mask(&self) -> u32 {
        self.payload.completed_mask()
    }
}
