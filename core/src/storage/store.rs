//! Storage trait and the in-memory implementation

use std::sync::Mutex;

use hashbrown::HashMap;
use wardstone_types::{InstanceId, MapId, OwnerId};

use super::error::StoreError;
use super::row::{LockRow, SharedRow, StoreSnapshot};

/// Contract the registry persists through.
///
/// Mutations are synchronous calls whose I/O latency is the implementor's
/// problem; the registry never awaits them. Only the boot-time load is
/// fallible from the caller's perspective.
pub trait LockStore: Send + Sync {
    fn load_all_locks(&self) -> Result<StoreSnapshot, StoreError>;

    fn upsert_lock_row(&self, row: LockRow);

    fn delete_lock_row(&self, owner: OwnerId, map: MapId, lock_id: u32);

    fn upsert_shared_row(&self, row: SharedRow);

    fn delete_shared_row(&self, instance: InstanceId);
}

/// Journal entry recorded by [`MemoryStore`] for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    UpsertLock { owner: OwnerId, map: MapId, lock_id: u32 },
    DeleteLock { owner: OwnerId, map: MapId, lock_id: u32 },
    UpsertShared { instance: InstanceId },
    DeleteShared { instance: InstanceId },
}

#[derive(Debug, Default)]
struct MemoryInner {
    locks: HashMap<(OwnerId, MapId, u32), LockRow>,
    shared: HashMap<InstanceId, SharedRow>,
    ops: Vec<StoreOp>,
}

/// In-memory store: applies every mutation synchronously and journals it.
///
/// Backs the CLI shell and the test suites; not a storage engine.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed rows, as if a previous run had written them.
    pub fn seed(&self, snapshot: StoreSnapshot) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        for row in snapshot.locks {
            inner.locks.insert((row.owner, row.map, row.lock_id), row);
        }
        for row in snapshot.shared {
            inner.shared.insert(row.instance, row);
        }
    }

    pub fn lock_rows(&self) -> Vec<LockRow> {
        let inner = self.inner.lock().expect("memory store poisoned");
        inner.locks.values().cloned().collect()
    }

    pub fn shared_rows(&self) -> Vec<SharedRow> {
        let inner = self.inner.lock().expect("memory store poisoned");
        inner.shared.values().cloned().collect()
    }

    /// Journal of every mutation, in call order.
    pub fn ops(&self) -> Vec<StoreOp> {
        let inner = self.inner.lock().expect("memory store poisoned");
        inner.ops.clone()
    }

    pub fn shared_delete_count(&self, instance: InstanceId) -> usize {
        self.ops()
            .iter()
            .filter(|op| matches!(op, StoreOp::DeleteShared { instance: i } if *i == instance))
            .count()
    }
}

impl LockStore for MemoryStore {
    fn load_all_locks(&self) -> Result<StoreSnapshot, StoreError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(StoreSnapshot {
            locks: inner.locks.values().cloned().collect(),
            shared: inner.shared.values().cloned().collect(),
        })
    }

    fn upsert_lock_row(&self, row: LockRow) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.ops.push(StoreOp::UpsertLock {
            owner: row.owner,
            map: row.map,
            lock_id: row.lock_id,
        });
        inner.locks.insert((row.owner, row.map, row.lock_id), row);
    }

    fn delete_lock_row(&self, owner: OwnerId, map: MapId, lock_id: u32) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.ops.push(StoreOp::DeleteLock { owner, map, lock_id });
        inner.locks.remove(&(owner, map, lock_id));
    }

    fn upsert_shared_row(&self, row: SharedRow) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.ops.push(StoreOp::UpsertShared { instance: row.instance });
        inner.shared.insert(row.instance, row);
    }

    fn delete_shared_row(&self, instance: InstanceId) {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.ops.push(StoreOp::DeleteShared { instance });
        inner.shared.remove(&instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wardstone_types::{Difficulty, EntranceId};

    fn row(owner: u64, map: u32) -> LockRow {
        LockRow {
            owner: OwnerId(owner),
            map: MapId(map),
            lock_id: 1,
            instance: InstanceId(5),
            difficulty: Difficulty::Normal,
            document: String::new(),
            completed_mask: 0,
            entrance: EntranceId(1),
            expiry: chrono::Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            extended: false,
        }
    }

    #[test]
    fn test_upsert_overwrites() {
        let store = MemoryStore::new();
        store.upsert_lock_row(row(1, 90));
        let mut updated = row(1, 90);
        updated.completed_mask = 0b11;
        store.upsert_lock_row(updated);

        let rows = store.lock_rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].completed_mask, 0b11);
        assert_eq!(store.ops().len(), 2);
    }

    #[test]
    fn test_delete_journaled() {
        let store = MemoryStore::new();
        store.upsert_shared_row(SharedRow {
            instance: InstanceId(5),
            document: String::new(),
            completed_mask: 0,
            entrance: EntranceId(1),
        });
        store.delete_shared_row(InstanceId(5));
        assert!(store.shared_rows().is_empty());
        assert_eq!(store.shared_delete_count(InstanceId(5)), 1);
    }
}
