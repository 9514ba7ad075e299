//! Write-behind dispatcher for a slow backing store

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use wardstone_types::{InstanceId, MapId, OwnerId};

use super::error::StoreError;
use super::row::{LockRow, SharedRow, StoreSnapshot};
use super::store::LockStore;

#[derive(Debug)]
enum SpoolOp {
    UpsertLock(LockRow),
    DeleteLock { owner: OwnerId, map: MapId, lock_id: u32 },
    UpsertShared(SharedRow),
    DeleteShared(InstanceId),
}

/// Forwards mutations over an unbounded channel to a background writer
/// task, so registry critical sections never wait on the backing store.
///
/// Loads pass straight through: they only happen at boot, before gameplay
/// traffic exists.
pub struct SpoolStore {
    inner: Arc<dyn LockStore>,
    tx: mpsc::UnboundedSender<SpoolOp>,
}

impl SpoolStore {
    /// Spawn the writer task on the current tokio runtime.
    ///
    /// Dropping the returned store closes the channel; the handle completes
    /// once queued writes have drained.
    pub fn spawn(inner: Arc<dyn LockStore>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<SpoolOp>();
        let writer = Arc::clone(&inner);

        let handle = tokio::spawn(async move {
            while let Some(op) = rx.recv().await {
                match op {
                    SpoolOp::UpsertLock(row) => writer.upsert_lock_row(row),
                    SpoolOp::DeleteLock { owner, map, lock_id } => {
                        writer.delete_lock_row(owner, map, lock_id)
                    }
                    SpoolOp::UpsertShared(row) => writer.upsert_shared_row(row),
                    SpoolOp::DeleteShared(instance) => writer.delete_shared_row(instance),
                }
            }
            tracing::debug!("storage spool drained");
        });

        (Self { inner, tx }, handle)
    }

    fn send(&self, op: SpoolOp) {
        if self.tx.send(op).is_err() {
            tracing::warn!("storage spool writer gone, dropping write");
        }
    }
}

impl LockStore for SpoolStore {
    fn load_all_locks(&self) -> Result<StoreSnapshot, StoreError> {
        self.inner.load_all_locks()
    }

    fn upsert_lock_row(&self, row: LockRow) {
        self.send(SpoolOp::UpsertLock(row));
    }

    fn delete_lock_row(&self, owner: OwnerId, map: MapId, lock_id: u32) {
        self.send(SpoolOp::DeleteLock { owner, map, lock_id });
    }

    fn upsert_shared_row(&self, row: SharedRow) {
        self.send(SpoolOp::UpsertShared(row));
    }

    fn delete_shared_row(&self, instance: InstanceId) {
        self.send(SpoolOp::DeleteShared(instance));
    }
}
