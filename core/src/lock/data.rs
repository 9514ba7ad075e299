//! Lock progress payloads

use std::sync::{Arc, Mutex};

use wardstone_types::{EntranceId, InstanceId};

use super::update::LockUpdateEvent;

/// Progress carried by a lock: the serialized save document, the completed
/// encounter bitmask, and the entrance to resume from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LockData {
    pub document: String,
    pub completed_mask: u32,
    pub entrance: EntranceId,
}

impl LockData {
    pub fn new(entrance: EntranceId) -> Self {
        Self { document: String::new(), completed_mask: 0, entrance }
    }

    /// Merge an update: OR the mask, overwrite the document, optionally
    /// overwrite the entrance.
    pub fn merge(&mut self, update: &LockUpdateEvent) {
        self.completed_mask |= update.completed_mask;
        self.document = update.document.clone();
        if let Some(entrance) = update.entrance {
            self.entrance = entrance;
        }
    }
}

/// Ownership flavor of a lock's payload.
///
/// Exclusive data belongs to exactly one lock. Shared data is the canonical
/// record for one concrete instance id, referenced by every participant's
/// lock; the registry reference-counts it and deletes the durable row
/// exactly once, when the last reference is released.
#[derive(Debug, Clone)]
pub enum LockPayload {
    Exclusive(LockData),
    Shared {
        instance: InstanceId,
        data: Arc<Mutex<LockData>>,
    },
}

impl LockPayload {
    /// Snapshot of the current payload data.
    pub fn data(&self) -> LockData {
        match self {
            LockPayload::Exclusive(data) => data.clone(),
            LockPayload::Shared { data, .. } => data.lock().expect("shared lock data poisoned").clone(),
        }
    }

    pub fn completed_mask(&self) -> u32 {
        self.data().completed_mask
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, LockPayload::Shared { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_ors_mask_and_overwrites_document() {
        let mut data = LockData::new(EntranceId(1));
        data.completed_mask = 0b01;
        data.document = "old".into();

        let update = LockUpdateEvent::new(InstanceId(5), "new".into(), 0b10);
        data.merge(&update);
        assert_eq!(data.completed_mask, 0b11);
        assert_eq!(data.document, "new");
        assert_eq!(data.entrance, EntranceId(1));

        let update = LockUpdateEvent::new(InstanceId(5), "newer".into(), 0)
            .with_entrance(EntranceId(4));
        data.merge(&update);
        assert_eq!(data.completed_mask, 0b11);
        assert_eq!(data.entrance, EntranceId(4));
    }

    #[test]
    fn test_shared_payload_snapshot() {
        let shared = Arc::new(Mutex::new(LockData::new(EntranceId(2))));
        let payload = LockPayload::Shared { instance: InstanceId(9), data: shared.clone() };

        shared.lock().unwrap().completed_mask = 0b101;
        assert_eq!(payload.completed_mask(), 0b101);
        assert!(payload.is_shared());
    }
}
