//! Tests for LockRegistry promotion, sharing, extension, and resets
//!
//! Map fixtures come from the static table: 90 = flex dungeon (daily
//! normal), 230 = instance-bound raid (weekly), 309 = per-encounter legacy
//! raid, 400 = no reset schedule.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use wardstone_types::{Difficulty, EntranceId, InstanceId, MapDifficultyKey, MapId, OwnerId};

use super::{Admission, InstanceLock, Lifecycle, LockRegistry, LockUpdateEvent, ResetAnnouncer};
use crate::config::ResetConfig;
use crate::storage::{LockRow, MemoryStore, SharedRow, StoreOp, StoreSnapshot};

/// Wednesday 2023-11-15 12:00 UTC. With default config (weekly day 2 =
/// Tuesday, hour 9) the next weekly reset is Nov 21 09:00; the next daily
/// reset is Nov 16 09:00.
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 11, 15, 12, 0, 0).unwrap()
}

fn flex_key() -> MapDifficultyKey {
    MapDifficultyKey::new(MapId(90), Difficulty::Normal)
}

fn raid_key() -> MapDifficultyKey {
    MapDifficultyKey::new(MapId(230), Difficulty::Normal)
}

fn legacy_key() -> MapDifficultyKey {
    MapDifficultyKey::new(MapId(309), Difficulty::Normal)
}

fn registry() -> (Arc<MemoryStore>, LockRegistry) {
    let store = Arc::new(MemoryStore::new());
    let registry = LockRegistry::new(store.clone(), ResetConfig::default());
    (store, registry)
}

fn update(instance: u32, mask: u32) -> LockUpdateEvent {
    LockUpdateEvent::new(InstanceId(instance), format!("{{\"mask\":{mask}}}"), mask)
}

#[derive(Default)]
struct RecordingAnnouncer {
    events: Mutex<Vec<String>>,
}

impl RecordingAnnouncer {
    fn take(&self) -> Vec<String> {
        let mut events = self.events.lock().unwrap();
        std::mem::take(&mut *events)
    }
}

impl ResetAnnouncer for RecordingAnnouncer {
    fn warn_time_left(&self, key: MapDifficultyKey, remaining: Duration) {
        self.events
            .lock()
            .unwrap()
            .push(format!("warn {key} {}", remaining.num_seconds()));
    }

    fn instance_expired(&self, key: MapDifficultyKey, instance: InstanceId) {
        self.events.lock().unwrap().push(format!("expired {key} {}", instance.0));
    }

    fn global_reset(&self, key: MapDifficultyKey) {
        self.events.lock().unwrap().push(format!("reset {key}"));
    }
}

// ─── Lookup & promotion ──────────────────────────────────────────────────────

#[test]
fn test_temporary_lock_promotion() {
    let (_store, registry) = registry();
    let owner = OwnerId(1);

    registry
        .create_temporary_lock(owner, flex_key(), InstanceId(5), now())
        .expect("temporary lock");

    // Visible through the temporary store only.
    assert!(registry.find_active_lock(owner, flex_key(), false, true, now()).is_some());
    assert!(registry.find_active_lock(owner, flex_key(), true, true, now()).is_none());

    let lock = registry
        .promote_or_update(owner, flex_key(), update(5, 0b1), now())
        .expect("promoted");
    assert_eq!(lock.instance, InstanceId(5));

    // Temporary entry is gone; the permanent one answers.
    let found = registry
        .find_active_lock(owner, flex_key(), true, true, now())
        .expect("permanent lock");
    assert_eq!(found.instance, InstanceId(5));
    assert_eq!(found.completed_mask(), 0b1);
}

#[test]
fn test_one_permanent_lock_per_key() {
    let (_store, registry) = registry();
    let owner = OwnerId(1);

    registry.create_temporary_lock(owner, flex_key(), InstanceId(5), now());
    registry.promote_or_update(owner, flex_key(), update(5, 0b1), now());
    registry.promote_or_update(owner, flex_key(), update(5, 0b10), now());
    registry.promote_or_update(owner, flex_key(), update(5, 0b100), now());

    let locks = registry.snapshot();
    assert_eq!(locks.len(), 1);
    let (_, lock, temporary) = &locks[0];
    assert!(!temporary);
    // Mask merges are OR'd across updates.
    assert_eq!(lock.completed_mask(), 0b111);
}

#[test]
fn test_temporary_requires_reset_schedule() {
    let (_store, registry) = registry();
    let no_schedule = MapDifficultyKey::new(MapId(400), Difficulty::Normal);
    assert!(registry.create_temporary_lock(OwnerId(1), no_schedule, InstanceId(1), now()).is_none());

    let unknown = MapDifficultyKey::new(MapId(9999), Difficulty::Normal);
    assert!(registry.create_temporary_lock(OwnerId(1), unknown, InstanceId(1), now()).is_none());
}

#[test]
fn test_temporary_expiry_is_next_reset() {
    let (_store, registry) = registry();
    let lock = registry
        .create_temporary_lock(OwnerId(1), flex_key(), InstanceId(5), now())
        .unwrap();
    assert_eq!(lock.expiry, Utc.with_ymd_and_hms(2023, 11, 16, 9, 0, 0).unwrap());
}

#[test]
fn test_find_expired_lock_honors_flag() {
    let (_store, registry) = registry();
    let owner = OwnerId(1);
    registry.promote_or_update(owner, flex_key(), update(5, 0b1), now());

    let after_reset = Utc.with_ymd_and_hms(2023, 11, 16, 10, 0, 0).unwrap();
    assert!(registry.find_active_lock(owner, flex_key(), true, true, after_reset).is_none());
    assert!(registry.find_active_lock(owner, flex_key(), true, false, after_reset).is_some());
}

#[test]
fn test_update_binds_instance_id() {
    let (_store, registry) = registry();
    let owner = OwnerId(1);

    registry.promote_or_update(owner, flex_key(), update(0, 0b1), now());
    let lock = registry
        .promote_or_update(owner, flex_key(), update(7, 0b10), now())
        .unwrap();
    assert_eq!(lock.instance, InstanceId(7));
}

// ─── Shared lock data ────────────────────────────────────────────────────────

#[test]
fn test_shared_data_reference_counting() {
    let (store, registry) = registry();
    let instance = InstanceId(7);

    registry.promote_or_update(OwnerId(1), raid_key(), update(7, 0b1), now());
    registry.promote_or_update(OwnerId(2), raid_key(), update(7, 0b10), now());
    assert_eq!(registry.shared_ref_count(instance), 2);

    // Both locks observe the canonical merged mask.
    let first = registry.find_active_lock(OwnerId(1), raid_key(), true, true, now()).unwrap();
    let second = registry.find_active_lock(OwnerId(2), raid_key(), true, true, now()).unwrap();
    assert_eq!(first.completed_mask(), 0b11);
    assert_eq!(second.completed_mask(), 0b11);

    // First release: the row persists.
    assert!(registry.unbind(OwnerId(1), raid_key()));
    assert_eq!(registry.shared_ref_count(instance), 1);
    assert_eq!(store.shared_delete_count(instance), 0);
    assert_eq!(store.shared_rows().len(), 1);

    // Last release: exactly one durable delete.
    assert!(registry.unbind(OwnerId(2), raid_key()));
    assert_eq!(registry.shared_ref_count(instance), 0);
    assert_eq!(store.shared_delete_count(instance), 1);
    assert!(store.shared_rows().is_empty());
}

#[test]
fn test_shared_row_upserted_with_lock() {
    let (store, registry) = registry();
    registry.promote_or_update(OwnerId(1), raid_key(), update(7, 0b1), now());

    let shared = store.shared_rows();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].instance, InstanceId(7));
    assert_eq!(shared[0].completed_mask, 0b1);
}

#[test]
fn test_unload_fires_no_deletes() {
    let (store, registry) = registry();
    registry.promote_or_update(OwnerId(1), raid_key(), update(7, 0b1), now());
    registry.promote_or_update(OwnerId(2), raid_key(), update(7, 0b10), now());

    let deletes_before = store.shared_delete_count(InstanceId(7));
    registry.unload();
    assert_eq!(registry.lifecycle(), Lifecycle::Unloading);
    assert_eq!(store.shared_delete_count(InstanceId(7)), deletes_before);
    assert_eq!(store.shared_rows().len(), 1);
}

// ─── Extension ───────────────────────────────────────────────────────────────

#[test]
fn test_extend_unexpired_adds_one_period() {
    let (_store, registry) = registry();
    let owner = OwnerId(1);
    let lock = registry.promote_or_update(owner, flex_key(), update(5, 0b1), now()).unwrap();
    let raw_expiry = lock.expiry;

    let (old_eff, new_eff) = registry.set_extended(owner, flex_key(), true, now()).unwrap();
    assert_eq!(old_eff, raw_expiry);
    // Daily cadence: exactly one day on top of the raw expiry.
    assert_eq!(new_eff, raw_expiry + Duration::days(1));
}

#[test]
fn test_extend_expired_rolls_to_next_reset() {
    let (_store, registry) = registry();
    let owner = OwnerId(1);
    registry.promote_or_update(owner, flex_key(), update(5, 0b1), now());
    registry.set_extended(owner, flex_key(), true, now());

    // Past the raw expiry (Nov 16 09:00) but alive through the extension.
    let later = Utc.with_ymd_and_hms(2023, 11, 16, 10, 0, 0).unwrap();
    let (_, effective) = registry.set_extended(owner, flex_key(), true, later).unwrap();
    assert_eq!(effective, Utc.with_ymd_and_hms(2023, 11, 17, 9, 0, 0).unwrap());
}

#[test]
fn test_unextend_restores_raw_expiry() {
    let (_store, registry) = registry();
    let owner = OwnerId(1);
    let lock = registry.promote_or_update(owner, flex_key(), update(5, 0b1), now()).unwrap();

    registry.set_extended(owner, flex_key(), true, now());
    let (old_eff, new_eff) = registry.set_extended(owner, flex_key(), false, now()).unwrap();
    assert_eq!(old_eff, lock.expiry + Duration::days(1));
    assert_eq!(new_eff, lock.expiry);
}

#[test]
fn test_expired_extended_lock_rolls_on_update() {
    let (_store, registry) = registry();
    let owner = OwnerId(1);
    registry.promote_or_update(owner, flex_key(), update(5, 0b1), now());
    registry.set_extended(owner, flex_key(), true, now());

    let later = Utc.with_ymd_and_hms(2023, 11, 16, 10, 0, 0).unwrap();
    let lock = registry.promote_or_update(owner, flex_key(), update(5, 0b10), later).unwrap();

    // Expiry rolled to the next reset and the extension was consumed.
    assert_eq!(lock.expiry, Utc.with_ymd_and_hms(2023, 11, 17, 9, 0, 0).unwrap());
    assert!(!lock.extended);
}

// ─── Admission ───────────────────────────────────────────────────────────────

fn candidate(map_key: MapDifficultyKey, instance: u32, mask: u32) -> InstanceLock {
    use super::{LockData, LockPayload};
    let mut data = LockData::new(EntranceId(1));
    data.completed_mask = mask;
    InstanceLock::new(
        map_key.map,
        map_key.difficulty,
        InstanceId(instance),
        now() + Duration::days(1),
        LockPayload::Exclusive(data),
    )
}

#[test]
fn test_flex_admission_requires_superset() {
    let (_store, registry) = registry();
    let owner = OwnerId(1);
    registry.promote_or_update(owner, flex_key(), update(5, 0b11), now());

    // Candidate has everything the player has (and more): fine.
    let ahead = candidate(flex_key(), 6, 0b111);
    assert_eq!(registry.can_enter(owner, flex_key(), &ahead, now()), Admission::Allowed);

    // Candidate is missing a fight the player already cleared.
    let behind = candidate(flex_key(), 6, 0b01);
    assert_eq!(registry.can_enter(owner, flex_key(), &behind, now()), Admission::MissingProgress);
}

#[test]
fn test_per_encounter_admission_binds_instance() {
    let (_store, registry) = registry();
    let owner = OwnerId(1);
    registry.promote_or_update(owner, legacy_key(), update(4, 0b1), now());

    let same = candidate(legacy_key(), 4, 0);
    assert_eq!(registry.can_enter(owner, legacy_key(), &same, now()), Admission::Allowed);

    let other = candidate(legacy_key(), 9, 0);
    assert_eq!(registry.can_enter(owner, legacy_key(), &other, now()), Admission::BoundElsewhere);
}

#[test]
fn test_admission_without_schedule_or_lock() {
    let (_store, registry) = registry();
    let no_schedule = MapDifficultyKey::new(MapId(400), Difficulty::Normal);
    let cand = candidate(no_schedule, 1, 0);
    assert_eq!(registry.can_enter(OwnerId(1), no_schedule, &cand, now()), Admission::Allowed);

    // No lock at all on a flex map: admitted anywhere.
    let cand = candidate(flex_key(), 1, 0);
    assert_eq!(registry.can_enter(OwnerId(9), flex_key(), &cand, now()), Admission::Allowed);

    // Instance-bound raids admit; the shared record is the state.
    registry.promote_or_update(OwnerId(9), raid_key(), update(7, 0b1), now());
    let cand = candidate(raid_key(), 8, 0);
    assert_eq!(registry.can_enter(OwnerId(9), raid_key(), &cand, now()), Admission::Allowed);
}

// ─── Reset sequence ──────────────────────────────────────────────────────────

#[test]
fn test_warn_chain_then_global_reset() {
    let store = Arc::new(MemoryStore::new());
    let announcer = Arc::new(RecordingAnnouncer::default());
    let registry =
        LockRegistry::with_announcer(store.clone(), ResetConfig::default(), announcer.clone());

    let owner = OwnerId(1);
    registry.promote_or_update(owner, flex_key(), update(5, 0b1), now());
    registry.arm_schedules(now());

    // Nothing due yet.
    registry.tick(now());
    assert!(announcer.take().is_empty());

    // Stage one fires an hour ahead of the Nov 16 09:00 reset.
    let warn1 = Utc.with_ymd_and_hms(2023, 11, 16, 8, 0, 0).unwrap();
    registry.tick(warn1);
    let events: Vec<String> = announcer
        .take()
        .into_iter()
        .filter(|e| e.starts_with("warn 90/normal"))
        .collect();
    assert_eq!(events, vec!["warn 90/normal 3600".to_string()]);

    // Driving past the reset runs the remaining stages and the reset.
    let after = Utc.with_ymd_and_hms(2023, 11, 16, 9, 0, 0).unwrap();
    registry.tick(after);
    let events = announcer.take();
    assert!(events.iter().any(|e| e == "reset 90/normal"));

    // The expired lock's row was deleted and the lock dropped.
    assert!(registry.find_active_lock(owner, flex_key(), true, false, after).is_none());
    assert!(
        store
            .ops()
            .iter()
            .any(|op| matches!(op, StoreOp::DeleteLock { owner: o, map, .. } if *o == owner && *map == MapId(90)))
    );

    // The stored next reset advanced by one period.
    assert_eq!(
        registry.next_reset_time(flex_key(), after),
        Some(Utc.with_ymd_and_hms(2023, 11, 17, 9, 0, 0).unwrap())
    );
}

#[test]
fn test_global_reset_spares_extended_locks() {
    let store = Arc::new(MemoryStore::new());
    let announcer = Arc::new(RecordingAnnouncer::default());
    let registry =
        LockRegistry::with_announcer(store.clone(), ResetConfig::default(), announcer.clone());

    registry.promote_or_update(OwnerId(1), flex_key(), update(5, 0b1), now());
    registry.set_extended(OwnerId(1), flex_key(), true, now());
    registry.arm_schedules(now());

    let after = Utc.with_ymd_and_hms(2023, 11, 16, 9, 30, 0).unwrap();
    registry.tick(after);

    // Extended lock survived the reset.
    assert!(registry.find_active_lock(OwnerId(1), flex_key(), true, true, after).is_some());
}

#[test]
fn test_instance_expiry_drops_temporaries() {
    let store = Arc::new(MemoryStore::new());
    let announcer = Arc::new(RecordingAnnouncer::default());
    let registry =
        LockRegistry::with_announcer(store.clone(), ResetConfig::default(), announcer.clone());

    registry.create_temporary_lock(OwnerId(1), flex_key(), InstanceId(5), now());

    let after = Utc.with_ymd_and_hms(2023, 11, 16, 9, 0, 1).unwrap();
    registry.tick(after);

    let events = announcer.take();
    assert!(events.iter().any(|e| e == "expired 90/normal 5"));
    assert!(registry.find_active_lock(OwnerId(1), flex_key(), false, true, after).is_none());
}

#[test]
fn test_unbind_cancels_orphan_expiry_event() {
    let (_store, registry) = registry();
    registry.create_temporary_lock(OwnerId(1), flex_key(), InstanceId(5), now());
    assert_eq!(registry.scheduled_event_count(), 1);

    assert!(registry.unbind(OwnerId(1), flex_key()));
    assert_eq!(registry.scheduled_event_count(), 0);
    // Second unbind is a no-op.
    assert!(!registry.unbind(OwnerId(1), flex_key()));
}

// ─── Hydration ───────────────────────────────────────────────────────────────

fn seeded_row(owner: u64, instance: u32, mask: u32, expiry: DateTime<Utc>) -> LockRow {
    LockRow {
        owner: OwnerId(owner),
        map: MapId(230),
        lock_id: 10,
        instance: InstanceId(instance),
        difficulty: Difficulty::Normal,
        document: String::new(),
        completed_mask: mask,
        entrance: EntranceId(1),
        expiry,
        extended: false,
    }
}

#[test]
fn test_load_rebuilds_shared_refcounts() {
    let store = Arc::new(MemoryStore::new());
    let future = now() + Duration::days(3);
    store.seed(StoreSnapshot {
        locks: vec![seeded_row(1, 7, 0b1, future), seeded_row(2, 7, 0b1, future)],
        shared: vec![SharedRow {
            instance: InstanceId(7),
            document: String::new(),
            completed_mask: 0b1,
            entrance: EntranceId(1),
        }],
    });

    let registry = LockRegistry::new(store.clone(), ResetConfig::default());
    let loaded = registry.load(now()).expect("load");
    assert_eq!(loaded, 2);
    assert_eq!(registry.shared_ref_count(InstanceId(7)), 2);

    // Both hydrated locks read through the same record.
    let lock = registry.find_active_lock(OwnerId(1), raid_key(), true, true, now()).unwrap();
    assert!(lock.payload.is_shared());
}

#[test]
fn test_load_discards_expired_rows() {
    let store = Arc::new(MemoryStore::new());
    let past = now() - Duration::days(1);
    store.seed(StoreSnapshot {
        locks: vec![seeded_row(1, 7, 0b1, past)],
        shared: vec![SharedRow {
            instance: InstanceId(7),
            document: String::new(),
            completed_mask: 0b1,
            entrance: EntranceId(1),
        }],
    });

    let registry = LockRegistry::new(store.clone(), ResetConfig::default());
    let loaded = registry.load(now()).expect("load");
    assert_eq!(loaded, 0);

    // The expired row was deleted, and the now-orphaned shared row too.
    assert!(store.lock_rows().is_empty());
    assert!(store.shared_rows().is_empty());
    assert_eq!(store.shared_delete_count(InstanceId(7)), 1);
}

#[test]
fn test_load_self_heals_missing_shared_row() {
    let store = Arc::new(MemoryStore::new());
    let future = now() + Duration::days(3);
    store.seed(StoreSnapshot {
        locks: vec![seeded_row(1, 7, 0b11, future)],
        shared: Vec::new(),
    });

    let registry = LockRegistry::new(store.clone(), ResetConfig::default());
    assert_eq!(registry.load(now()).expect("load"), 1);
    assert_eq!(registry.shared_ref_count(InstanceId(7)), 1);

    // The shared row was restored from the lock row.
    let shared = store.shared_rows();
    assert_eq!(shared.len(), 1);
    assert_eq!(shared[0].completed_mask, 0b11);
}

#[test]
fn test_load_schedules_instance_expiries() {
    let store = Arc::new(MemoryStore::new());
    let future = now() + Duration::days(3);
    store.seed(StoreSnapshot {
        locks: vec![seeded_row(1, 7, 0b1, future), seeded_row(2, 7, 0b1, future)],
        shared: vec![SharedRow {
            instance: InstanceId(7),
            document: String::new(),
            completed_mask: 0b1,
            entrance: EntranceId(1),
        }],
    });

    let registry = LockRegistry::new(store.clone(), ResetConfig::default());
    registry.load(now()).expect("load");
    let with_rows = registry.scheduled_event_count();

    let empty_registry = LockRegistry::new(Arc::new(MemoryStore::new()), ResetConfig::default());
    empty_registry.load(now()).expect("load");
    let baseline = empty_registry.scheduled_event_count();

    // Exactly one expiry event for the instance, not one per referencing
    // row, on top of the armed warn stages.
    assert_eq!(with_rows, baseline + 1);
}
