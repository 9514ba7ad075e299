//! The lock registry
//!
//! Owns the permanent and temporary lock stores, the shared-data records
//! with their reference counts, and the per-key next-reset bookkeeping.
//! Every compound find-or-create-or-promote sequence runs inside one
//! exclusive critical section, so at most one lock is ever materialized per
//! (owner, map, difficulty) key even under racing transfer attempts.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use hashbrown::{HashMap, HashSet};
use wardstone_types::{Difficulty, InstanceId, LockKey, MapDifficultyKey, OwnerId};

use super::announcer::{LogAnnouncer, ResetAnnouncer};
use super::data::{LockData, LockPayload};
use super::instance_lock::InstanceLock;
use super::update::{Admission, LockUpdateEvent};
use crate::config::ResetConfig;
use crate::game_data::{LockModel, MapEntry, all_map_ids, lookup_map, map_cadence};
use crate::reset::{ResetEvent, ResetEventKind, ResetQueue, next_reset, reset_period};
use crate::storage::{LockRow, LockStore, SharedRow, StoreError};

/// Registry lifecycle, checked at the top of every reference-drop path so
/// shutdown teardown never fires storage deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Running,
    Unloading,
}

/// Canonical shared data for one concrete instance, with its explicit
/// reference count. The durable shared row exists iff `refs > 0`.
#[derive(Debug)]
struct SharedRecord {
    data: Arc<Mutex<LockData>>,
    refs: usize,
}

#[derive(Debug)]
struct RegistryInner {
    permanent: HashMap<LockKey, InstanceLock>,
    temporary: HashMap<LockKey, InstanceLock>,
    shared: HashMap<InstanceId, SharedRecord>,

    /// Stored next-reset instant per key, advanced by the global reset.
    reset_times: HashMap<MapDifficultyKey, DateTime<Utc>>,

    /// Instance-expiry events currently live in the queue.
    scheduled_expiries: HashSet<(MapDifficultyKey, InstanceId)>,

    /// Keys whose warn/reset sequence has been armed.
    armed: HashSet<MapDifficultyKey>,

    lifecycle: Lifecycle,
}

/// Central owner of the (owner, map, difficulty) -> lock mapping.
pub struct LockRegistry {
    inner: Mutex<RegistryInner>,
    queue: ResetQueue,
    store: Arc<dyn LockStore>,
    announcer: Arc<dyn ResetAnnouncer>,
    config: ResetConfig,
}

impl LockRegistry {
    pub fn new(store: Arc<dyn LockStore>, config: ResetConfig) -> Self {
        Self::with_announcer(store, config, Arc::new(LogAnnouncer))
    }

    pub fn with_announcer(
        store: Arc<dyn LockStore>,
        config: ResetConfig,
        announcer: Arc<dyn ResetAnnouncer>,
    ) -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                permanent: HashMap::new(),
                temporary: HashMap::new(),
                shared: HashMap::new(),
                reset_times: HashMap::new(),
                scheduled_expiries: HashSet::new(),
                armed: HashSet::new(),
                lifecycle: Lifecycle::Running,
            }),
            queue: ResetQueue::new(),
            store,
            announcer,
            config,
        }
    }

    pub fn config(&self) -> &ResetConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lock_inner().lifecycle
    }

    /// Number of events waiting in the reset queue.
    pub fn scheduled_event_count(&self) -> usize {
        self.queue.len()
    }

    fn lock_inner(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().expect("lock registry poisoned")
    }

    // ─── Boot ────────────────────────────────────────────────────────────────

    /// Hydrate from durable storage and arm the reset schedules.
    ///
    /// Already-expired, unextended rows are deleted on the spot. Shared
    /// records are rebuilt with reference counts derived from the rows that
    /// point at them; orphaned shared rows are deleted.
    pub fn load(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let snapshot = self.store.load_all_locks()?;
        let mut inner = self.lock_inner();

        for row in snapshot.shared {
            inner.shared.insert(
                row.instance,
                SharedRecord {
                    data: Arc::new(Mutex::new(LockData {
                        document: row.document,
                        completed_mask: row.completed_mask,
                        entrance: row.entrance,
                    })),
                    refs: 0,
                },
            );
        }

        let mut loaded = 0;
        for row in snapshot.locks {
            let Some(entry) = lookup_map(row.map) else {
                tracing::warn!(map = row.map.0, "lock row for unknown map dropped");
                self.store.delete_lock_row(row.owner, row.map, row.lock_id);
                continue;
            };
            if !entry.has_reset_schedule(row.difficulty) {
                tracing::warn!(map = row.map.0, difficulty = %row.difficulty, "lock row for unlockable difficulty dropped");
                self.store.delete_lock_row(row.owner, row.map, row.lock_id);
                continue;
            }
            if row.expiry <= now && !row.extended {
                self.store.delete_lock_row(row.owner, row.map, row.lock_id);
                continue;
            }

            let key = MapDifficultyKey::new(row.map, row.difficulty);
            let payload = if entry.lock_model == LockModel::InstanceBound && row.instance.is_bound() {
                if !inner.shared.contains_key(&row.instance) {
                    // Half-written database from a crash: rebuild the
                    // record from the per-owner row and restore its row.
                    tracing::warn!(instance = row.instance.0, "shared row missing, rebuilding from lock row");
                    inner.shared.insert(
                        row.instance,
                        SharedRecord {
                            data: Arc::new(Mutex::new(LockData {
                                document: row.document.clone(),
                                completed_mask: row.completed_mask,
                                entrance: row.entrance,
                            })),
                            refs: 0,
                        },
                    );
                    self.store.upsert_shared_row(SharedRow {
                        instance: row.instance,
                        document: row.document.clone(),
                        completed_mask: row.completed_mask,
                        entrance: row.entrance,
                    });
                }
                Self::attach_shared(&mut inner, row.instance, &row)
            } else {
                LockPayload::Exclusive(LockData {
                    document: row.document.clone(),
                    completed_mask: row.completed_mask,
                    entrance: row.entrance,
                })
            };

            let mut lock = InstanceLock::new(row.map, row.difficulty, row.instance, row.expiry, payload);
            lock.extended = row.extended;

            if row.instance.is_bound()
                && !row.extended
                && inner.scheduled_expiries.insert((key, row.instance))
            {
                self.queue.schedule(row.expiry, ResetEvent::expiry(key, row.instance));
            }

            inner.permanent.insert(LockKey::new(row.owner, key), lock);
            loaded += 1;
        }

        // A shared row exists iff something references it.
        let orphans: Vec<InstanceId> = inner
            .shared
            .iter()
            .filter(|(_, record)| record.refs == 0)
            .map(|(instance, _)| *instance)
            .collect();
        for instance in orphans {
            inner.shared.remove(&instance);
            self.store.delete_shared_row(instance);
        }

        drop(inner);
        self.arm_schedules(now);
        Ok(loaded)
    }

    /// Arm the warn/reset sequence for every key in the map table that has
    /// a cadence. Idempotent per key.
    pub fn arm_schedules(&self, now: DateTime<Utc>) {
        let mut inner = self.lock_inner();
        for map in all_map_ids() {
            for difficulty in Difficulty::ALL {
                let key = MapDifficultyKey::new(map, difficulty);
                if inner.armed.contains(&key) {
                    continue;
                }
                let Some(next) = self.next_reset_time_locked(&mut inner, key, now) else {
                    continue;
                };
                inner.armed.insert(key);
                self.queue.schedule(
                    next - ResetEventKind::WarnStageOne.lead(),
                    ResetEvent::global(ResetEventKind::WarnStageOne, key),
                );
            }
        }
    }

    // ─── Reset times ─────────────────────────────────────────────────────────

    /// The stored (or lazily computed) next global reset for a key.
    pub fn next_reset_time(&self, key: MapDifficultyKey, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut inner = self.lock_inner();
        self.next_reset_time_locked(&mut inner, key, now)
    }

    fn next_reset_time_locked(
        &self,
        inner: &mut RegistryInner,
        key: MapDifficultyKey,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        let cadence = map_cadence(key.map, key.difficulty)?;
        if let Some(stored) = inner.reset_times.get(&key)
            && *stored > now
        {
            return Some(*stored);
        }
        let prev = inner.reset_times.get(&key).copied();
        let next = next_reset(cadence, prev, &self.config, now);
        inner.reset_times.insert(key, next);
        Some(next)
    }

    // ─── Lookup ──────────────────────────────────────────────────────────────

    /// Resolve the lock an owner currently holds for a key.
    ///
    /// The permanent store wins; an expired, unextended permanent lock only
    /// satisfies the lookup when `ignore_expired` is false. The temporary
    /// store is consulted last unless `ignore_temporary`.
    pub fn find_active_lock(
        &self,
        owner: OwnerId,
        key: MapDifficultyKey,
        ignore_temporary: bool,
        ignore_expired: bool,
        now: DateTime<Utc>,
    ) -> Option<InstanceLock> {
        let inner = self.lock_inner();
        let lk = LockKey::new(owner, key);

        if let Some(lock) = inner.permanent.get(&lk)
            && (lock.is_active(now) || !ignore_expired)
        {
            return Some(lock.clone());
        }
        if !ignore_temporary {
            return inner.temporary.get(&lk).cloned();
        }
        None
    }

    // ─── Creation & promotion ────────────────────────────────────────────────

    /// Bind an owner to an instance before any encounter progress exists.
    ///
    /// Only maps with a reset schedule get temporary locks; expiry is the
    /// next scheduled global reset.
    pub fn create_temporary_lock(
        &self,
        owner: OwnerId,
        key: MapDifficultyKey,
        instance: InstanceId,
        now: DateTime<Utc>,
    ) -> Option<InstanceLock> {
        let entry = lookup_map(key.map)?;
        if !entry.has_reset_schedule(key.difficulty) {
            return None;
        }

        let mut inner = self.lock_inner();
        let expiry = self.next_reset_time_locked(&mut inner, key, now)?;

        let lock = InstanceLock::new(
            key.map,
            key.difficulty,
            instance,
            expiry,
            LockPayload::Exclusive(LockData::new(entry.default_entrance)),
        );

        if instance.is_bound() && inner.scheduled_expiries.insert((key, instance)) {
            self.queue.schedule(expiry, ResetEvent::expiry(key, instance));
        }

        inner.temporary.insert(LockKey::new(owner, key), lock.clone());
        Some(lock)
    }

    /// The central write path: promote a temporary lock, reuse the active
    /// permanent one, or create a fresh lock; then merge the update and
    /// issue the durable upsert.
    pub fn promote_or_update(
        &self,
        owner: OwnerId,
        key: MapDifficultyKey,
        update: LockUpdateEvent,
        now: DateTime<Utc>,
    ) -> Option<InstanceLock> {
        let entry = lookup_map(key.map)?;
        if !entry.has_reset_schedule(key.difficulty) {
            tracing::warn!(%key, "encounter update for unlockable map dropped");
            return None;
        }

        let mut inner = self.lock_inner();
        let lk = LockKey::new(owner, key);

        let mut lock = if let Some(temp) = inner.temporary.remove(&lk) {
            // The owner stayed: the pre-encounter binding becomes real.
            tracing::debug!(owner = owner.0, %key, "promoting temporary lock");
            temp
        } else if let Some(existing) = inner.permanent.remove(&lk) {
            if existing.is_active(now) {
                existing
            } else {
                Self::release_payload(&mut inner, &existing.payload, &*self.store);
                self.fresh_lock(&mut inner, entry, key, &update, now)
            }
        } else {
            self.fresh_lock(&mut inner, entry, key, &update, now)
        };

        // A lock on an instance-bound map must carry the shared record for
        // the concrete instance the progress happened in.
        if entry.lock_model == LockModel::InstanceBound
            && !lock.payload.is_shared()
            && update.instance.is_bound()
        {
            lock.payload = Self::attach_shared_fresh(&mut inner, update.instance, entry);
        }

        if !lock.instance.is_bound() && update.instance.is_bound() {
            lock.instance = update.instance;
        }

        match &mut lock.payload {
            LockPayload::Exclusive(data) => data.merge(&update),
            LockPayload::Shared { data, .. } => {
                data.lock().expect("shared lock data poisoned").merge(&update)
            }
        }

        if lock.extended
            && lock.is_expired(now)
            && let Some(next) = self.next_reset_time_locked(&mut inner, key, now)
        {
            lock.expiry = next;
            lock.extended = false;
        }

        let data = lock.payload.data();
        self.store.upsert_lock_row(LockRow {
            owner,
            map: key.map,
            lock_id: entry.lock_id,
            instance: lock.instance,
            difficulty: key.difficulty,
            document: data.document.clone(),
            completed_mask: data.completed_mask,
            entrance: data.entrance,
            expiry: lock.expiry,
            extended: lock.extended,
        });
        if let LockPayload::Shared { instance, .. } = &lock.payload {
            self.store.upsert_shared_row(SharedRow {
                instance: *instance,
                document: data.document,
                completed_mask: data.completed_mask,
                entrance: data.entrance,
            });
        }

        inner.permanent.insert(lk, lock.clone());
        Some(lock)
    }

    fn fresh_lock(
        &self,
        inner: &mut RegistryInner,
        entry: &'static MapEntry,
        key: MapDifficultyKey,
        update: &LockUpdateEvent,
        now: DateTime<Utc>,
    ) -> InstanceLock {
        let expiry = self
            .next_reset_time_locked(inner, key, now)
            .unwrap_or_else(|| now + Duration::days(1));

        let payload = if entry.lock_model == LockModel::InstanceBound && update.instance.is_bound() {
            Self::attach_shared_fresh(inner, update.instance, entry)
        } else {
            LockPayload::Exclusive(LockData::new(entry.default_entrance))
        };

        if update.instance.is_bound() && inner.scheduled_expiries.insert((key, update.instance)) {
            self.queue.schedule(expiry, ResetEvent::expiry(key, update.instance));
        }

        InstanceLock::new(key.map, key.difficulty, update.instance, expiry, payload)
    }

    /// Attach to (or create) the shared record for an instance.
    fn attach_shared_fresh(
        inner: &mut RegistryInner,
        instance: InstanceId,
        entry: &'static MapEntry,
    ) -> LockPayload {
        let record = inner.shared.entry(instance).or_insert_with(|| SharedRecord {
            data: Arc::new(Mutex::new(LockData::new(entry.default_entrance))),
            refs: 0,
        });
        record.refs += 1;
        LockPayload::Shared { instance, data: Arc::clone(&record.data) }
    }

    /// Attach to an already-hydrated shared record during load.
    fn attach_shared(inner: &mut RegistryInner, instance: InstanceId, row: &LockRow) -> LockPayload {
        let record = inner.shared.entry(instance).or_insert_with(|| SharedRecord {
            data: Arc::new(Mutex::new(LockData {
                document: row.document.clone(),
                completed_mask: row.completed_mask,
                entrance: row.entrance,
            })),
            refs: 0,
        });
        record.refs += 1;
        LockPayload::Shared { instance, data: Arc::clone(&record.data) }
    }

    /// Drop one reference to a shared payload, deleting the record and its
    /// durable row when the last reference goes.
    fn release_payload(inner: &mut RegistryInner, payload: &LockPayload, store: &dyn LockStore) {
        let LockPayload::Shared { instance, .. } = payload else {
            return;
        };
        let unloading = inner.lifecycle == Lifecycle::Unloading;

        let Some(record) = inner.shared.get_mut(instance) else {
            // A lock pointed at shared data the registry does not know
            // about: prior bookkeeping bug, not a recoverable condition.
            panic!("shared lock data missing for instance {}", instance.0);
        };
        assert!(record.refs > 0, "shared lock data refcount underflow for instance {}", instance.0);

        record.refs -= 1;
        if record.refs == 0 {
            inner.shared.remove(instance);
            if !unloading {
                store.delete_shared_row(*instance);
            }
        }
    }

    // ─── Extension ───────────────────────────────────────────────────────────

    /// Toggle the extension flag, returning (old, new) effective expiry.
    pub fn set_extended(
        &self,
        owner: OwnerId,
        key: MapDifficultyKey,
        extended: bool,
        now: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let entry = lookup_map(key.map)?;
        let cadence = map_cadence(key.map, key.difficulty)?;
        let period = reset_period(cadence, &self.config);

        let mut inner = self.lock_inner();
        let next = self.next_reset_time_locked(&mut inner, key, now)?;

        let lk = LockKey::new(owner, key);
        let lock = inner.permanent.get_mut(&lk)?;

        let old_effective = Self::effective_expiry(lock, next, period, now);
        lock.extended = extended;
        let new_effective = Self::effective_expiry(lock, next, period, now);

        let row = LockRow {
            owner,
            map: key.map,
            lock_id: entry.lock_id,
            instance: lock.instance,
            difficulty: key.difficulty,
            document: lock.data().document,
            completed_mask: lock.completed_mask(),
            entrance: lock.data().entrance,
            expiry: lock.expiry,
            extended: lock.extended,
        };
        self.store.upsert_lock_row(row);

        Some((old_effective, new_effective))
    }

    /// Effective expiry rule: raw expiry while unextended; the next global
    /// reset once extended and expired; raw expiry plus exactly one reset
    /// period while extended but not yet expired.
    fn effective_expiry(
        lock: &InstanceLock,
        next_reset: DateTime<Utc>,
        period: Duration,
        now: DateTime<Utc>,
    ) -> DateTime<Utc> {
        if !lock.extended {
            lock.expiry
        } else if lock.is_expired(now) {
            next_reset
        } else {
            lock.expiry + period
        }
    }

    // ─── Admission ───────────────────────────────────────────────────────────

    /// Decide whether `owner` may enter the concrete instance represented
    /// by `candidate`.
    pub fn can_enter(
        &self,
        owner: OwnerId,
        key: MapDifficultyKey,
        candidate: &InstanceLock,
        now: DateTime<Utc>,
    ) -> Admission {
        let Some(entry) = lookup_map(key.map) else {
            return Admission::Allowed;
        };
        if !entry.has_reset_schedule(key.difficulty) {
            return Admission::Allowed;
        }

        let own = self.find_active_lock(owner, key, false, true, now);
        match entry.lock_model {
            LockModel::Flex => {
                if let Some(own) = own
                    && own.completed_mask() & !candidate.completed_mask() != 0
                {
                    Admission::MissingProgress
                } else {
                    Admission::Allowed
                }
            }
            LockModel::PerEncounter => {
                if let Some(own) = own
                    && own.instance.is_bound()
                    && candidate.instance.is_bound()
                    && own.instance != candidate.instance
                {
                    Admission::BoundElsewhere
                } else {
                    Admission::Allowed
                }
            }
            LockModel::InstanceBound => Admission::Allowed,
        }
    }

    // ─── Removal ─────────────────────────────────────────────────────────────

    /// Explicitly unbind an owner from a key. Returns false when no lock
    /// existed.
    pub fn unbind(&self, owner: OwnerId, key: MapDifficultyKey) -> bool {
        let mut inner = self.lock_inner();
        let lk = LockKey::new(owner, key);

        if let Some(lock) = inner.permanent.remove(&lk) {
            if let Some(entry) = lookup_map(key.map) {
                self.store.delete_lock_row(owner, key.map, entry.lock_id);
            }
            let instance = lock.instance;
            let expiry = lock.expiry;
            Self::release_payload(&mut inner, &lock.payload, &*self.store);
            self.cancel_orphan_expiry(&mut inner, key, instance, expiry);
            return true;
        }

        if let Some(lock) = inner.temporary.remove(&lk) {
            let instance = lock.instance;
            let expiry = lock.expiry;
            self.cancel_orphan_expiry(&mut inner, key, instance, expiry);
            return true;
        }

        false
    }

    /// Cancel the instance-expiry event when nothing references the
    /// instance anymore. Best-effort: the event may already have fired.
    fn cancel_orphan_expiry(
        &self,
        inner: &mut RegistryInner,
        key: MapDifficultyKey,
        instance: InstanceId,
        expiry_hint: DateTime<Utc>,
    ) {
        if !instance.is_bound() {
            return;
        }
        let referenced = inner
            .permanent
            .iter()
            .chain(inner.temporary.iter())
            .any(|(k, l)| k.map_difficulty == key && l.instance == instance);
        if !referenced && inner.scheduled_expiries.remove(&(key, instance)) {
            self.queue.cancel(expiry_hint, &ResetEvent::expiry(key, instance));
        }
    }

    /// Mark whether the owner is currently inside the bound instance.
    pub fn set_in_use(&self, owner: OwnerId, key: MapDifficultyKey, in_use: bool) -> bool {
        let mut inner = self.lock_inner();
        let lk = LockKey::new(owner, key);
        if let Some(lock) = inner.permanent.get_mut(&lk) {
            lock.in_use = in_use;
            true
        } else if let Some(lock) = inner.temporary.get_mut(&lk) {
            lock.in_use = in_use;
            true
        } else {
            false
        }
    }

    // ─── Tick ────────────────────────────────────────────────────────────────

    /// Process every due reset event, including stages that became due
    /// while processing. Driven by one periodic caller.
    pub fn tick(&self, now: DateTime<Utc>) {
        loop {
            let due = self.queue.tick(now);
            if due.is_empty() {
                break;
            }
            self.process_due(due, now);
        }
    }

    fn process_due(&self, due: Vec<(DateTime<Utc>, ResetEvent)>, now: DateTime<Utc>) {
        for (fire_time, event) in due {
            match event.kind {
                ResetEventKind::InstanceExpiry => {
                    self.handle_instance_expiry(event.key, event.instance);
                }
                ResetEventKind::WarnStageOne
                | ResetEventKind::WarnStageTwo
                | ResetEventKind::WarnStageThree => {
                    let reset_time = fire_time + event.kind.lead();
                    self.announcer.warn_time_left(event.key, reset_time - now);
                    if let Some(next_stage) = event.kind.next_stage() {
                        self.queue.schedule(
                            reset_time - next_stage.lead(),
                            ResetEvent::global(next_stage, event.key),
                        );
                    }
                }
                ResetEventKind::GlobalReset => {
                    let reset_time = fire_time + event.kind.lead();
                    self.handle_global_reset(event.key, reset_time, now);
                }
            }
        }
    }

    fn handle_instance_expiry(&self, key: MapDifficultyKey, instance: InstanceId) {
        let mut inner = self.lock_inner();
        inner.scheduled_expiries.remove(&(key, instance));

        // Temporary bindings to the expired copy vanish with it.
        let stale: Vec<LockKey> = inner
            .temporary
            .iter()
            .filter(|(k, l)| k.map_difficulty == key && l.instance == instance)
            .map(|(k, _)| *k)
            .collect();
        for lk in stale {
            inner.temporary.remove(&lk);
        }

        // Permanent locks keep their rows; the copy itself is gone.
        for (lk, lock) in inner.permanent.iter_mut() {
            if lk.map_difficulty == key && lock.instance == instance {
                lock.in_use = false;
            }
        }

        drop(inner);
        self.announcer.instance_expired(key, instance);
    }

    fn handle_global_reset(&self, key: MapDifficultyKey, reset_time: DateTime<Utc>, now: DateTime<Utc>) {
        let mut inner = self.lock_inner();

        let expired: Vec<LockKey> = inner
            .permanent
            .iter()
            .filter(|(lk, lock)| lk.map_difficulty == key && !lock.extended && lock.is_expired(now))
            .map(|(lk, _)| *lk)
            .collect();

        let lock_id = lookup_map(key.map).map(|entry| entry.lock_id).unwrap_or_default();
        for lk in expired {
            self.store.delete_lock_row(lk.owner, key.map, lock_id);
            let keep_in_memory = inner.permanent.get(&lk).is_some_and(|l| l.in_use);
            if keep_in_memory {
                // Owner is still inside; the row is gone but the running
                // instance stays coherent until they leave.
                continue;
            }
            if let Some(lock) = inner.permanent.remove(&lk) {
                Self::release_payload(&mut inner, &lock.payload, &*self.store);
            }
        }

        let stale_temps: Vec<LockKey> = inner
            .temporary
            .iter()
            .filter(|(lk, lock)| lk.map_difficulty == key && lock.is_expired(now))
            .map(|(lk, _)| *lk)
            .collect();
        for lk in stale_temps {
            inner.temporary.remove(&lk);
        }

        // Advance the stored next-reset time by one period and re-arm the
        // warn sequence.
        if let Some(cadence) = map_cadence(key.map, key.difficulty) {
            let next = next_reset(cadence, Some(reset_time), &self.config, now.max(reset_time));
            inner.reset_times.insert(key, next);
            self.queue.schedule(
                next - ResetEventKind::WarnStageOne.lead(),
                ResetEvent::global(ResetEventKind::WarnStageOne, key),
            );
        }

        drop(inner);
        self.announcer.global_reset(key);
    }

    // ─── Shutdown ────────────────────────────────────────────────────────────

    /// Flip to `Unloading` and drop all state without firing storage
    /// deletes: rows must survive a shutdown.
    pub fn unload(&self) {
        let mut inner = self.lock_inner();
        inner.lifecycle = Lifecycle::Unloading;
        inner.permanent.clear();
        inner.temporary.clear();
        inner.shared.clear();
        inner.scheduled_expiries.clear();
        inner.armed.clear();
        inner.reset_times.clear();
    }

    // ─── Introspection ───────────────────────────────────────────────────────

    /// Snapshot of every lock: (key, lock, is_temporary).
    pub fn snapshot(&self) -> Vec<(LockKey, InstanceLock, bool)> {
        let inner = self.lock_inner();
        let mut out: Vec<(LockKey, InstanceLock, bool)> = inner
            .permanent
            .iter()
            .map(|(lk, lock)| (*lk, lock.clone(), false))
            .chain(inner.temporary.iter().map(|(lk, lock)| (*lk, lock.clone(), true)))
            .collect();
        out.sort_by_key(|(lk, _, _)| (lk.owner, lk.map_difficulty.map, lk.map_difficulty.difficulty));
        out
    }

    /// Current reference count of a shared record (0 when absent).
    pub fn shared_ref_count(&self, instance: InstanceId) -> usize {
        let inner = self.lock_inner();
        inner.shared.get(&instance).map(|record| record.refs).unwrap_or(0)
    }
}
