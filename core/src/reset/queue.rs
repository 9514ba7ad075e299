//! Fire-time-ordered reset event queue

use std::collections::BTreeMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use super::event::ResetEvent;

#[derive(Debug, Default)]
struct QueueInner {
    /// Keyed by (fire time, insertion sequence): iteration order is fire
    /// time with stable tie-break by insertion.
    events: BTreeMap<(DateTime<Utc>, u64), ResetEvent>,
    next_seq: u64,
}

/// Time-ordered queue of reset events.
///
/// `schedule` and `cancel` are called from arbitrary concurrent
/// encounter-update paths; `tick` has a single periodic driver. All three
/// synchronize on one interior lock around the queue.
#[derive(Debug, Default)]
pub struct ResetQueue {
    inner: Mutex<QueueInner>,
}

impl ResetQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&self, fire_time: DateTime<Utc>, event: ResetEvent) {
        let mut inner = self.inner.lock().expect("reset queue poisoned");
        let seq = inner.next_seq;
        inner.next_seq += 1;
        tracing::debug!(?event, %fire_time, "scheduling reset event");
        inner.events.insert((fire_time, seq), event);
    }

    /// Best-effort removal of a previously scheduled event.
    ///
    /// Looks for an exact match at `fire_hint` first; if the fire time has
    /// since changed, falls back to a full scan. A miss is not an error:
    /// the event may already have fired.
    pub fn cancel(&self, fire_hint: DateTime<Utc>, event: &ResetEvent) -> bool {
        let mut inner = self.inner.lock().expect("reset queue poisoned");

        let hinted: Option<(DateTime<Utc>, u64)> = inner
            .events
            .range((fire_hint, 0)..(fire_hint, u64::MAX))
            .find(|(_, e)| **e == *event)
            .map(|(k, _)| *k);
        if let Some(key) = hinted {
            inner.events.remove(&key);
            return true;
        }

        let scanned: Option<(DateTime<Utc>, u64)> = inner
            .events
            .iter()
            .find(|(_, e)| **e == *event)
            .map(|(k, _)| *k);
        if let Some(key) = scanned {
            inner.events.remove(&key);
            return true;
        }

        tracing::debug!(?event, "cancel missed, event already fired");
        false
    }

    /// Pop every event with fire time <= `now`, in firing order.
    pub fn tick(&self, now: DateTime<Utc>) -> Vec<(DateTime<Utc>, ResetEvent)> {
        let mut inner = self.inner.lock().expect("reset queue poisoned");
        let mut due = Vec::new();
        while inner
            .events
            .first_key_value()
            .is_some_and(|((fire_time, _), _)| *fire_time <= now)
        {
            if let Some(((fire_time, _), event)) = inner.events.pop_first() {
                due.push((fire_time, event));
            }
        }
        due
    }

    /// Fire time of the next queued event, if any.
    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        let inner = self.inner.lock().expect("reset queue poisoned");
        inner.events.first_key_value().map(|((t, _), _)| *t)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("reset queue poisoned").events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reset::event::ResetEventKind;
    use chrono::TimeZone;
    use wardstone_types::{Difficulty, InstanceId, MapDifficultyKey, MapId};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn key(map: u32) -> MapDifficultyKey {
        MapDifficultyKey::new(MapId(map), Difficulty::Normal)
    }

    #[test]
    fn test_tick_pops_in_fire_order() {
        let queue = ResetQueue::new();
        queue.schedule(at(30), ResetEvent::expiry(key(2), InstanceId(2)));
        queue.schedule(at(10), ResetEvent::expiry(key(1), InstanceId(1)));
        queue.schedule(at(20), ResetEvent::expiry(key(3), InstanceId(3)));

        let due = queue.tick(at(25));
        let maps: Vec<u32> = due.iter().map(|(_, e)| e.key.map.0).collect();
        assert_eq!(maps, vec![1, 3]);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let queue = ResetQueue::new();
        for map in [7, 5, 9] {
            queue.schedule(at(10), ResetEvent::expiry(key(map), InstanceId(map)));
        }

        let due = queue.tick(at(10));
        let maps: Vec<u32> = due.iter().map(|(_, e)| e.key.map.0).collect();
        assert_eq!(maps, vec![7, 5, 9]);
    }

    #[test]
    fn test_cancel_at_hint() {
        let queue = ResetQueue::new();
        let event = ResetEvent::global(ResetEventKind::WarnStageOne, key(1));
        queue.schedule(at(10), event);
        assert!(queue.cancel(at(10), &event));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel_falls_back_to_scan() {
        let queue = ResetQueue::new();
        let event = ResetEvent::global(ResetEventKind::WarnStageTwo, key(1));
        queue.schedule(at(50), event);
        // Caller's notion of the fire time is stale.
        assert!(queue.cancel(at(10), &event));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_cancel_miss_is_noop() {
        let queue = ResetQueue::new();
        let event = ResetEvent::global(ResetEventKind::GlobalReset, key(1));
        assert!(!queue.cancel(at(10), &event));
    }

    #[test]
    fn test_next_fire_time() {
        let queue = ResetQueue::new();
        assert_eq!(queue.next_fire_time(), None);
        queue.schedule(at(40), ResetEvent::expiry(key(1), InstanceId(1)));
        queue.schedule(at(20), ResetEvent::expiry(key(2), InstanceId(2)));
        assert_eq!(queue.next_fire_time(), Some(at(20)));
    }
}
