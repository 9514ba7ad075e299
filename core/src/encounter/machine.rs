//! Per-instance encounter tracker and transition rules

use std::collections::BTreeMap;
use std::time::Duration;

use hashbrown::{HashMap, HashSet};
use wardstone_types::{BossId, CreatureId, Difficulty, EntranceId};

use super::definition::{BossDefinition, DungeonScript};
use super::signal::{BossStateUpdate, EncounterSignal};
use super::state::{EncounterState, door_open};
use crate::save::{AdditionalValue, SaveDocument};

/// Total combat-resurrection budget per fight; one charge accrues every
/// `BUDGET / player_count`.
const COMBAT_RES_BUDGET: Duration = Duration::from_secs(90 * 60);

/// Why a requested transition was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    UnknownBoss,
    /// `Done` is terminal; no downgrade is ever applied.
    DoneIsTerminal,
    /// A world-boss-tagged minion of this encounter is still alive.
    WorldBossMinionAlive(CreatureId),
}

/// Outcome of a state-change request.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied { signals: Vec<EncounterSignal> },
    /// Requested state equals the current state; nothing emitted.
    Unchanged,
    Rejected(RejectReason),
}

impl Transition {
    pub fn signals(&self) -> &[EncounterSignal] {
        match self {
            Transition::Applied { signals } => signals,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
struct BossRecord {
    definition: BossDefinition,
    state: EncounterState,
}

/// Runtime encounter state for one concrete instance.
///
/// Holds the boss-state array the save document mirrors, the completed
/// bitmask, and the alive-minion bookkeeping the `Done` guard needs.
#[derive(Debug, Clone)]
pub struct EncounterTracker {
    header: String,
    difficulty: Difficulty,
    default_entrance: EntranceId,

    /// Lock models with a single scoped save always re-enter at the fixed
    /// default entrance; per-encounter models derive it from progress.
    scoped_save: bool,

    bosses: Vec<BossRecord>,
    completed_mask: u32,

    /// Bosses in the order they reached `Done` this session.
    completion_order: Vec<BossId>,

    /// Alive world-boss-tagged minions per encounter.
    alive_minions: HashMap<BossId, HashSet<CreatureId>>,

    /// Named numeric values scripts persist alongside boss states.
    additional: BTreeMap<String, AdditionalValue>,
}

impl EncounterTracker {
    pub fn new(script: &DungeonScript, difficulty: Difficulty, scoped_save: bool) -> Self {
        let bosses = script
            .bosses
            .iter()
            .map(|def| BossRecord {
                definition: def.clone(),
                state: EncounterState::ToBeDecided,
            })
            .collect();

        Self {
            header: script.script.header.clone(),
            difficulty,
            default_entrance: script.script.default_entrance,
            scoped_save,
            bosses,
            completed_mask: 0,
            completion_order: Vec::new(),
            alive_minions: HashMap::new(),
            additional: BTreeMap::new(),
        }
    }

    // ─── Read API ────────────────────────────────────────────────────────────

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn boss_count(&self) -> usize {
        self.bosses.len()
    }

    pub fn boss_state(&self, id: BossId) -> Option<EncounterState> {
        self.bosses.get(id.0 as usize).map(|r| r.state)
    }

    pub fn completed_mask(&self) -> u32 {
        self.completed_mask
    }

    /// Snapshot of the persistable state.
    pub fn save_document(&self) -> SaveDocument {
        SaveDocument {
            header: self.header.clone(),
            boss_states: self.bosses.iter().map(|r| r.state).collect(),
            additional: self.additional.clone(),
        }
    }

    // ─── Loading ─────────────────────────────────────────────────────────────

    /// Apply a loaded document as the initialization write for every boss.
    ///
    /// States land as-is (the codec already clamped transients); `Done`
    /// bosses contribute their mask bit. No signals are emitted.
    pub fn load_document(&mut self, doc: &SaveDocument) {
        for (index, record) in self.bosses.iter_mut().enumerate() {
            let state = doc.boss_state(index);
            record.state = state;
            if state == EncounterState::Done
                && let Some(bit) = record.definition.bit
            {
                self.completed_mask |= 1 << bit;
            }
        }
        self.additional = doc.additional.clone();
    }

    // ─── Minion bookkeeping ──────────────────────────────────────────────────

    /// Record a spawned minion. Only world-boss-tagged minions are tracked;
    /// others never gate the `Done` transition.
    pub fn minion_spawned(&mut self, boss: BossId, creature: CreatureId) {
        let Some(record) = self.bosses.get(boss.0 as usize) else {
            return;
        };
        if record.definition.is_world_boss_minion(creature) {
            self.alive_minions.entry(boss).or_default().insert(creature);
        }
    }

    pub fn minion_died(&mut self, boss: BossId, creature: CreatureId) {
        if let Some(alive) = self.alive_minions.get_mut(&boss) {
            alive.remove(&creature);
        }
    }

    fn alive_world_boss_minion(&self, boss: BossId) -> Option<CreatureId> {
        self.alive_minions
            .get(&boss)
            .and_then(|alive| alive.iter().next().copied())
    }

    // ─── Additional values ───────────────────────────────────────────────────

    pub fn set_additional(&mut self, key: &str, value: AdditionalValue) {
        self.additional.insert(key.to_string(), value);
    }

    // ─── Transitions ─────────────────────────────────────────────────────────

    /// Request a state change for one boss.
    ///
    /// `player_count` is the current population of the instance; it sizes
    /// the combat-resurrection charge interval when a fight starts.
    pub fn set_boss_state(
        &mut self,
        id: BossId,
        new_state: EncounterState,
        player_count: u32,
    ) -> Transition {
        let Some(record) = self.bosses.get(id.0 as usize) else {
            tracing::warn!(boss = id.0, "state change for unknown boss ignored");
            return Transition::Rejected(RejectReason::UnknownBoss);
        };
        let current = record.state;

        // Initialization write: the first state this boss ever receives.
        if current == EncounterState::ToBeDecided {
            let record = &mut self.bosses[id.0 as usize];
            record.state = new_state;
            if new_state == EncounterState::Done {
                self.mark_completed(id);
            }
            return Transition::Applied { signals: Vec::new() };
        }

        if new_state == current {
            return Transition::Unchanged;
        }

        if current == EncounterState::Done {
            tracing::warn!(
                boss = id.0,
                requested = %new_state,
                "rejecting state change away from done"
            );
            return Transition::Rejected(RejectReason::DoneIsTerminal);
        }

        if new_state == EncounterState::Done
            && let Some(creature) = self.alive_world_boss_minion(id)
        {
            tracing::warn!(
                boss = id.0,
                creature = creature.0,
                "rejecting done while world boss minion alive"
            );
            return Transition::Rejected(RejectReason::WorldBossMinionAlive(creature));
        }

        self.bosses[id.0 as usize].state = new_state;
        let mut signals = Vec::new();

        match new_state {
            EncounterState::InProgress => {
                signals.push(EncounterSignal::EncounterStarted { boss: id });
                if player_count > 0 {
                    signals.push(EncounterSignal::CombatResChargesStarted {
                        interval: COMBAT_RES_BUDGET / player_count,
                    });
                }
            }
            EncounterState::Done | EncounterState::Fail => {
                signals.push(EncounterSignal::CombatResChargesStopped);
                signals.push(EncounterSignal::EncounterEnded { boss: id, state: new_state });
                if new_state == EncounterState::Done {
                    self.mark_completed(id);
                    let bit = self.bosses[id.0 as usize].definition.bit;
                    signals.push(EncounterSignal::BossUpdate(BossStateUpdate {
                        boss: id,
                        state: new_state,
                        bit,
                        completed_mask: self.completed_mask,
                    }));
                }
            }
            _ => {}
        }

        // Door policy follows every transition.
        for binding in &self.bosses[id.0 as usize].definition.doors {
            signals.push(EncounterSignal::DoorUpdate {
                door: binding.door,
                open: door_open(binding.kind, new_state),
            });
        }

        Transition::Applied { signals }
    }

    fn mark_completed(&mut self, id: BossId) {
        if let Some(bit) = self.bosses[id.0 as usize].definition.bit {
            self.completed_mask |= 1 << bit;
        }
        if !self.completion_order.contains(&id) {
            self.completion_order.push(id);
        }
    }

    // ─── Entrance ────────────────────────────────────────────────────────────

    /// Entrance a (re-)entering player lands at, given a completed mask.
    ///
    /// Scoped-save models use the fixed default entrance. Otherwise the most
    /// recently completed encounter's declared entrance wins; when only a
    /// mask is known the highest mask bit with a declared entrance is used,
    /// then the unconditional default.
    pub fn effective_entrance(&self, completed_mask: u32) -> EntranceId {
        if self.scoped_save {
            return self.default_entrance;
        }

        for id in self.completion_order.iter().rev() {
            let def = &self.bosses[id.0 as usize].definition;
            if let Some(bit) = def.bit
                && completed_mask & (1 << bit) != 0
                && let Some(entrance) = def.entrance_for(self.difficulty)
            {
                return entrance;
            }
        }

        // Mask-only path: no recorded order, scan bits high to low.
        let mut best: Option<(u8, EntranceId)> = None;
        for record in &self.bosses {
            let def = &record.definition;
            if let Some(bit) = def.bit
                && completed_mask & (1 << bit) != 0
                && let Some(entrance) = def.entrance_for(self.difficulty)
                && best.is_none_or(|(b, _)| bit > b)
            {
                best = Some((bit, entrance));
            }
        }

        best.map(|(_, e)| e).unwrap_or(self.default_entrance)
    }
}
