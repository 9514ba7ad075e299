//! Reset event kinds and identity

use chrono::Duration;
use serde::{Deserialize, Serialize};
use wardstone_types::{InstanceId, MapDifficultyKey};

/// What a queued reset event does when it fires.
///
/// The three warn stages and the terminal reset form a fixed sequence with
/// lead times of 1 hour, 15 minutes, 5 minutes, and 1 minute before the
/// stored reset instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetEventKind {
    /// One-shot expiry of a single concrete instance copy.
    InstanceExpiry,
    WarnStageOne,
    WarnStageTwo,
    WarnStageThree,
    /// Terminal stage: performs the global reset and re-arms the sequence.
    GlobalReset,
}

impl ResetEventKind {
    /// Seconds before the stored reset instant this stage fires at.
    pub fn lead_secs(self) -> i64 {
        match self {
            ResetEventKind::InstanceExpiry => 0,
            ResetEventKind::WarnStageOne => 3600,
            ResetEventKind::WarnStageTwo => 900,
            ResetEventKind::WarnStageThree => 300,
            ResetEventKind::GlobalReset => 60,
        }
    }

    pub fn lead(self) -> Duration {
        Duration::seconds(self.lead_secs())
    }

    /// The stage scheduled after this one fires, if any.
    pub fn next_stage(self) -> Option<ResetEventKind> {
        match self {
            ResetEventKind::InstanceExpiry => None,
            ResetEventKind::WarnStageOne => Some(ResetEventKind::WarnStageTwo),
            ResetEventKind::WarnStageTwo => Some(ResetEventKind::WarnStageThree),
            ResetEventKind::WarnStageThree => Some(ResetEventKind::GlobalReset),
            ResetEventKind::GlobalReset => None,
        }
    }
}

/// A queued reset event.
///
/// Identity is full field equality; cancellation matches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResetEvent {
    pub kind: ResetEventKind,
    pub key: MapDifficultyKey,

    /// Concrete instance for `InstanceExpiry`; `UNBOUND` for global stages.
    pub instance: InstanceId,
}

impl ResetEvent {
    pub fn expiry(key: MapDifficultyKey, instance: InstanceId) -> Self {
        Self { kind: ResetEventKind::InstanceExpiry, key, instance }
    }

    pub fn global(kind: ResetEventKind, key: MapDifficultyKey) -> Self {
        Self { kind, key, instance: InstanceId::UNBOUND }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_chain() {
        let mut kind = ResetEventKind::WarnStageOne;
        let mut leads = vec![kind.lead_secs()];
        while let Some(next) = kind.next_stage() {
            leads.push(next.lead_secs());
            kind = next;
        }
        assert_eq!(leads, vec![3600, 900, 300, 60]);
        assert_eq!(kind, ResetEventKind::GlobalReset);
    }
}
