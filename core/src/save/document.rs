//! In-memory form of the per-instance save document

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encounter::EncounterState;

/// A named numeric value carried alongside boss states.
///
/// Encounter scripts store small counters and flags here (e.g. an attempt
/// counter, a randomized layout seed). Integer and floating point values are
/// kept distinct so a script reading back an integer never sees rounding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalValue {
    Int(i64),
    Float(f64),
}

impl AdditionalValue {
    pub fn as_int(self) -> Option<i64> {
        match self {
            AdditionalValue::Int(v) => Some(v),
            AdditionalValue::Float(_) => None,
        }
    }

    pub fn as_float(self) -> Option<f64> {
        match self {
            AdditionalValue::Int(v) => Some(v as f64),
            AdditionalValue::Float(v) => Some(v),
        }
    }
}

/// Decoded save document for one instance.
///
/// `boss_states` is positional: index *i* is the state of the boss whose id
/// is *i* in the owning script's encounter list. The vector always has
/// exactly the codec's known boss count after a successful load; documents
/// written before a boss was added are padded with `NotStarted`.
#[derive(Debug, Clone, PartialEq)]
pub struct SaveDocument {
    pub header: String,
    pub boss_states: Vec<EncounterState>,
    pub additional: BTreeMap<String, AdditionalValue>,
}

impl SaveDocument {
    /// State of boss `index`, `NotStarted` when out of range.
    pub fn boss_state(&self, index: usize) -> EncounterState {
        self.boss_states.get(index).copied().unwrap_or(EncounterState::NotStarted)
    }

    pub fn additional_value(&self, key: &str) -> Option<AdditionalValue> {
        self.additional.get(key).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additional_value_kinds() {
        assert_eq!(AdditionalValue::Int(3).as_int(), Some(3));
        assert_eq!(AdditionalValue::Float(3.5).as_int(), None);
        assert_eq!(AdditionalValue::Int(2).as_float(), Some(2.0));
    }

    #[test]
    fn test_boss_state_out_of_range() {
        let doc = SaveDocument {
            header: "test".into(),
            boss_states: vec![EncounterState::Done],
            additional: BTreeMap::new(),
        };
        assert_eq!(doc.boss_state(0), EncounterState::Done);
        assert_eq!(doc.boss_state(5), EncounterState::NotStarted);
    }
}
