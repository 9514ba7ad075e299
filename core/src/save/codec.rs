//! Save-document encoding, decoding, and partial updates

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{AdditionalValue, SaveDocument, SaveError};
use crate::encounter::EncounterState;

/// Expected numeric kind of a known additional-value key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Int,
    Float,
}

/// Wire shape of the document text.
#[derive(Debug, Serialize, Deserialize)]
struct RawDocument {
    #[serde(rename = "Header")]
    header: String,

    #[serde(rename = "BossStates")]
    boss_states: Vec<Value>,

    #[serde(rename = "AdditionalData", default, skip_serializing_if = "Option::is_none")]
    additional: Option<serde_json::Map<String, Value>>,
}

/// Codec for one encounter script's save documents.
///
/// Constructed with the script's identity string, its boss count, and the
/// additional-value keys it understands. Loading validates the header and
/// clamps transient boss states; serialization always emits the full known
/// boss array so a document round-trips positionally.
#[derive(Debug, Clone)]
pub struct SaveCodec {
    header: String,
    boss_count: usize,
    known_values: Vec<(String, ValueKind)>,
}

impl SaveCodec {
    pub fn new(header: impl Into<String>, boss_count: usize) -> Self {
        Self {
            header: header.into(),
            boss_count,
            known_values: Vec::new(),
        }
    }

    /// Register the additional-value keys this script reads back.
    pub fn with_values(mut self, known: &[(&str, ValueKind)]) -> Self {
        self.known_values = known.iter().map(|(k, kind)| (k.to_string(), *kind)).collect();
        self
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn boss_count(&self) -> usize {
        self.boss_count
    }

    // ─── Decoding ────────────────────────────────────────────────────────────

    /// Parse a save document.
    ///
    /// Structural failures reject the whole parse; schema drift does not:
    /// a shorter boss array is padded with `NotStarted`, unknown additional
    /// keys are dropped, and transient states (`InProgress`, `Fail`,
    /// `Special`) clamp down to `NotStarted` so an instance never resumes
    /// mid-combat.
    pub fn load(&self, text: &str) -> Result<SaveDocument, SaveError> {
        let raw: RawDocument = serde_json::from_str(text)?;

        if raw.header != self.header {
            return Err(SaveError::HeaderMismatch {
                expected: self.header.clone(),
                found: raw.header,
            });
        }

        if raw.boss_states.len() > self.boss_count {
            return Err(SaveError::BossCountExceeded {
                found: raw.boss_states.len(),
                known: self.boss_count,
            });
        }

        let mut boss_states = Vec::with_capacity(self.boss_count);
        for (index, entry) in raw.boss_states.iter().enumerate() {
            let value = entry.as_u64().ok_or(SaveError::NotNumeric { index })?;
            boss_states.push(EncounterState::from_save(value));
        }
        boss_states.resize(self.boss_count, EncounterState::NotStarted);

        let mut additional = BTreeMap::new();
        if let Some(map) = raw.additional {
            for (key, value) in map {
                let Some(kind) = self.known_value_kind(&key) else {
                    // Unknown key: written by a newer (or older) script
                    // revision. Dropped, not an error.
                    tracing::debug!(key, "ignoring unknown additional value in save document");
                    continue;
                };
                let parsed = match kind {
                    ValueKind::Int => value.as_i64().map(AdditionalValue::Int),
                    ValueKind::Float => value.as_f64().map(AdditionalValue::Float),
                };
                let Some(parsed) = parsed else {
                    return Err(SaveError::ValueTypeMismatch { key });
                };
                additional.insert(key, parsed);
            }
        }

        Ok(SaveDocument {
            header: raw.header,
            boss_states,
            additional,
        })
    }

    fn known_value_kind(&self, key: &str) -> Option<ValueKind> {
        self.known_values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, kind)| *kind)
    }

    /// A fresh all-`NotStarted` document with no additional values.
    pub fn skeleton(&self) -> SaveDocument {
        SaveDocument {
            header: self.header.clone(),
            boss_states: vec![EncounterState::NotStarted; self.boss_count],
            additional: BTreeMap::new(),
        }
    }

    /// Parse `text`, degrading to a skeleton when it does not parse.
    ///
    /// This is the write-path entry: an incremental update must never fail
    /// the caller because the previously stored text was bad.
    pub fn load_or_skeleton(&self, text: &str) -> SaveDocument {
        match self.load(text) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(header = %self.header, %err, "stored save document unreadable, starting fresh");
                self.skeleton()
            }
        }
    }

    // ─── Encoding ────────────────────────────────────────────────────────────

    /// Serialize a document.
    ///
    /// With `with_values = false` the current state is ignored and the
    /// header + all-`NotStarted` skeleton is written instead (the fallback
    /// used when a script cannot vouch for its own state).
    pub fn fill_data(&self, doc: &SaveDocument, with_values: bool) -> String {
        if with_values {
            self.serialize(doc)
        } else {
            self.serialize(&self.skeleton())
        }
    }

    fn serialize(&self, doc: &SaveDocument) -> String {
        let mut boss_states: Vec<Value> = doc
            .boss_states
            .iter()
            .take(self.boss_count)
            .map(|s| Value::from(s.to_save()))
            .collect();
        boss_states.resize(self.boss_count, Value::from(EncounterState::NotStarted.to_save()));

        let additional = if doc.additional.is_empty() {
            None
        } else {
            let mut map = serde_json::Map::new();
            for (key, value) in &doc.additional {
                let json = match value {
                    AdditionalValue::Int(v) => Value::from(*v),
                    AdditionalValue::Float(v) => Value::from(*v),
                };
                map.insert(key.clone(), json);
            }
            Some(map)
        };

        let raw = RawDocument {
            header: self.header.clone(),
            boss_states,
            additional,
        };

        // RawDocument contains only string/number JSON values; this cannot fail.
        serde_json::to_string(&raw).unwrap_or_default()
    }

    // ─── Incremental updates ─────────────────────────────────────────────────

    /// Re-serialize `old_text` with exactly one boss-state slot changed.
    pub fn apply_boss_state(&self, old_text: &str, boss_index: usize, state: EncounterState) -> String {
        let mut doc = self.load_or_skeleton(old_text);
        if boss_index < self.boss_count {
            doc.boss_states[boss_index] = state;
        } else {
            tracing::warn!(boss_index, known = self.boss_count, "boss state update out of range, ignored");
        }
        self.serialize(&doc)
    }

    /// Re-serialize `old_text` with exactly one named value changed.
    pub fn apply_additional(&self, old_text: &str, key: &str, value: AdditionalValue) -> String {
        let mut doc = self.load_or_skeleton(old_text);
        doc.additional.insert(key.to_string(), value);
        self.serialize(&doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codec() -> SaveCodec {
        SaveCodec::new("instance_blackrock_depths", 3)
            .with_values(&[("attempts", ValueKind::Int), ("ring_rotation", ValueKind::Float)])
    }

    #[test]
    fn test_round_trip() {
        let c = codec();
        let mut doc = c.skeleton();
        doc.boss_states[0] = EncounterState::Done;
        doc.additional.insert("attempts".into(), AdditionalValue::Int(4));
        doc.additional.insert("ring_rotation".into(), AdditionalValue::Float(1.5));

        let text = c.fill_data(&doc, true);
        let loaded = c.load(&text).expect("round trip");
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_skeleton_when_values_dropped() {
        let c = codec();
        let mut doc = c.skeleton();
        doc.boss_states[2] = EncounterState::Done;

        let text = c.fill_data(&doc, false);
        let loaded = c.load(&text).unwrap();
        assert!(loaded.boss_states.iter().all(|s| *s == EncounterState::NotStarted));
    }

    #[test]
    fn test_header_mismatch_rejected() {
        let c = codec();
        let text = r#"{"Header":"instance_gnomeregan","BossStates":[0,0,0]}"#;
        assert!(matches!(c.load(text), Err(SaveError::HeaderMismatch { .. })));
    }

    #[test]
    fn test_transient_states_clamp_on_load() {
        let c = codec();
        // Fail and Special clamp; Done survives.
        let text = r#"{"Header":"instance_blackrock_depths","BossStates":[2,4,3]}"#;
        let doc = c.load(text).unwrap();
        assert_eq!(doc.boss_states[0], EncounterState::NotStarted);
        assert_eq!(doc.boss_states[1], EncounterState::NotStarted);
        assert_eq!(doc.boss_states[2], EncounterState::Done);
    }

    #[test]
    fn test_longer_array_rejected() {
        let c = codec();
        let text = r#"{"Header":"instance_blackrock_depths","BossStates":[0,0,0,0]}"#;
        assert!(matches!(c.load(text), Err(SaveError::BossCountExceeded { found: 4, known: 3 })));
    }

    #[test]
    fn test_shorter_array_padded() {
        let c = codec();
        let text = r#"{"Header":"instance_blackrock_depths","BossStates":[3]}"#;
        let doc = c.load(text).unwrap();
        assert_eq!(doc.boss_states.len(), 3);
        assert_eq!(doc.boss_states[0], EncounterState::Done);
        assert_eq!(doc.boss_states[1], EncounterState::NotStarted);
    }

    #[test]
    fn test_non_numeric_entry_rejected() {
        let c = codec();
        let text = r#"{"Header":"instance_blackrock_depths","BossStates":[0,"done",0]}"#;
        assert!(matches!(c.load(text), Err(SaveError::NotNumeric { index: 1 })));
    }

    #[test]
    fn test_unknown_additional_key_ignored() {
        let c = codec();
        let text = r#"{"Header":"instance_blackrock_depths","BossStates":[0,0,0],"AdditionalData":{"future_key":9}}"#;
        let doc = c.load(text).unwrap();
        assert!(doc.additional.is_empty());
    }

    #[test]
    fn test_known_key_type_mismatch_rejected() {
        let c = codec();
        let text = r#"{"Header":"instance_blackrock_depths","BossStates":[0,0,0],"AdditionalData":{"attempts":"four"}}"#;
        assert!(matches!(c.load(text), Err(SaveError::ValueTypeMismatch { .. })));
    }

    #[test]
    fn test_apply_boss_state_touches_one_slot() {
        let c = codec();
        let mut doc = c.skeleton();
        doc.boss_states[0] = EncounterState::Done;
        doc.additional.insert("attempts".into(), AdditionalValue::Int(2));
        let text = c.fill_data(&doc, true);

        let updated = c.apply_boss_state(&text, 1, EncounterState::Done);
        let loaded = c.load(&updated).unwrap();
        assert_eq!(loaded.boss_states[0], EncounterState::Done);
        assert_eq!(loaded.boss_states[1], EncounterState::Done);
        assert_eq!(loaded.additional_value("attempts"), Some(AdditionalValue::Int(2)));
    }

    #[test]
    fn test_apply_falls_back_to_skeleton_on_garbage() {
        let c = codec();
        let updated = c.apply_boss_state("{not json", 2, EncounterState::Done);
        let loaded = c.load(&updated).unwrap();
        assert_eq!(loaded.boss_states[2], EncounterState::Done);
        assert_eq!(loaded.boss_states[0], EncounterState::NotStarted);
    }

    #[test]
    fn test_apply_additional() {
        let c = codec();
        let text = c.fill_data(&c.skeleton(), true);
        let updated = c.apply_additional(&text, "ring_rotation", AdditionalValue::Float(2.25));
        let loaded = c.load(&updated).unwrap();
        assert_eq!(loaded.additional_value("ring_rotation"), Some(AdditionalValue::Float(2.25)));
    }
}
