//! Item record model.
//!
//! # Responsibility
//! - Define the structured record returned by the external item source.
//! - Provide validation used before a record enters the cache.
//!
//! # Invariants
//! - `id` is positive.
//! - `level` is non-negative; the resolver's sentinel never appears here.
//! - An item never lists itself as a component.

use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Opaque external item identifier.
pub type SubjectId = i64;

/// Structured reference record for a kanji, word or component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: SubjectId,
    /// Kind label reported by the source (`kanji`, `radical`, `vocabulary`...).
    #[serde(default = "default_object")]
    pub object: String,
    /// Components may be image-only and carry no characters.
    #[serde(default)]
    pub characters: Option<String>,
    #[serde(default, deserialize_with = "labels")]
    pub meanings: Vec<String>,
    #[serde(default, deserialize_with = "labels")]
    pub readings: Vec<String>,
    /// Hierarchy level used as the difficulty level.
    pub level: i32,
    /// Ordered ids of the items this one is built from.
    #[serde(default, alias = "component_subject_ids")]
    pub component_ids: Vec<SubjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning_mnemonic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning_hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_mnemonic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reading_hint: Option<String>,
}

fn default_object() -> String {
    "item".to_string()
}

/// Accepts `["One"]` as well as `[{"meaning": "One"}]` / `[{"reading": "いち"}]`.
fn labels<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Label {
        Plain(String),
        Meaning { meaning: String },
        Reading { reading: String },
    }

    let raw = Vec::<Label>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|label| match label {
            Label::Plain(value) | Label::Meaning { meaning: value } => value,
            Label::Reading { reading } => reading,
        })
        .collect())
}

/// Validation error for item records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemValidationError {
    NonPositiveId(SubjectId),
    NegativeLevel { id: SubjectId, level: i32 },
    SelfComponent(SubjectId),
}

impl Display for ItemValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonPositiveId(id) => write!(f, "item id must be positive, got {id}"),
            Self::NegativeLevel { id, level } => {
                write!(f, "item {id} has negative level {level}")
            }
            Self::SelfComponent(id) => write!(f, "item {id} lists itself as a component"),
        }
    }
}

impl Error for ItemValidationError {}

impl ItemRecord {
    /// Creates a record with no meanings, readings or components.
    pub fn new(id: SubjectId, object: impl Into<String>, level: i32) -> Self {
        Self {
            id,
            object: object.into(),
            characters: None,
            meanings: Vec::new(),
            readings: Vec::new(),
            level,
            component_ids: Vec::new(),
            meaning_mnemonic: None,
            meaning_hint: None,
            reading_mnemonic: None,
            reading_hint: None,
        }
    }

    pub fn with_characters(mut self, characters: impl Into<String>) -> Self {
        self.characters = Some(characters.into());
        self
    }

    pub fn with_components(mut self, component_ids: impl IntoIterator<Item = SubjectId>) -> Self {
        self.component_ids = component_ids.into_iter().collect();
        self
    }

    /// Validates record invariants.
    pub fn validate(&self) -> Result<(), ItemValidationError> {
        if self.id <= 0 {
            return Err(ItemValidationError::NonPositiveId(self.id));
        }
        if self.level < 0 {
            return Err(ItemValidationError::NegativeLevel {
                id: self.id,
                level: self.level,
            });
        }
        if self.component_ids.contains(&self.id) {
            return Err(ItemValidationError::SelfComponent(self.id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ItemRecord, ItemValidationError};

    #[test]
    fn deserializes_plain_and_labelled_lists() {
        let record: ItemRecord = serde_json::from_value(serde_json::json!({
            "id": 440,
            "object": "kanji",
            "characters": "一",
            "meanings": [{"meaning": "One"}],
            "readings": ["いち", {"reading": "ひと"}],
            "level": 1,
            "component_subject_ids": [1]
        }))
        .unwrap();

        assert_eq!(record.meanings, vec!["One"]);
        assert_eq!(record.readings, vec!["いち", "ひと"]);
        assert_eq!(record.component_ids, vec![1]);
        assert_eq!(record.meaning_mnemonic, None);
    }

    #[test]
    fn validate_rejects_self_reference_and_bad_values() {
        let record = ItemRecord::new(5, "kanji", 3).with_components([5]);
        assert_eq!(
            record.validate().unwrap_err(),
            ItemValidationError::SelfComponent(5)
        );
        assert_eq!(
            ItemRecord::new(0, "kanji", 1).validate().unwrap_err(),
            ItemValidationError::NonPositiveId(0)
        );
        assert_eq!(
            ItemRecord::new(9, "kanji", -1).validate().unwrap_err(),
            ItemValidationError::NegativeLevel { id: 9, level: -1 }
        );
    }
}
