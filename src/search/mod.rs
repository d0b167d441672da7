pub mod dispatcher;
pub mod scoring;
pub mod strategies;
pub mod widening;

// Re-export key types for convenience
pub use dispatcher::SearchDispatcher;
pub use scoring::{classify_match_type, score, MatchType, ScoreContext};
pub use widening::MatchPass;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Discriminator shared by every strategy's results so callers can merge them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    DiveSite,
    DivingCenter,
    GearRental,
    CertificationLevel,
    CareerPath,
}

/// One ranked answer handed back to the response layer.
///
/// `metadata` keys are fixed per strategy; see the strategy functions for the
/// exact set. A `BTreeMap` keeps serialized output stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub entity_type: EntityType,
    pub name: String,
    /// Relevance in [0, 1] for scored strategies; None where order alone carries rank
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Id of the catalog row this result was built from
    pub source_id: Option<i64>,
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl SearchResult {
    pub fn new(entity_type: EntityType, name: impl Into<String>, source_id: Option<i64>) -> Self {
        SearchResult {
            entity_type,
            name: name.into(),
            score: None,
            source_id,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}
