/// Structured search intents and their conversion into strategy queries
///
/// A `SearchIntent` is what the upstream language-model step produces from a
/// free-form diving question. It is a flat record on the wire; before dispatch
/// it is folded into `Query`, a closed enum with one variant per strategy and
/// only the payload that strategy reads.

use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::personalization::GeoPoint;

/// Closed set of intent labels understood by the dispatcher.
///
/// Any other label deserializes to `Unknown` and yields an empty result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntentType {
    Discovery,
    MarineLife,
    GearRental,
    Comparison,
    CareerPath,
    PersonalRecommendation,
    #[serde(other)]
    Unknown,
}

/// Inclusive date window mentioned in the question ("next week", "in March").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// The structured representation of a user's question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SearchIntent {
    pub intent_type: IntentType,
    /// Extracted keywords, in the order they appeared in the question
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Free-text place name: country, region or city
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub date_range: Option<DateRange>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Difficulty ceiling requested explicitly by the user (site difficulty scale)
    #[serde(default)]
    pub difficulty_level: Option<u8>,
    /// Entity the conversation is currently about, if any
    #[serde(default)]
    pub context_entity_id: Option<i64>,
    #[serde(default)]
    pub context_entity_type: Option<String>,
}

impl SearchIntent {
    /// Minimal intent with only a type and keywords, everything else absent.
    pub fn new(intent_type: IntentType, keywords: &[&str]) -> Self {
        SearchIntent {
            intent_type,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            location: None,
            date: None,
            date_range: None,
            latitude: None,
            longitude: None,
            difficulty_level: None,
            context_entity_id: None,
            context_entity_type: None,
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_origin(mut self, latitude: f64, longitude: f64) -> Self {
        self.latitude = Some(latitude);
        self.longitude = Some(longitude);
        self
    }

    /// Keywords with surrounding whitespace removed and blanks dropped.
    pub fn clean_keywords(&self) -> Vec<String> {
        self.keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Blank locations count as absent.
    pub fn clean_location(&self) -> Option<String> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
    }

    /// Geographic origin, only when both coordinates are present and valid.
    pub fn origin(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
            _ => None,
        }
    }
}

/// Strategy-specific query derived from a `SearchIntent`.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Discovery {
        phrase: String,
        location: Option<String>,
    },
    MarineLife {
        keywords: Vec<String>,
    },
    GearRental {
        keywords: Vec<String>,
        location: Option<String>,
    },
    Comparison {
        fragments: Vec<String>,
    },
    CareerPath {
        keywords: Vec<String>,
    },
    PersonalRecommendation {
        origin: Option<GeoPoint>,
        max_difficulty: Option<u8>,
    },
    Unsupported,
}

impl From<&SearchIntent> for Query {
    fn from(intent: &SearchIntent) -> Self {
        let keywords = intent.clean_keywords();
        match intent.intent_type {
            IntentType::Discovery => Query::Discovery {
                phrase: keywords.join(" "),
                location: intent.clean_location(),
            },
            IntentType::MarineLife => Query::MarineLife { keywords },
            IntentType::GearRental => Query::GearRental {
                keywords,
                location: intent.clean_location(),
            },
            IntentType::Comparison => Query::Comparison {
                fragments: keywords,
            },
            IntentType::CareerPath => Query::CareerPath { keywords },
            IntentType::PersonalRecommendation => Query::PersonalRecommendation {
                origin: intent.origin(),
                max_difficulty: intent.difficulty_level,
            },
            IntentType::Unknown => Query::Unsupported,
        }
    }
}

/// JSON schema for `SearchIntent`.
///
/// Handed to the intent-extraction model as its structured-output schema.
pub fn intent_schema() -> serde_json::Value {
    schemars::schema_for!(SearchIntent).to_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_intent_label_deserializes() {
        let intent: SearchIntent =
            serde_json::from_str(r#"{"intent_type": "weather_forecast", "keywords": ["wind"]}"#)
                .unwrap();
        assert_eq!(intent.intent_type, IntentType::Unknown);
        assert_eq!(Query::from(&intent), Query::Unsupported);
    }

    #[test]
    fn test_explicit_nulls_accepted() {
        let intent: SearchIntent = serde_json::from_str(
            r#"{"intent_type": "gear_rental", "keywords": ["fins"], "location": null,
                "date": null, "date_range": null, "latitude": null, "longitude": null,
                "difficulty_level": null, "context_entity_id": null, "context_entity_type": null}"#,
        )
        .unwrap();
        assert_eq!(
            Query::from(&intent),
            Query::GearRental { keywords: vec!["fins".to_string()], location: None }
        );
    }

    #[test]
    fn test_discovery_joins_keywords_into_phrase() {
        let intent = SearchIntent::new(IntentType::Discovery, &[" blue ", "", "hole"])
            .with_location("  ");
        assert_eq!(
            Query::from(&intent),
            Query::Discovery { phrase: "blue hole".to_string(), location: None }
        );
    }

    #[test]
    fn test_origin_requires_both_coordinates() {
        let mut intent = SearchIntent::new(IntentType::PersonalRecommendation, &[]);
        intent.latitude = Some(35.9);
        assert!(intent.origin().is_none());

        let intent = intent.with_origin(35.9, 14.4);
        assert!(intent.origin().is_some());
    }

    #[test]
    fn test_out_of_range_origin_is_dropped() {
        let intent = SearchIntent::new(IntentType::PersonalRecommendation, &[])
            .with_origin(123.0, 14.4);
        assert!(intent.origin().is_none());
    }

    #[test]
    fn test_date_range_parses() {
        let intent: SearchIntent = serde_json::from_str(
            r#"{
                "intent_type": "discovery",
                "date_range": {"start": "2026-05-01", "end": "2026-05-07"}
            }"#,
        )
        .unwrap();
        let range = intent.date_range.unwrap();
        assert_eq!(range.start, NaiveDate::from_ymd_opt(2026, 5, 1).unwrap());
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2026, 5, 7).unwrap());
    }

    #[test]
    fn test_schema_lists_intent_types() {
        let schema = intent_schema().to_string();
        assert!(schema.contains("marine_life"));
        assert!(schema.contains("personal_recommendation"));
        assert!(schema.contains("keywords"));
    }
}
