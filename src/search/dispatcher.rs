/// Routes a structured intent to its strategy.
///
/// The dispatcher owns no data: every call reads the catalog snapshot it is
/// handed, so one dispatcher can serve concurrent requests.

use std::time::Instant;

use crate::catalog::{Catalog, User};
use crate::config::SearchConfig;
use crate::intent::{Query, SearchIntent};

use super::strategies;
use super::SearchResult;

#[derive(Debug, Clone, Default)]
pub struct SearchDispatcher {
    config: SearchConfig,
}

impl SearchDispatcher {
    pub fn new(config: SearchConfig) -> Self {
        SearchDispatcher { config }
    }

    /// Run the strategy matching `intent` and return at most `max_results` hits.
    ///
    /// Unknown intent types produce an empty list rather than an error.
    pub fn execute(
        &self,
        intent: &SearchIntent,
        current_user: Option<&User>,
        catalog: &Catalog,
    ) -> Vec<SearchResult> {
        let started = Instant::now();
        let query = Query::from(intent);

        let mut results = match &query {
            Query::Discovery { phrase, location } => {
                strategies::discovery(catalog, &self.config, phrase, location.as_deref())
            }
            Query::MarineLife { keywords } => {
                strategies::marine_life(catalog, &self.config, keywords)
            }
            Query::GearRental { keywords, location } => {
                strategies::gear_rental(catalog, keywords, location.as_deref())
            }
            Query::Comparison { fragments } => strategies::comparison(catalog, fragments),
            Query::CareerPath { keywords } => strategies::career_path(catalog, keywords),
            Query::PersonalRecommendation { origin, max_difficulty } => {
                strategies::personal_recommendation(catalog, current_user, *origin, *max_difficulty)
            }
            Query::Unsupported => {
                tracing::info!(
                    intent_type = ?intent.intent_type,
                    "Unsupported intent type, returning no results"
                );
                Vec::new()
            }
        };

        let found = results.len();
        results.truncate(self.config.max_results);

        tracing::debug!(
            intent_type = ?intent.intent_type,
            user_id = ?current_user.map(|u| u.id),
            found,
            returned = results.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Search executed"
        );

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DiveSite, Organization};
    use crate::intent::IntentType;
    use crate::search::EntityType;

    fn site(id: i64, name: &str, marine_life: &str) -> DiveSite {
        DiveSite {
            id,
            name: name.to_string(),
            difficulty: 1,
            access_instructions: Some("Shore entry".to_string()),
            latitude: None,
            longitude: None,
            marine_life: Some(marine_life.to_string()),
            tags: Vec::new(),
            description: None,
            country: Some("Malta".to_string()),
            region: None,
            city: None,
        }
    }

    fn catalog() -> Catalog {
        Catalog {
            organizations: vec![Organization {
                id: 1,
                name: "Professional Association of Diving Instructors".into(),
                acronym: "PADI".into(),
            }],
            dive_sites: vec![
                site(1, "Reef One", "Turtles"),
                site(2, "Reef Two", "Sharks"),
                site(3, "Reef Three", "Turtles and sharks"),
                site(4, "Reef Four", "Octopus"),
            ],
            ..Catalog::default()
        }
    }

    #[test]
    fn test_marine_life_intent_routes_to_widening() {
        let dispatcher = SearchDispatcher::default();
        let intent = SearchIntent::new(IntentType::MarineLife, &["turtles", "sharks"]);
        let ids: Vec<Option<i64>> = dispatcher
            .execute(&intent, None, &catalog())
            .iter()
            .map(|r| r.source_id)
            .collect();
        assert_eq!(ids, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn test_results_truncated_to_max_results() {
        let dispatcher = SearchDispatcher::new(SearchConfig {
            max_results: 2,
            ..SearchConfig::default()
        });
        let intent = SearchIntent::new(IntentType::Discovery, &["reef"]);
        let results = dispatcher.execute(&intent, None, &catalog());
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.entity_type == EntityType::DiveSite));
    }

    #[test]
    fn test_unknown_intent_is_empty() {
        let intent: SearchIntent = serde_json::from_str(
            r#"{"intent_type": "weather_forecast", "keywords": ["wind"]}"#,
        )
        .unwrap();
        assert!(SearchDispatcher::default().execute(&intent, None, &catalog()).is_empty());
    }

    #[test]
    fn test_career_path_without_levels_still_resolves() {
        let intent = SearchIntent::new(IntentType::CareerPath, &["padi"]);
        let results = SearchDispatcher::default().execute(&intent, None, &catalog());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "Professional Association of Diving Instructors");
        assert_eq!(results[0].metadata["courses"], serde_json::json!([]));
    }

    #[test]
    fn test_personal_recommendation_without_user() {
        let intent = SearchIntent::new(IntentType::PersonalRecommendation, &[]);
        let results = SearchDispatcher::default().execute(&intent, None, &catalog());
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.metadata["distance_km"].is_null()));
    }
}
