/// Phrase-aware fuzzy scoring for catalog names
///
/// A score is the stronger of two name signals plus capped context bonuses:
///   1. Phrase  : the whole query appears inside the name (always >= 0.9)
///   2. Overlap : share of query words found among the name's words
///   3. Context : geography, tags and description can lift weak name matches
///
/// All scoring functions are pure and every weight is a fixed constant.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

pub const PHRASE_BASE: f64 = 0.9;
pub const PHRASE_COVERAGE_WEIGHT: f64 = 0.1;
pub const WORD_OVERLAP_WEIGHT: f64 = 0.8;
/// Credit for a query word that only appears inside a longer name word
pub const PARTIAL_WORD_CREDIT: f64 = 0.5;
pub const GEO_BONUS: f64 = 0.15;
pub const TAG_BONUS: f64 = 0.10;
pub const DESCRIPTION_BONUS: f64 = 0.05;

const MIN_PARTIAL_WORD_LEN: usize = 3;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Human-readable band for a relevance score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    None,
    Fuzzy,
    Similar,
    PartialWords,
    ExactWords,
    ExactPhrase,
}

impl MatchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchType::ExactPhrase => "exact_phrase",
            MatchType::ExactWords => "exact_words",
            MatchType::PartialWords => "partial_words",
            MatchType::Similar => "similar",
            MatchType::Fuzzy => "fuzzy",
            MatchType::None => "none",
        }
    }
}

/// Optional context fields of the scored entity.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoreContext<'a> {
    pub country: Option<&'a str>,
    pub region: Option<&'a str>,
    pub city: Option<&'a str>,
    pub tags: &'a [String],
    pub description: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Pure scoring functions
// ---------------------------------------------------------------------------

/// Lower-case alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// True when `needle` appears in `haystack` as a run of whole words.
fn contains_words(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && format!(" {} ", haystack).contains(&format!(" {} ", needle))
}

/// Score for the full query occurring inside the name, or 0.0.
///
/// Both raw lower-cased text and punctuation-normalized text are tried so
/// "st. john's" and "St John's Reef" still count as a phrase hit.
pub fn phrase_score(query: &str, name: &str) -> f64 {
    let candidates = [
        (query.trim().to_lowercase(), name.trim().to_lowercase()),
        (tokenize(query).join(" "), tokenize(name).join(" ")),
    ];
    candidates
        .iter()
        .filter(|(q, n)| !q.is_empty() && !n.is_empty() && n.contains(q.as_str()))
        .map(|(q, n)| {
            let coverage = q.chars().count() as f64 / n.chars().count() as f64;
            PHRASE_BASE + PHRASE_COVERAGE_WEIGHT * coverage.min(1.0)
        })
        .fold(0.0, f64::max)
}

/// Share of query words present in the name, scaled to WORD_OVERLAP_WEIGHT.
pub fn word_overlap_score(query_tokens: &[String], name_tokens: &[String]) -> f64 {
    if query_tokens.is_empty() || name_tokens.is_empty() {
        return 0.0;
    }
    let credit: f64 = query_tokens
        .iter()
        .map(|q| {
            if name_tokens.iter().any(|n| n == q) {
                1.0
            } else if q.chars().count() >= MIN_PARTIAL_WORD_LEN
                && name_tokens.iter().any(|n| n.contains(q.as_str()))
            {
                PARTIAL_WORD_CREDIT
            } else {
                0.0
            }
        })
        .sum();
    WORD_OVERLAP_WEIGHT * credit / query_tokens.len() as f64
}

/// Sum of the context bonuses earned by this entity (uncapped).
pub fn context_bonus(query_tokens: &[String], ctx: &ScoreContext<'_>) -> f64 {
    let query_text = query_tokens.join(" ");
    let mut bonus = 0.0;

    let geo_hit = [ctx.country, ctx.region, ctx.city]
        .into_iter()
        .flatten()
        .any(|place| contains_words(&query_text, &tokenize(place).join(" ")));
    if geo_hit {
        bonus += GEO_BONUS;
    }

    let tag_hit = ctx
        .tags
        .iter()
        .any(|tag| contains_words(&query_text, &tokenize(tag).join(" ")));
    if tag_hit {
        bonus += TAG_BONUS;
    }

    if let Some(description) = ctx.description {
        let description = description.to_lowercase();
        let description_hit = query_tokens
            .iter()
            .filter(|q| q.chars().count() >= MIN_PARTIAL_WORD_LEN)
            .any(|q| description.contains(q.as_str()));
        if description_hit {
            bonus += DESCRIPTION_BONUS;
        }
    }

    bonus
}

/// Relevance of `target_name` (plus context) for `query`, in [0, 1].
pub fn score(query: &str, target_name: &str, ctx: &ScoreContext<'_>) -> f64 {
    let query_tokens = tokenize(query);
    if query_tokens.is_empty() {
        return 0.0;
    }
    let name_tokens = tokenize(target_name);

    let base = phrase_score(query, target_name)
        .max(word_overlap_score(&query_tokens, &name_tokens));

    (base + context_bonus(&query_tokens, ctx)).clamp(0.0, 1.0)
}

/// Threshold ladder, each band inclusive on its lower bound.
pub fn classify_match_type(score: f64) -> MatchType {
    match score {
        s if s >= 0.9 => MatchType::ExactPhrase,
        s if s >= 0.7 => MatchType::ExactWords,
        s if s >= 0.5 => MatchType::PartialWords,
        s if s >= 0.3 => MatchType::Similar,
        s if s > 0.0 => MatchType::Fuzzy,
        _ => MatchType::None,
    }
}

/// Distinct query tokens, handy for callers that test membership repeatedly.
pub fn token_set(text: &str) -> HashSet<String> {
    tokenize(text).into_iter().collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn bare() -> ScoreContext<'static> {
        ScoreContext::default()
    }

    #[test]
    fn test_exact_name_scores_one() {
        assert!((score("Blue Hole", "blue hole", &bare()) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_phrase_inside_name_at_least_point_nine() {
        for (query, name) in [
            ("blue hole", "The Blue Hole of Dahab"),
            ("reef", "Cirkewwa Reef and Tugboat Rozi wreck site"),
            ("St. John's", "St John's Reef"),
            ("HMS", "HMS Maori"),
        ] {
            let s = score(query, name, &bare());
            assert!(s >= 0.9, "{} in {} scored {}", query, name, s);
            assert_eq!(classify_match_type(s), MatchType::ExactPhrase);
        }
    }

    #[test]
    fn test_reordered_words_are_exact_words() {
        let s = score("hole blue", "Blue Hole", &bare());
        assert!((s - 0.8).abs() < 1e-10, "score was {}", s);
        assert_eq!(classify_match_type(s), MatchType::ExactWords);
    }

    #[test]
    fn test_partial_word_credit() {
        // "reef" only appears inside "reefs"; "garden" matches outright
        let s = score("reef garden", "Coral Reefs Garden", &bare());
        assert!((s - 0.6).abs() < 1e-10, "score was {}", s);
        assert_eq!(classify_match_type(s), MatchType::PartialWords);

        // short words earn no partial credit
        let s = score("re garden", "Coral Reefs Garden", &bare());
        assert!((s - 0.4).abs() < 1e-10, "score was {}", s);
        assert_eq!(classify_match_type(s), MatchType::Similar);
    }

    #[test]
    fn test_half_the_words_is_partial() {
        let s = score("blue lagoon", "Blue Hole", &bare());
        assert!((s - 0.4).abs() < 1e-10, "score was {}", s);
        let s = score("blue hole wall", "Blue Hole", &bare());
        assert!(s >= 0.5 && s < 0.7, "score was {}", s);
    }

    #[test]
    fn test_context_only_match_is_low_but_nonzero() {
        let tags = vec!["wreck".to_string()];
        let ctx = ScoreContext {
            country: Some("Malta"),
            tags: &tags,
            ..ScoreContext::default()
        };
        let s = score("malta", "Um El Faroud", &ctx);
        assert!((s - GEO_BONUS).abs() < 1e-10, "score was {}", s);
        assert_eq!(classify_match_type(s), MatchType::Fuzzy);

        let s = score("wreck malta", "Um El Faroud", &ctx);
        assert!((s - GEO_BONUS - TAG_BONUS).abs() < 1e-10, "score was {}", s);
    }

    #[test]
    fn test_multi_word_region_bonus() {
        let ctx = ScoreContext { region: Some("Red Sea"), ..ScoreContext::default() };
        let s = score("red sea sharks", "Elphinstone", &ctx);
        assert!((s - GEO_BONUS).abs() < 1e-10, "score was {}", s);
    }

    #[test]
    fn test_description_bonus() {
        let ctx = ScoreContext {
            description: Some("A collapsed cave with a natural arch"),
            ..ScoreContext::default()
        };
        let s = score("arch", "Dwejra", &ctx);
        assert!((s - DESCRIPTION_BONUS).abs() < 1e-10, "score was {}", s);
    }

    #[test]
    fn test_total_capped_at_one() {
        let tags = vec!["cave".to_string()];
        let ctx = ScoreContext {
            city: Some("Dahab"),
            tags: &tags,
            description: Some("dahab blue hole cave"),
            ..ScoreContext::default()
        };
        let s = score("dahab blue hole cave", "Dahab Blue Hole Cave", &ctx);
        assert_eq!(s, 1.0);
    }

    #[test]
    fn test_empty_query_scores_zero() {
        assert_eq!(score("", "Blue Hole", &bare()), 0.0);
        assert_eq!(score("  ,. ", "Blue Hole", &bare()), 0.0);
        assert_eq!(classify_match_type(0.0), MatchType::None);
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(classify_match_type(1.0), MatchType::ExactPhrase);
        assert_eq!(classify_match_type(0.9), MatchType::ExactPhrase);
        assert_eq!(classify_match_type(0.899), MatchType::ExactWords);
        assert_eq!(classify_match_type(0.7), MatchType::ExactWords);
        assert_eq!(classify_match_type(0.5), MatchType::PartialWords);
        assert_eq!(classify_match_type(0.3), MatchType::Similar);
        assert_eq!(classify_match_type(0.29), MatchType::Fuzzy);
        assert_eq!(classify_match_type(0.01), MatchType::Fuzzy);
    }

    #[test]
    fn test_classification_monotone() {
        let mut previous = MatchType::ExactPhrase;
        for step in (0..=100).rev() {
            let current = classify_match_type(step as f64 / 100.0);
            assert!(current <= previous, "{:?} after {:?} at {}", current, previous, step);
            previous = current;
        }
    }

    #[test]
    fn test_labels() {
        assert_eq!(MatchType::ExactPhrase.as_str(), "exact_phrase");
        assert_eq!(MatchType::PartialWords.as_str(), "partial_words");
        assert_eq!(serde_json::to_value(MatchType::ExactWords).unwrap(), "exact_words");
    }

    #[test]
    fn test_token_set() {
        let tokens = token_set("Full-Face Mask, mask");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.contains("full") && tokens.contains("face") && tokens.contains("mask"));
    }
}
