/// AND-first, OR-fallback-if-sparse matching
///
/// The strict pass keeps items whose text contains every keyword. When that
/// leaves fewer than `min_results` items, the fallback pass (any keyword) is
/// appended behind the strict hits. An item matching no keyword never appears.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Which pass admitted an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPass {
    Strict,
    Fallback,
}

impl MatchPass {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPass::Strict => "strict",
            MatchPass::Fallback => "fallback",
        }
    }
}

pub fn lowercase_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Keywords (already lower-cased) that occur in `text`.
pub fn matched_keywords<'k>(text: Option<&str>, keywords: &'k [String]) -> Vec<&'k str> {
    let Some(text) = text.map(str::to_lowercase) else {
        return Vec::new();
    };
    keywords
        .iter()
        .filter(|k| text.contains(k.as_str()))
        .map(String::as_str)
        .collect()
}

/// Items whose text contains every keyword.
pub fn strict_set<'a, T, F>(items: &'a [T], keywords: &[String], text_of: F) -> Vec<&'a T>
where
    F: Fn(&T) -> Option<&str>,
{
    let keywords = lowercase_keywords(keywords);
    if keywords.is_empty() {
        return Vec::new();
    }
    items
        .iter()
        .filter(|&item| matched_keywords(text_of(item), &keywords).len() == keywords.len())
        .collect()
}

/// Items whose text contains at least one keyword.
pub fn fallback_set<'a, T, F>(items: &'a [T], keywords: &[String], text_of: F) -> Vec<&'a T>
where
    F: Fn(&T) -> Option<&str>,
{
    let keywords = lowercase_keywords(keywords);
    items
        .iter()
        .filter(|&item| !matched_keywords(text_of(item), &keywords).is_empty())
        .collect()
}

/// Strict hits first, then fallback hits not already present.
pub fn ordered_union<'a, T>(strict: Vec<&'a T>, fallback: Vec<&'a T>) -> Vec<(&'a T, MatchPass)> {
    let mut seen: HashSet<*const T> = strict.iter().map(|item| *item as *const T).collect();
    let mut merged: Vec<(&'a T, MatchPass)> =
        strict.into_iter().map(|item| (item, MatchPass::Strict)).collect();
    for item in fallback {
        if seen.insert(item as *const T) {
            merged.push((item, MatchPass::Fallback));
        }
    }
    merged
}

/// Run the strict pass and widen to the fallback pass when it is too sparse.
pub fn widen<'a, T, F>(
    items: &'a [T],
    keywords: &[String],
    text_of: F,
    min_results: usize,
) -> Vec<(&'a T, MatchPass)>
where
    F: Fn(&T) -> Option<&str>,
{
    let strict = strict_set(items, keywords, &text_of);
    if strict.len() >= min_results {
        return ordered_union(strict, Vec::new());
    }
    let fallback = fallback_set(items, keywords, &text_of);
    tracing::debug!(
        strict = strict.len(),
        fallback = fallback.len(),
        min_results,
        "Strict pass too sparse, widening to any-keyword matches"
    );
    ordered_union(strict, fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts() -> Vec<Option<String>> {
        vec![
            Some("Green turtles graze the seagrass".to_string()),
            Some("Grey reef SHARKS patrol the drop-off".to_string()),
            Some("Turtles and sharks at the cleaning station".to_string()),
            Some("Nudibranchs and seahorses".to_string()),
            None,
        ]
    }

    fn keywords() -> Vec<String> {
        vec!["turtles".to_string(), "sharks".to_string()]
    }

    fn text_of(t: &Option<String>) -> Option<&str> {
        t.as_deref()
    }

    fn index_of(items: &[Option<String>], item: &Option<String>) -> usize {
        items.iter().position(|i| std::ptr::eq(i, item)).unwrap()
    }

    #[test]
    fn test_strict_requires_every_keyword() {
        let items = texts();
        let strict = strict_set(&items, &keywords(), text_of);
        assert_eq!(strict.len(), 1);
        assert_eq!(index_of(&items, strict[0]), 2);
    }

    #[test]
    fn test_widening_below_threshold() {
        let items = texts();
        let merged = widen(&items, &keywords(), text_of, 3);
        let order: Vec<(usize, MatchPass)> =
            merged.iter().map(|(item, pass)| (index_of(&items, item), *pass)).collect();
        assert_eq!(
            order,
            vec![(2, MatchPass::Strict), (0, MatchPass::Fallback), (1, MatchPass::Fallback)]
        );
    }

    #[test]
    fn test_no_widening_when_strict_is_enough() {
        let items = texts();
        let merged = widen(&items, &keywords(), text_of, 1);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].1, MatchPass::Strict);
    }

    #[test]
    fn test_fallback_is_superset_of_strict() {
        let items = texts();
        let keyword_sets = [
            keywords(),
            vec!["turtles".to_string()],
            vec!["seahorses".to_string(), "turtles".to_string()],
        ];
        for kws in keyword_sets {
            let strict = strict_set(&items, &kws, text_of);
            let fallback = fallback_set(&items, &kws, text_of);
            for s in &strict {
                assert!(fallback.iter().any(|f| std::ptr::eq(*f, *s)));
            }
        }
    }

    #[test]
    fn test_empty_keywords_match_nothing() {
        let items = texts();
        assert!(widen(&items, &[], text_of, 3).is_empty());
        assert!(widen(&items, &["  ".to_string()], text_of, 3).is_empty());
    }

    #[test]
    fn test_matched_keywords_case_insensitive() {
        let kws = vec!["sharks".to_string(), "rays".to_string()];
        assert_eq!(matched_keywords(Some("Grey reef SHARKS"), &kws), vec!["sharks"]);
        assert!(matched_keywords(None, &kws).is_empty());
    }
}
