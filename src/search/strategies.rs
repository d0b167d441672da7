/// Search strategies, one per intent type
///
/// Each strategy reads only the request's catalog snapshot and returns results
/// already in final order. Metadata keys per strategy:
///   discovery      : match_type, country, region, city (+ difficulty for sites)
///   marine life    : marine_life, match_pass, matched_keywords
///   gear rental    : item_name, cost, currency, center_id, center_name, city, region
///   comparison     : organization, category, max_depth, gases, tanks
///   career path    : organization, courses, details
///   recommendation : difficulty, country, region, city, distance_km

use std::cmp::Ordering;
use std::collections::HashSet;

use serde_json::json;

use crate::catalog::{
    Catalog, CertificationLevel, DiveSite, DivingCenter, GearRentalCost, Organization, User,
};
use crate::certification::ordering::{compare_levels, curriculum};
use crate::config::SearchConfig;
use crate::personalization::{filter_candidates, GeoPoint, UserContext};
use super::scoring::{classify_match_type, score, token_set, tokenize, ScoreContext};
use super::widening::{lowercase_keywords, matched_keywords, widen};
use super::{EntityType, SearchResult};

/// Words an extraction model tends to leave in comparison keywords.
const COMPARISON_FILLER: &[&str] = &[
    "vs", "versus", "and", "or", "compare", "comparison", "difference", "between",
];

const MIN_FRAGMENT_LEN: usize = 2;

fn location_matches(location: &str, fields: &[Option<&str>]) -> bool {
    let needle = location.to_lowercase();
    fields
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn by_score_desc(a: &SearchResult, b: &SearchResult) -> Ordering {
    b.score
        .unwrap_or(0.0)
        .total_cmp(&a.score.unwrap_or(0.0))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.entity_type.cmp(&b.entity_type))
        .then_with(|| a.source_id.cmp(&b.source_id))
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

fn discovery_hit(entity_type: EntityType, name: &str, id: i64, score: Option<f64>) -> SearchResult {
    let hit = SearchResult::new(entity_type, name, Some(id))
        .with_meta("match_type", classify_match_type(score.unwrap_or(0.0)).as_str());
    match score {
        Some(s) => hit.with_score(s),
        None => hit,
    }
}

fn site_hit(site: &DiveSite, score: Option<f64>) -> SearchResult {
    discovery_hit(EntityType::DiveSite, &site.name, site.id, score)
        .with_meta("country", site.country.clone())
        .with_meta("region", site.region.clone())
        .with_meta("city", site.city.clone())
        .with_meta("difficulty", site.difficulty)
}

fn center_hit(center: &DivingCenter, score: Option<f64>) -> SearchResult {
    discovery_hit(EntityType::DivingCenter, &center.name, center.id, score)
        .with_meta("country", center.country.clone())
        .with_meta("region", center.region.clone())
        .with_meta("city", center.city.clone())
}

fn site_places(site: &DiveSite) -> [Option<&str>; 3] {
    [site.country.as_deref(), site.region.as_deref(), site.city.as_deref()]
}

fn center_places(center: &DivingCenter) -> [Option<&str>; 3] {
    [center.country.as_deref(), center.region.as_deref(), center.city.as_deref()]
}

/// Every site and center in the location, unscored, by name.
fn discovery_by_location(catalog: &Catalog, location: &str) -> Vec<SearchResult> {
    let sites = catalog
        .dive_sites
        .iter()
        .filter(|site| location_matches(location, &site_places(site)))
        .map(|site| site_hit(site, None));
    let centers = catalog
        .diving_centers
        .iter()
        .filter(|center| location_matches(location, &center_places(center)))
        .map(|center| center_hit(center, None));

    let mut results: Vec<SearchResult> = sites.chain(centers).collect();
    results.sort_by(by_score_desc);
    results
}

/// Score every site and center against the phrase, best first.
///
/// A blank phrase with a location lists everything in that location.
pub fn discovery(
    catalog: &Catalog,
    config: &SearchConfig,
    phrase: &str,
    location: Option<&str>,
) -> Vec<SearchResult> {
    if phrase.trim().is_empty() {
        return match location {
            Some(loc) => discovery_by_location(catalog, loc),
            None => Vec::new(),
        };
    }

    let admit = |s: f64| s > 0.0 && s >= config.min_score;
    let mut results = Vec::new();

    for site in &catalog.dive_sites {
        if location.is_some_and(|loc| !location_matches(loc, &site_places(site))) {
            continue;
        }
        let ctx = ScoreContext {
            country: site.country.as_deref(),
            region: site.region.as_deref(),
            city: site.city.as_deref(),
            tags: &site.tags,
            description: site.description.as_deref(),
        };
        let s = score(phrase, &site.name, &ctx);
        if admit(s) {
            results.push(site_hit(site, Some(s)));
        }
    }

    for center in &catalog.diving_centers {
        if location.is_some_and(|loc| !location_matches(loc, &center_places(center))) {
            continue;
        }
        let ctx = ScoreContext {
            country: center.country.as_deref(),
            region: center.region.as_deref(),
            city: center.city.as_deref(),
            ..ScoreContext::default()
        };
        let s = score(phrase, &center.name, &ctx);
        if admit(s) {
            results.push(center_hit(center, Some(s)));
        }
    }

    results.sort_by(by_score_desc);
    results
}

// ---------------------------------------------------------------------------
// Marine life
// ---------------------------------------------------------------------------

fn marine_life_text(site: &DiveSite) -> Option<&str> {
    site.marine_life.as_deref()
}

/// Sites whose marine-life notes mention the requested species.
pub fn marine_life(
    catalog: &Catalog,
    config: &SearchConfig,
    keywords: &[String],
) -> Vec<SearchResult> {
    let keywords = lowercase_keywords(keywords);

    widen(&catalog.dive_sites, &keywords, marine_life_text, config.marine_life_min_results)
        .into_iter()
        .map(|(site, pass)| {
            let matched: Vec<String> = matched_keywords(marine_life_text(site), &keywords)
                .into_iter()
                .map(str::to_string)
                .collect();
            let coverage = matched.len() as f64 / keywords.len() as f64;
            SearchResult::new(EntityType::DiveSite, &site.name, Some(site.id))
                .with_score(coverage)
                .with_meta("marine_life", site.marine_life.clone())
                .with_meta("match_pass", pass.as_str())
                .with_meta("matched_keywords", matched)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Gear rental
// ---------------------------------------------------------------------------

fn gear_hit(row: &GearRentalCost, center: Option<&DivingCenter>) -> SearchResult {
    SearchResult::new(EntityType::GearRental, &row.item_name, Some(row.id))
        .with_meta("item_name", row.item_name.clone())
        .with_meta("cost", row.cost.to_string())
        .with_meta("currency", row.currency.clone())
        .with_meta("center_id", center.map(|c| c.id))
        .with_meta("center_name", center.map(|c| c.name.clone()))
        .with_meta("city", center.and_then(|c| c.city.clone()))
        .with_meta("region", center.and_then(|c| c.region.clone()))
}

/// Rental prices for the requested items, cheapest first.
pub fn gear_rental(
    catalog: &Catalog,
    keywords: &[String],
    location: Option<&str>,
) -> Vec<SearchResult> {
    let wanted: HashSet<String> = keywords.iter().flat_map(|k| tokenize(k)).collect();
    if wanted.is_empty() {
        return Vec::new();
    }

    let mut rows: Vec<(&GearRentalCost, Option<&DivingCenter>)> = catalog
        .gear_rental_costs
        .iter()
        .filter(|row| !token_set(&row.item_name).is_disjoint(&wanted))
        .map(|row| (row, catalog.center(row.diving_center_id)))
        .filter(|(_, center)| match location {
            None => true,
            Some(loc) => center.is_some_and(|c| {
                location_matches(loc, &[c.city.as_deref(), c.region.as_deref()])
            }),
        })
        .collect();

    rows.sort_by(|(a, _), (b, _)| {
        a.cost
            .cmp(&b.cost)
            .then_with(|| a.item_name.cmp(&b.item_name))
            .then_with(|| a.id.cmp(&b.id))
    });

    rows.into_iter().map(|(row, center)| gear_hit(row, center)).collect()
}

// ---------------------------------------------------------------------------
// Certification comparison and career path
// ---------------------------------------------------------------------------

/// Levels whose name contains any fragment, grouped by organization.
pub fn comparison(catalog: &Catalog, fragments: &[String]) -> Vec<SearchResult> {
    let fragments: Vec<String> = lowercase_keywords(fragments)
        .into_iter()
        .filter(|f| {
            f.chars().count() >= MIN_FRAGMENT_LEN && !COMPARISON_FILLER.contains(&f.as_str())
        })
        .collect();
    if fragments.is_empty() {
        return Vec::new();
    }

    let acronym_of = |level: &CertificationLevel| {
        catalog
            .organization(level.organization_id)
            .map(|o| o.acronym.clone())
    };

    let mut levels: Vec<&CertificationLevel> = catalog
        .certification_levels
        .iter()
        .filter(|level| {
            let name = level.name.to_lowercase();
            fragments.iter().any(|f| name.contains(f.as_str()))
        })
        .collect();

    levels.sort_by(|a, b| acronym_of(*a).cmp(&acronym_of(*b)).then_with(|| compare_levels(a, b)));

    levels
        .into_iter()
        .map(|level| {
            SearchResult::new(EntityType::CertificationLevel, &level.name, Some(level.id))
                .with_meta("organization", acronym_of(level))
                .with_meta("category", level.category.clone())
                .with_meta("max_depth", level.max_depth.clone())
                .with_meta("gases", level.gases.clone())
                .with_meta("tanks", level.tanks.clone())
        })
        .collect()
}

/// First organization a keyword refers to.
///
/// An exact acronym anywhere in the keywords wins over a name match, so
/// ["scuba", "PADI"] resolves to PADI rather than a school with "Scuba" in
/// its name. Single words inside a keyword ("PADI courses") match only by
/// acronym.
fn resolve_organization<'a>(
    catalog: &'a Catalog,
    keywords: &[String],
) -> Option<&'a Organization> {
    let by_acronym = |reference: &str| {
        catalog
            .organizations
            .iter()
            .find(|o| o.acronym.eq_ignore_ascii_case(reference.trim()))
    };

    keywords
        .iter()
        .find_map(|k| by_acronym(k))
        .or_else(|| {
            keywords
                .iter()
                .flat_map(|k| k.split_whitespace())
                .find_map(by_acronym)
        })
        .or_else(|| keywords.iter().find_map(|k| catalog.find_organization(k)))
}

/// The ordered curriculum of the organization named in the keywords.
pub fn career_path(catalog: &Catalog, keywords: &[String]) -> Vec<SearchResult> {
    let Some(organization) = resolve_organization(catalog, keywords) else {
        tracing::debug!(?keywords, "No organization matched career path keywords");
        return Vec::new();
    };

    let plan = curriculum(organization, catalog.levels_of(organization.id));
    let details: Vec<serde_json::Value> = plan
        .details
        .iter()
        .map(|d| json!({ "name": d.name, "max_depth": d.max_depth, "category": d.category }))
        .collect();

    vec![
        SearchResult::new(EntityType::CareerPath, &organization.name, Some(organization.id))
            .with_meta(
                "organization",
                json!({
                    "id": organization.id,
                    "name": organization.name,
                    "acronym": organization.acronym,
                }),
            )
            .with_meta("courses", plan.courses)
            .with_meta("details", details),
    ]
}

// ---------------------------------------------------------------------------
// Personal recommendation
// ---------------------------------------------------------------------------

fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Unvisited, shore-accessible sites within the user's level, nearest first.
pub fn personal_recommendation(
    catalog: &Catalog,
    user: Option<&User>,
    origin: Option<GeoPoint>,
    max_difficulty: Option<u8>,
) -> Vec<SearchResult> {
    let ctx = match user {
        Some(user) => UserContext::resolve(user.id, catalog),
        None => {
            tracing::debug!("No current user, recommending at entry level without visit history");
            UserContext::anonymous()
        }
    }
    .capped_at(max_difficulty);

    filter_candidates(&catalog.dive_sites, &ctx, origin)
        .into_iter()
        .map(|ranked| {
            let site = ranked.site;
            SearchResult::new(EntityType::DiveSite, &site.name, Some(site.id))
                .with_meta("difficulty", site.difficulty)
                .with_meta("country", site.country.clone())
                .with_meta("region", site.region.clone())
                .with_meta("city", site.city.clone())
                .with_meta("distance_km", ranked.distance_km.map(round_km))
        })
        .collect()
}
