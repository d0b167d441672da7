/// Curriculum ordering for certification levels
///
/// Levels sort by (category rank, depth, gas difficulty, name). The category and
/// gas tables come from the labels seen in agency data so far; anything they do
/// not recognize sorts after every known entry.

use std::cmp::Ordering;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CertificationLevel, Organization};
use super::capability::parse_depth_meters;

/// Depth used for levels without a parsable limit ("Unlimited", blank).
pub const UNLIMITED_DEPTH_M: f64 = 9999.0;

const CATEGORY_RANKS: &[(&str, u8)] = &[
    ("recreational track", 0),
    ("recreational", 0),
    ("specialties", 1),
    ("specialty", 1),
    ("technical track", 2),
    ("technical", 2),
    ("cave track", 3),
    ("cave", 3),
    ("professional track", 4),
    ("professional", 4),
];

pub const UNKNOWN_CATEGORY_RANK: u8 = 5;

pub const UNKNOWN_GAS_RANK: u8 = 5;

static AIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bair\b").expect("valid regex"));

pub fn category_rank(category: Option<&str>) -> u8 {
    let Some(label) = category.map(|c| c.trim().to_lowercase()) else {
        return UNKNOWN_CATEGORY_RANK;
    };
    CATEGORY_RANKS
        .iter()
        .find(|(known, _)| *known == label)
        .map(|(_, rank)| *rank)
        .unwrap_or(UNKNOWN_CATEGORY_RANK)
}

pub fn depth_key(level: &CertificationLevel) -> f64 {
    level
        .max_depth
        .as_deref()
        .and_then(parse_depth_meters)
        .unwrap_or(UNLIMITED_DEPTH_M)
}

/// absent(0) < air(1) < nitrox/oxygen(2) < trimix(3) < hypoxic trimix(4) < unrecognized(5)
pub fn gas_rank(gases: Option<&str>) -> u8 {
    let lower = match gases.map(str::trim) {
        None | Some("") => return 0,
        Some(g) => g.to_lowercase(),
    };
    if lower.contains("trimix") {
        return if lower.contains("hypoxic") { 4 } else { 3 };
    }
    if lower.contains("nitrox")
        || lower.contains("eanx")
        || lower.contains("oxygen")
        || lower.contains('%')
    {
        return 2;
    }
    if AIR_RE.is_match(&lower) {
        return 1;
    }
    UNKNOWN_GAS_RANK
}

/// Total order used for curricula.
pub fn compare_levels(a: &CertificationLevel, b: &CertificationLevel) -> Ordering {
    category_rank(a.category.as_deref())
        .cmp(&category_rank(b.category.as_deref()))
        .then_with(|| depth_key(a).total_cmp(&depth_key(b)))
        .then_with(|| gas_rank(a.gases.as_deref()).cmp(&gas_rank(b.gases.as_deref())))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort levels from entry level to most advanced.
pub fn order<'a>(
    levels: impl IntoIterator<Item = &'a CertificationLevel>,
) -> Vec<&'a CertificationLevel> {
    let mut ordered: Vec<&CertificationLevel> = levels.into_iter().collect();
    ordered.sort_by(|a, b| compare_levels(a, b));
    ordered
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDetail {
    pub name: String,
    pub max_depth: Option<String>,
    pub category: Option<String>,
}

/// An organization's levels arranged as a progression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curriculum {
    pub organization: Organization,
    pub courses: Vec<String>,
    pub details: Vec<CourseDetail>,
}

pub fn curriculum<'a>(
    organization: &Organization,
    levels: impl IntoIterator<Item = &'a CertificationLevel>,
) -> Curriculum {
    let ordered = order(levels);
    Curriculum {
        organization: organization.clone(),
        courses: ordered.iter().map(|l| l.name.clone()).collect(),
        details: ordered
            .iter()
            .map(|l| CourseDetail {
                name: l.name.clone(),
                max_depth: l.max_depth.clone(),
                category: l.category.clone(),
            })
            .collect(),
    }
}

/// Ordered levels of the organization a user-typed reference resolves to.
pub fn organization_levels<'a>(
    reference: &str,
    catalog: &'a Catalog,
) -> Option<(&'a Organization, Vec<&'a CertificationLevel>)> {
    let organization = catalog.find_organization(reference)?;
    Some((organization, order(catalog.levels_of(organization.id))))
}

pub fn curriculum_for(reference: &str, catalog: &Catalog) -> Option<Curriculum> {
    let (organization, ordered) = organization_levels(reference, catalog)?;
    Some(curriculum(organization, ordered))
}
