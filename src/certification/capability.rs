/// Free-text certification field parsing and per-user capability aggregation
///
/// Every parser is a pure function returning `Option` (or a zero count): text that
/// does not match a known shape simply contributes nothing.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CertificationLevel};

static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("valid regex"));

static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,3})\s*%").expect("valid regex"));

static AIR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bair\b").expect("valid regex"));

static STAGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*\+?\s*stages?\b").expect("valid regex"));

/// Trimix qualification tier. Declaration order is the comparison order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TrimixTier {
    Normoxic,
    Hypoxic,
}

/// What a user is certified to do, summarized across active certifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilityStats {
    pub max_depth: Option<f64>,
    pub max_nitrox_pct: Option<u32>,
    pub max_trimix_pct: Option<TrimixTier>,
    pub max_stages: u32,
    pub max_deco_time: Option<String>,
    /// Raw gases text of the certification that granted the trimix tier
    pub best_gases: Option<String>,
    /// Raw tanks text of the certification that granted the stage count
    pub largest_tanks: Option<String>,
}

fn non_blank(text: Option<&str>) -> Option<&str> {
    text.map(str::trim).filter(|t| !t.is_empty())
}

/// First number in a depth field, in metres. "Unlimited" and blanks give None.
pub fn parse_depth_meters(text: &str) -> Option<f64> {
    NUMBER_RE
        .captures(text)
        .and_then(|cap| cap[1].parse::<f64>().ok())
}

/// Highest oxygen fraction (percent) a gases field allows.
///
/// Pure oxygen for deco beats everything, then explicit percentages, then
/// plain air at 21%.
pub fn parse_nitrox_pct(gases: &str) -> Option<u32> {
    let lower = gases.to_lowercase();
    if lower.contains("oxygen") {
        return Some(100);
    }
    let explicit = PERCENT_RE
        .captures_iter(&lower)
        .filter_map(|cap| cap[1].parse::<u32>().ok())
        .filter(|pct| *pct <= 100)
        .max();
    if explicit.is_some() {
        return explicit;
    }
    if AIR_RE.is_match(&lower) {
        return Some(21);
    }
    None
}

pub fn parse_trimix_tier(gases: &str) -> Option<TrimixTier> {
    let lower = gases.to_lowercase();
    if !lower.contains("trimix") {
        return None;
    }
    if lower.contains("hypoxic") {
        Some(TrimixTier::Hypoxic)
    } else {
        Some(TrimixTier::Normoxic)
    }
}

/// Number of stage cylinders in a tanks field ("Double + 3+ Stages" -> 3).
///
/// Single-tank setups and fields without a stage count yield 0.
pub fn parse_stage_count(tanks: &str) -> u32 {
    STAGE_RE
        .captures_iter(tanks)
        .filter_map(|cap| cap[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0)
}

/// none(0) < any finite limit(1) < "Unlimited"(2)
pub fn deco_rank(text: Option<&str>) -> u8 {
    match non_blank(text) {
        None => 0,
        Some(t) if t.to_lowercase().contains("unlimited") => 2,
        Some(_) => 1,
    }
}

/// Fold certification levels into capability stats.
///
/// Levels are visited in order; on ties the later one wins for deco time,
/// `best_gases` and `largest_tanks`.
pub fn aggregate<'a>(levels: impl IntoIterator<Item = &'a CertificationLevel>) -> CapabilityStats {
    let mut stats = CapabilityStats::default();
    let mut best_deco_rank = 0u8;

    for level in levels {
        if let Some(depth) = non_blank(level.max_depth.as_deref()).and_then(parse_depth_meters) {
            stats.max_depth = Some(stats.max_depth.map_or(depth, |d| d.max(depth)));
        }

        if let Some(gases) = non_blank(level.gases.as_deref()) {
            if let Some(pct) = parse_nitrox_pct(gases) {
                stats.max_nitrox_pct = Some(stats.max_nitrox_pct.map_or(pct, |p| p.max(pct)));
            }
            if let Some(tier) = parse_trimix_tier(gases) {
                if stats.max_trimix_pct.map_or(true, |current| tier >= current) {
                    stats.max_trimix_pct = Some(tier);
                    stats.best_gases = Some(gases.to_string());
                }
            }
        }

        if let Some(tanks) = non_blank(level.tanks.as_deref()) {
            let stages = parse_stage_count(tanks);
            if stages >= stats.max_stages {
                stats.max_stages = stages;
                stats.largest_tanks = Some(tanks.to_string());
            }
        }

        let rank = deco_rank(level.deco_time_limit.as_deref());
        if rank > 0 && rank >= best_deco_rank {
            best_deco_rank = rank;
            stats.max_deco_time = non_blank(level.deco_time_limit.as_deref()).map(str::to_string);
        }
    }

    stats
}

/// Capability stats for one user from their active certifications.
pub fn capabilities_for_user(user_id: i64, catalog: &Catalog) -> CapabilityStats {
    let levels = catalog.active_levels_for(user_id);
    let stats = aggregate(levels.iter().copied());
    tracing::debug!(
        user_id,
        certifications = levels.len(),
        max_depth = ?stats.max_depth,
        max_stages = stats.max_stages,
        "Aggregated certification capabilities"
    );
    stats
}
