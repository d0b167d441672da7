/// Personalized dive-site filtering
///
/// A user's competence level is the highest site difficulty their active
/// certifications cover. Candidate sites are then narrowed to places the user
/// has not dived yet, that do not exceed that level, and that can be entered
/// from shore; with an origin they are ranked nearest first.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CertificationLevel, DiveSite};
use crate::certification::capability::parse_depth_meters;
use crate::certification::ordering::category_rank;

/// Level assumed for users without any active certification.
pub const ENTRY_LEVEL: u8 = 1;

/// Top of the site difficulty scale.
pub const MAX_LEVEL: u8 = 4;

const EARTH_RADIUS_KM: f64 = 6371.0;

static SHORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bshore\b").expect("valid regex"));

static NO_SHORE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bno\s+shore\b").expect("valid regex"));

/// A validated latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// None when either coordinate is out of range or not finite.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(GeoPoint { latitude, longitude })
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.latitude.to_radians(), other.latitude.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.longitude - self.longitude).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }
}

fn site_location(site: &DiveSite) -> Option<GeoPoint> {
    match (site.latitude, site.longitude) {
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
        _ => None,
    }
}

/// Map a certification level onto the site difficulty scale.
///
/// Depth decides when it parses (≤18m → 1, ≤30m → 2, ≤40m → 3, deeper → 4).
/// Depth-less levels fall back on their track: technical and cave count as
/// expert, professional as advanced, everything else as entry level.
pub fn difficulty_for_level(level: &CertificationLevel) -> u8 {
    if let Some(depth) = level.max_depth.as_deref().and_then(parse_depth_meters) {
        return match depth {
            d if d <= 18.0 => 1,
            d if d <= 30.0 => 2,
            d if d <= 40.0 => 3,
            _ => MAX_LEVEL,
        };
    }
    match category_rank(level.category.as_deref()) {
        2 | 3 => MAX_LEVEL,
        4 => 3,
        _ => ENTRY_LEVEL,
    }
}

/// Highest difficulty covered by the user's active certifications.
pub fn user_level(user_id: i64, catalog: &Catalog) -> u8 {
    catalog
        .active_levels_for(user_id)
        .into_iter()
        .map(difficulty_for_level)
        .max()
        .unwrap_or(ENTRY_LEVEL)
}

/// Everything personalization needs about the requesting user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    pub user_id: Option<i64>,
    pub level: u8,
    pub visited: HashSet<i64>,
}

impl UserContext {
    pub fn resolve(user_id: i64, catalog: &Catalog) -> Self {
        UserContext {
            user_id: Some(user_id),
            level: user_level(user_id, catalog),
            visited: catalog.visited_sites(user_id),
        }
    }

    /// Context for a request without a user: nothing visited, entry level.
    pub fn anonymous() -> Self {
        UserContext {
            user_id: None,
            level: ENTRY_LEVEL,
            visited: HashSet::new(),
        }
    }

    /// Lower the effective level to an explicit ceiling; never raises it.
    pub fn capped_at(mut self, ceiling: Option<u8>) -> Self {
        if let Some(ceiling) = ceiling {
            self.level = self.level.min(ceiling);
        }
        self
    }
}

/// A site that passed the filters, with its distance when an origin was given.
#[derive(Debug, Clone)]
pub struct RankedSite<'a> {
    pub site: &'a DiveSite,
    pub distance_km: Option<f64>,
}

/// "shore" as a whole word, unless negated ("no shore entry").
pub fn is_shore_accessible(site: &DiveSite) -> bool {
    site.access_instructions
        .as_deref()
        .is_some_and(|text| SHORE_RE.is_match(text) && !NO_SHORE_RE.is_match(text))
}

/// Apply visited / difficulty / shore-access filters, then rank by distance.
///
/// Without an origin the input order is kept. Sites without coordinates sort
/// after every located site, in input order.
pub fn filter_candidates<'a>(
    sites: &'a [DiveSite],
    ctx: &UserContext,
    origin: Option<GeoPoint>,
) -> Vec<RankedSite<'a>> {
    let mut ranked: Vec<RankedSite<'a>> = sites
        .iter()
        .filter(|site| !ctx.visited.contains(&site.id))
        .filter(|site| site.difficulty <= ctx.level)
        .filter(|site| is_shore_accessible(site))
        .map(|site| RankedSite {
            site,
            distance_km: origin
                .zip(site_location(site))
                .map(|(from, to)| from.distance_km(&to)),
        })
        .collect();

    if origin.is_some() {
        ranked.sort_by(|a, b| match (a.distance_km, b.distance_km) {
            (Some(da), Some(db)) => da.total_cmp(&db),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });
    }

    tracing::debug!(
        user_id = ?ctx.user_id,
        level = ctx.level,
        candidates = sites.len(),
        kept = ranked.len(),
        ranked_by_distance = origin.is_some(),
        "Personalized site filter applied"
    );

    ranked
}
