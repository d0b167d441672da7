/// Catalog rows and the data-access abstraction
///
/// The ranking engine never queries storage itself. A `CatalogSource` hands it a
/// request-scoped `Catalog` snapshot of already-materialized rows; every strategy
/// reads from that snapshot only.

use std::collections::HashSet;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DiveQueryError;

pub mod json;

/// A certifying agency (PADI, SSI, TDI, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    /// Short form users usually type: "PADI", "SSI"
    pub acronym: String,
}

/// One course/level of an organization's curriculum.
///
/// Every descriptive field is free text as entered by editors, e.g.
/// `max_depth = "18m"`, `gases = "Nitrox up to 40%"`, `tanks = "Double + 2 Stages"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationLevel {
    pub id: i64,
    pub organization_id: i64,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub max_depth: Option<String>,
    #[serde(default)]
    pub gases: Option<String>,
    #[serde(default)]
    pub tanks: Option<String>,
    #[serde(default)]
    pub prerequisites: Option<String>,
    #[serde(default)]
    pub deco_time_limit: Option<String>,
}

/// A certification held by a user. Only active ones count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCertification {
    pub user_id: i64,
    pub certification_level_id: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// A logged dive; only the user/site link matters here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiveLog {
    pub user_id: i64,
    pub dive_site_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiveSite {
    pub id: i64,
    pub name: String,
    /// Difficulty rank on the shared 1 (beginner) .. 4 (expert) scale
    #[serde(default = "default_difficulty")]
    pub difficulty: u8,
    #[serde(default)]
    pub access_instructions: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub marine_life: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
}

fn default_difficulty() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DivingCenter {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Rental price of one gear item at one center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GearRentalCost {
    pub id: i64,
    pub item_name: String,
    pub cost: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub diving_center_id: i64,
}

fn default_currency() -> String {
    "EUR".to_string()
}

/// Request-scoped snapshot of every row the strategies may read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub organizations: Vec<Organization>,
    #[serde(default)]
    pub certification_levels: Vec<CertificationLevel>,
    #[serde(default)]
    pub user_certifications: Vec<UserCertification>,
    #[serde(default)]
    pub dive_logs: Vec<DiveLog>,
    #[serde(default)]
    pub dive_sites: Vec<DiveSite>,
    #[serde(default)]
    pub diving_centers: Vec<DivingCenter>,
    #[serde(default)]
    pub gear_rental_costs: Vec<GearRentalCost>,
}

impl Catalog {
    pub fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    pub fn organization(&self, id: i64) -> Option<&Organization> {
        self.organizations.iter().find(|o| o.id == id)
    }

    pub fn level(&self, id: i64) -> Option<&CertificationLevel> {
        self.certification_levels.iter().find(|l| l.id == id)
    }

    pub fn center(&self, id: i64) -> Option<&DivingCenter> {
        self.diving_centers.iter().find(|c| c.id == id)
    }

    /// Resolve an organization from a user-typed reference.
    ///
    /// Matches the acronym exactly (case-insensitive) first, then falls back
    /// to the reference appearing inside the full name.
    pub fn find_organization(&self, reference: &str) -> Option<&Organization> {
        let needle = reference.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.organizations
            .iter()
            .find(|o| o.acronym.to_lowercase() == needle)
            .or_else(|| {
                self.organizations
                    .iter()
                    .find(|o| o.name.to_lowercase().contains(&needle))
            })
    }

    /// All levels published by one organization, in catalog order.
    pub fn levels_of(&self, organization_id: i64) -> Vec<&CertificationLevel> {
        self.certification_levels
            .iter()
            .filter(|l| l.organization_id == organization_id)
            .collect()
    }

    /// Levels behind the user's active certifications, in the order they were granted.
    ///
    /// Certifications pointing at unknown levels are skipped.
    pub fn active_levels_for(&self, user_id: i64) -> Vec<&CertificationLevel> {
        self.user_certifications
            .iter()
            .filter(|c| c.user_id == user_id && c.is_active)
            .filter_map(|c| self.level(c.certification_level_id))
            .collect()
    }

    /// Ids of every site the user has logged at least one dive at.
    pub fn visited_sites(&self, user_id: i64) -> HashSet<i64> {
        self.dive_logs
            .iter()
            .filter(|d| d.user_id == user_id)
            .map(|d| d.dive_site_id)
            .collect()
    }
}

/// Data-access collaborator that materializes a catalog snapshot.
///
/// Implementations must be Send + Sync so a snapshot can be fetched from any
/// request-handling task.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Load every row the engine may need for one request.
    async fn snapshot(&self) -> Result<Catalog, DiveQueryError>;
}
