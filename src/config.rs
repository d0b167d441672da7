/// Configuration management using figment
///
/// Loads configuration with this precedence (highest wins):
/// 1. Defaults (hardcoded)
/// 2. TOML file: divequery.toml (in working directory)
/// 3. Environment variables: prefixed DIVEQUERY_ (e.g., DIVEQUERY_LOG_LEVEL=debug,
///    DIVEQUERY_SEARCH__MAX_RESULTS=10)

use figment::{
    Figment,
    providers::{Env, Format, Toml, Serialized},
};
use serde::{Deserialize, Serialize};
use crate::errors::DiveQueryError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Path of the JSON catalog snapshot used by the CLI.
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Tunables for the search strategies.
///
/// Ranking weights stay fixed constants in the scoring module; only the
/// cut-offs that shape result set size live here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Minimum discovery score for a site or center to be returned.
    #[serde(default = "default_min_score")]
    pub min_score: f64,

    /// Strict marine-life hits below this count trigger the fallback pass.
    #[serde(default = "default_marine_life_min_results")]
    pub marine_life_min_results: usize,

    /// Upper bound on results returned by a single strategy.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_catalog_path() -> String {
    "catalog.json".to_string()
}

fn default_min_score() -> f64 {
    0.05
}

fn default_marine_life_min_results() -> usize {
    3
}

fn default_max_results() -> usize {
    25
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            min_score: default_min_score(),
            marine_life_min_results: default_marine_life_min_results(),
            max_results: default_max_results(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: default_log_level(),
            catalog_path: default_catalog_path(),
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from defaults, TOML file, and environment variables
    ///
    /// Environment variables override TOML file values.
    /// Example: DIVEQUERY_LOG_LEVEL=debug overrides log_level in divequery.toml
    pub fn load() -> Result<Config, DiveQueryError> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file("divequery.toml"))
            .merge(Env::prefixed("DIVEQUERY_").split("__"))
            .extract()
            .map_err(|e| DiveQueryError::Config(format!("Failed to load config: {}", e)))?;
        config.search.validate()?;
        Ok(config)
    }
}

impl SearchConfig {
    /// Reject cut-offs no strategy can work with.
    pub fn validate(&self) -> Result<(), DiveQueryError> {
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(DiveQueryError::validation(
                "search.min_score",
                "min_score must be between 0 and 1",
            ));
        }
        if self.max_results == 0 {
            return Err(DiveQueryError::validation(
                "search.max_results",
                "max_results must be at least 1",
            ));
        }
        Ok(())
    }
}
