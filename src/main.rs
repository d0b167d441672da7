use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use divequery::catalog::json::JsonCatalogSource;
use divequery::catalog::{Catalog, CatalogSource, User};
use divequery::certification::{capabilities_for_user, curriculum_for};
use divequery::config::Config;
use divequery::errors::DiveQueryError;
use divequery::intent::{intent_schema, SearchIntent};
use divequery::logging;
use divequery::search::{SearchDispatcher, SearchResult};

#[derive(Parser)]
#[command(
    name = "divequery",
    version,
    about = "Retrieval and ranking for structured diving questions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Catalog snapshot to search (overrides catalog_path from config)
    #[arg(long, global = true, env = "DIVEQUERY_CATALOG_PATH")]
    catalog: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one search intent and print the ranked results
    Search {
        /// JSON file holding a single intent
        #[arg(long)]
        intent: PathBuf,
        /// Id of the requesting user, for personal recommendations
        #[arg(long)]
        user: Option<i64>,
    },
    /// Run a JSON array of intents concurrently, results in input order
    Batch {
        #[arg(long)]
        intents: PathBuf,
        #[arg(long)]
        user: Option<i64>,
    },
    /// Show what a user's active certifications allow
    Capabilities {
        #[arg(long)]
        user: i64,
    },
    /// Print an organization's certification levels as a progression
    Levels {
        /// Acronym or (part of) the organization name
        #[arg(long)]
        org: String,
    },
    /// Print the JSON schema of a search intent
    Schema,
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let value = serde_json::from_str(&raw).map_err(DiveQueryError::from)?;
    Ok(value)
}

async fn load_catalog(path: &Path) -> Result<Catalog> {
    let catalog = JsonCatalogSource::new(path).snapshot().await?;
    tracing::info!(
        path = %path.display(),
        sites = catalog.dive_sites.len(),
        organizations = catalog.organizations.len(),
        "Catalog loaded"
    );
    Ok(catalog)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Look up the `--user` id; an id that is not in the catalog is an error.
fn resolve_user(catalog: &Catalog, user_id: Option<i64>) -> Result<Option<&User>, DiveQueryError> {
    match user_id {
        Some(id) => catalog
            .user(id)
            .map(Some)
            .ok_or_else(|| DiveQueryError::not_found("user", id)),
        None => Ok(None),
    }
}

/// Fan intents out to blocking tasks sharing one catalog snapshot.
async fn run_batch(
    dispatcher: Arc<SearchDispatcher>,
    catalog: Arc<Catalog>,
    intents: Vec<SearchIntent>,
    user_id: Option<i64>,
) -> Result<Vec<Vec<SearchResult>>> {
    let handles: Vec<_> = intents
        .into_iter()
        .map(|intent| {
            let dispatcher = Arc::clone(&dispatcher);
            let catalog = Arc::clone(&catalog);
            tokio::task::spawn_blocking(move || {
                let user = user_id.and_then(|id| catalog.user(id));
                dispatcher.execute(&intent, user, &catalog)
            })
        })
        .collect();

    let mut all = Vec::with_capacity(handles.len());
    for handle in handles {
        let results = handle
            .await
            .map_err(|e| DiveQueryError::Internal(format!("Search task failed: {}", e)))?;
        all.push(results);
    }
    Ok(all)
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Parse CLI args
    let cli = Cli::parse();

    // 2. Load configuration
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Config error (using defaults): {}", e);
        Config::default()
    });

    // 3. Initialize logging before any other output; stdout carries results only
    logging::init_logging(&config);

    let catalog_path = cli
        .catalog
        .unwrap_or_else(|| PathBuf::from(&config.catalog_path));
    let dispatcher = SearchDispatcher::new(config.search.clone());

    // 4. Handle subcommands
    match cli.command {
        Commands::Schema => {
            print_json(&intent_schema())?;
        }

        Commands::Search { intent, user } => {
            let catalog = load_catalog(&catalog_path).await?;
            let intent: SearchIntent = read_json(&intent).await?;
            let user = resolve_user(&catalog, user)?;
            let results = dispatcher.execute(&intent, user, &catalog);
            print_json(&results)?;
        }

        Commands::Batch { intents, user } => {
            let catalog = load_catalog(&catalog_path).await?;
            let intents: Vec<SearchIntent> = read_json(&intents).await?;
            resolve_user(&catalog, user)?;
            let count = intents.len();
            let results = run_batch(Arc::new(dispatcher), Arc::new(catalog), intents, user).await?;
            tracing::info!(intents = count, "Batch completed");
            print_json(&results)?;
        }

        Commands::Capabilities { user } => {
            let catalog = load_catalog(&catalog_path).await?;
            resolve_user(&catalog, Some(user))?;
            print_json(&capabilities_for_user(user, &catalog))?;
        }

        Commands::Levels { org } => {
            let catalog = load_catalog(&catalog_path).await?;
            let plan = curriculum_for(&org, &catalog)
                .ok_or_else(|| DiveQueryError::not_found("organization", &org))?;
            print_json(&plan)?;
        }
    }

    Ok(())
}
