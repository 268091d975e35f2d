pub mod acquire;
pub mod cli;
pub mod composite;
pub mod core;
pub mod extract;
pub mod fallback;
pub mod fusion;
pub mod providers;
pub mod service;
pub mod store;

pub use crate::core::config;

use crate::fusion::ContainerClass;
use crate::providers::http::HttpFetcher;
use crate::service::FreightIndexService;
use crate::store::IndexStore;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Acquire {
        families: Vec<String>,
        dry_run: bool,
    },
    Latest {
        family: String,
        routes: Vec<String>,
    },
    Estimate {
        origin: String,
        destination: String,
        container: ContainerClass,
        weight_tons: Option<f64>,
        json: bool,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("frate starting...");

    let config = match config_path {
        Some(path) => config::AppConfig::load_from_path(path)?,
        None => config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let db_path = config.database_path()?;
    let store = IndexStore::open(&db_path)
        .await
        .with_context(|| format!("Failed to open index store at {}", db_path.display()))?;
    let fetcher = HttpFetcher::new(&config.fetch).context("Failed to build HTTP client")?;
    let service = FreightIndexService::new(config, store, Arc::new(fetcher));

    match command {
        AppCommand::Acquire { families, dry_run } => {
            let families = if families.is_empty() {
                service
                    .config()
                    .families
                    .iter()
                    .map(|f| f.name.clone())
                    .collect()
            } else {
                families
            };
            let today = chrono::Local::now().date_naive();
            cli::acquire::run(&service, &families, today, dry_run).await
        }
        AppCommand::Latest { family, routes } => cli::latest::run(&service, &family, &routes).await,
        AppCommand::Estimate {
            origin,
            destination,
            container,
            weight_tons,
            json,
        } => {
            cli::estimate::run(&service, &origin, &destination, container, weight_tons, json)
                .await
        }
    }
}
