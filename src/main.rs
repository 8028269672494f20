//! Library Catalog - bootstrap
//!
//! Loads configuration, connects the configured store and reports the catalog state.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_catalog::{
    config::{AppConfig, StoreBackend},
    repository::{memory::MemoryStore, postgres::PgStore, Repository},
    services::Services,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("library_catalog={}", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Library Catalog v{}", env!("CARGO_PKG_VERSION"));

    let repository = match config.database.backend {
        StoreBackend::Postgres => {
            let store = PgStore::connect(&config.database).await?;
            tracing::info!("Connected to database");

            store.migrate().await?;
            tracing::info!("Database migrations completed");

            Repository::new(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::info!("Using in-memory store");
            Repository::new(Arc::new(MemoryStore::new()))
        }
    };

    let services = Services::new(repository, &config)?;
    let catalog = &services.catalog;

    tracing::info!(
        "Catalog holds {} authors, {} works, {} copies",
        catalog.count_authors().await?,
        catalog.count_works().await?,
        catalog.count_copies().await?
    );

    let overdue = catalog.overdue_copies().await?;
    for copy in &overdue {
        tracing::warn!(
            "Copy {} borrowed by {} was due {}",
            copy.inventory_number,
            copy.borrower_name.as_deref().unwrap_or("unknown"),
            copy.due_date.map(|d| d.to_string()).unwrap_or_default()
        );
    }
    tracing::info!("{} overdue copies", overdue.len());

    Ok(())
}
