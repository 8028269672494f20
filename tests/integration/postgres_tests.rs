//! PostgreSQL store tests
//!
//! Need a disposable database: DATABASE_URL=postgres://... cargo test -- --ignored

use std::sync::Arc;

use library_catalog::{
    config::{CatalogConfig, DatabaseConfig, LendingConfig, StoreBackend},
    error::AppError,
    models::CopyStatus,
    repository::postgres::PgStore,
    CatalogService, Repository,
};

use crate::{author_data, copy_data, today, work_data};

async fn pg_catalog() -> CatalogService {
    let config = DatabaseConfig {
        backend: StoreBackend::Postgres,
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
        ..DatabaseConfig::default()
    };
    let store = PgStore::connect(&config).await.expect("Failed to connect to database");
    store.migrate().await.expect("Failed to run migrations");

    CatalogService::new(
        Repository::new(Arc::new(store)),
        CatalogConfig::default(),
        LendingConfig::default(),
    )
    .unwrap()
    .with_today(today)
}

/// Inventory numbers are global, so each run uses its own
fn unique_number() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    format!("{:06}", nanos % 1_000_000)
}

#[tokio::test]
#[ignore]
async fn test_pg_lifecycle_and_cascade() {
    let catalog = pg_catalog().await;

    let author = catalog.create_author(author_data("Ivan Turgenev")).await.unwrap();
    let work = catalog
        .create_work(work_data("Fathers and Sons", author.id.unwrap()))
        .await
        .unwrap();
    let number = unique_number();
    let copy = catalog
        .create_copy(copy_data(&number, work.id.unwrap()))
        .await
        .unwrap();

    let fetched = catalog.get_work(work.id.unwrap()).await.unwrap();
    assert_eq!(fetched, Some(work.clone()));

    assert!(matches!(
        catalog.create_copy(copy_data(&number, work.id.unwrap())).await,
        Err(AppError::DuplicateInventoryNumber(_))
    ));

    let borrowed = catalog.borrow(copy.id.unwrap(), "Ivan Petrov").await.unwrap();
    assert_eq!(borrowed.status, CopyStatus::Borrowed);
    let returned = catalog.return_copy(copy.id.unwrap()).await.unwrap();
    assert_eq!(returned.return_date, Some(today()));

    let report = catalog.delete_author(author.id.unwrap()).await.unwrap();
    assert_eq!((report.works, report.copies), (1, 1));
    assert!(catalog.get_copy(copy.id.unwrap()).await.unwrap().is_none());
}
