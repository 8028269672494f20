//! Business logic services

pub mod cascade;
pub mod catalog;
pub mod integrity;
pub mod lending;

use crate::{config::AppConfig, error::AppResult, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            catalog: catalog::CatalogService::new(
                repository,
                config.catalog.clone(),
                config.lending.clone(),
            )?,
        })
    }
}
