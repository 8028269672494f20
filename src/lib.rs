//! Library Catalog
//!
//! The integrity and lending core of a library catalog: authors own works, works own
//! physical copies, and each copy moves through a borrow / return lifecycle.

pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::Repository;
pub use services::{catalog::CatalogService, Services};
