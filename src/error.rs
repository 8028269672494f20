//! Error types for the catalog core

use thiserror::Error;

/// Stable numeric codes handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    StoreFailure = 3,
    NoSuchData = 5,
    CopyNotAvailable = 7,
    DuplicateInventoryNumber = 8,
    BadValue = 18,
    ReferenceNotFound = 20,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate inventory number: {0}")]
    DuplicateInventoryNumber(String),

    #[error("Reference not found: {0}")]
    ReferenceNotFound(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::NotFound(_) => ErrorCode::NoSuchData,
            AppError::DuplicateInventoryNumber(_) => ErrorCode::DuplicateInventoryNumber,
            AppError::ReferenceNotFound(_) => ErrorCode::ReferenceNotFound,
            AppError::InvalidTransition(_) => ErrorCode::CopyNotAvailable,
            AppError::Validation(_) => ErrorCode::BadValue,
            AppError::StoreUnavailable(_) => ErrorCode::StoreFailure,
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", e);
        AppError::StoreUnavailable(e.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(e: sqlx::migrate::MigrateError) -> Self {
        tracing::error!("Migration error: {:?}", e);
        AppError::StoreUnavailable(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::Validation(e.to_string())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
