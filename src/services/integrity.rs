//! Uniqueness, referential and field checks run before any write

use chrono::NaiveDate;
use validator::Validate;

use crate::{
    config::CatalogConfig,
    error::{AppError, AppResult},
    models::{Author, AuthorData, CopyData, Exemplar, Work, WorkData},
    repository::{FieldValue, Repository},
};

#[derive(Clone)]
pub struct IntegrityValidator {
    repository: Repository,
    config: CatalogConfig,
}

impl IntegrityValidator {
    pub fn new(repository: Repository, config: CatalogConfig) -> Self {
        Self { repository, config }
    }

    /// A new copy must not reuse an existing inventory number
    pub async fn validate_copy_create(&self, copy: &Exemplar) -> AppResult<()> {
        self.ensure_inventory_number_free(&copy.inventory_number).await
    }

    /// Only a changed inventory number is checked, so re-saving a copy as-is always passes
    pub async fn validate_copy_update(&self, existing: &Exemplar, updated: &Exemplar) -> AppResult<()> {
        if existing.inventory_number == updated.inventory_number {
            return Ok(());
        }
        self.ensure_inventory_number_free(&updated.inventory_number).await
    }

    pub async fn validate_work_reference(&self, work_id: i64) -> AppResult<()> {
        if self.repository.exists::<Work>(work_id).await? {
            Ok(())
        } else {
            Err(AppError::ReferenceNotFound(format!("Work with id {} does not exist", work_id)))
        }
    }

    pub async fn validate_author_reference(&self, author_id: i64) -> AppResult<()> {
        if self.repository.exists::<Author>(author_id).await? {
            Ok(())
        } else {
            Err(AppError::ReferenceNotFound(format!(
                "Author with id {} does not exist",
                author_id
            )))
        }
    }

    pub fn validate_author_data(&self, data: &AuthorData, today: NaiveDate) -> AppResult<()> {
        data.validate()?;
        if let Some(birth_date) = data.birth_date {
            if birth_date >= today {
                return Err(AppError::Validation(
                    "Birth date must be in the past".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn validate_work_data(&self, data: &WorkData) -> AppResult<()> {
        data.validate()?;
        if data.title.trim().is_empty() {
            return Err(AppError::Validation("Title must not be blank".to_string()));
        }
        if data.genre.trim().is_empty() {
            return Err(AppError::Validation("Genre must not be blank".to_string()));
        }
        let years = self.config.min_published_year..=self.config.max_published_year;
        if !years.contains(&data.published_year) {
            return Err(AppError::Validation(format!(
                "Published year must be between {} and {}",
                years.start(),
                years.end()
            )));
        }
        Ok(())
    }

    pub fn validate_copy_data(&self, data: &CopyData) -> AppResult<()> {
        data.validate()?;
        if data.inventory_number.trim().is_empty() {
            return Err(AppError::Validation(
                "Inventory number must not be blank".to_string(),
            ));
        }
        Ok(())
    }

    async fn ensure_inventory_number_free(&self, inventory_number: &str) -> AppResult<()> {
        let taken = self
            .repository
            .exists_where::<Exemplar>("inventory_number", FieldValue::from(inventory_number))
            .await?;
        if taken {
            tracing::debug!("Inventory number {} already in use", inventory_number);
            return Err(AppError::DuplicateInventoryNumber(format!(
                "A copy with inventory number {} already exists",
                inventory_number
            )));
        }
        Ok(())
    }
}
