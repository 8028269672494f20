//! Catalog management service: the entry point for authors, works, copies and loans

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{
    config::{CatalogConfig, LendingConfig},
    error::AppResult,
    models::{Author, AuthorData, CopyData, CopyStatus, Exemplar, Work, WorkData},
    repository::{FieldValue, Repository},
};

use super::{
    cascade::{CascadeManager, CascadeReport},
    integrity::IntegrityValidator,
    lending::LendingStateMachine,
};

type Today = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    integrity: IntegrityValidator,
    cascade: CascadeManager,
    lending: LendingStateMachine,
    /// Serializes writers of this instance, so a check and the write that follows it
    /// see the same state. Status transitions are also checked by the store itself.
    write_gate: Arc<Mutex<()>>,
    today: Today,
}

impl CatalogService {
    pub fn new(
        repository: Repository,
        catalog: CatalogConfig,
        lending: LendingConfig,
    ) -> AppResult<Self> {
        Ok(Self {
            integrity: IntegrityValidator::new(repository.clone(), catalog),
            cascade: CascadeManager::new(repository.clone()),
            lending: LendingStateMachine::new(&lending)?,
            repository,
            write_gate: Arc::new(Mutex::new(())),
            today: Arc::new(|| Utc::now().date_naive()),
        })
    }

    /// Replace the clock used for borrow, return and overdue dates
    pub fn with_today(mut self, today: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.today = Arc::new(today);
        self
    }

    fn today(&self) -> NaiveDate {
        (self.today)()
    }

    // ---------------------------------------------------------------------
    // Authors
    // ---------------------------------------------------------------------

    pub async fn list_authors(&self) -> AppResult<Vec<Author>> {
        self.repository.list().await
    }

    pub async fn get_author(&self, id: i64) -> AppResult<Option<Author>> {
        self.repository.get(id).await
    }

    pub async fn count_authors(&self) -> AppResult<i64> {
        self.repository.count::<Author>().await
    }

    /// Case-insensitive substring match on the author name
    pub async fn search_authors(&self, name: &str) -> AppResult<Vec<Author>> {
        let needle = name.trim().to_lowercase();
        let authors = self.list_authors().await?;
        Ok(authors
            .into_iter()
            .filter(|a| a.name.to_lowercase().contains(&needle))
            .collect())
    }

    pub async fn create_author(&self, data: AuthorData) -> AppResult<Author> {
        self.integrity.validate_author_data(&data, self.today())?;

        let _guard = self.write_gate.lock().await;
        let author = self.repository.save(Author::from(data)).await?;
        tracing::info!("Created author id={:?} name={}", author.id, author.name);
        Ok(author)
    }

    pub async fn update_author(&self, id: i64, data: AuthorData) -> AppResult<Author> {
        self.integrity.validate_author_data(&data, self.today())?;

        let _guard = self.write_gate.lock().await;
        let mut author = self.repository.get_required::<Author>(id).await?;
        author.apply(data);
        self.repository.save(author).await
    }

    pub async fn delete_author(&self, id: i64) -> AppResult<CascadeReport> {
        let _guard = self.write_gate.lock().await;
        self.cascade.delete_author(id).await
    }

    // ---------------------------------------------------------------------
    // Works
    // ---------------------------------------------------------------------

    pub async fn list_works(&self) -> AppResult<Vec<Work>> {
        self.repository.list().await
    }

    pub async fn get_work(&self, id: i64) -> AppResult<Option<Work>> {
        self.repository.get(id).await
    }

    pub async fn count_works(&self) -> AppResult<i64> {
        self.repository.count::<Work>().await
    }

    /// Case-insensitive substring match on the title
    pub async fn search_works(&self, title: &str) -> AppResult<Vec<Work>> {
        let needle = title.trim().to_lowercase();
        let works = self.list_works().await?;
        Ok(works
            .into_iter()
            .filter(|w| w.title.to_lowercase().contains(&needle))
            .collect())
    }

    pub async fn works_by_author(&self, author_id: i64) -> AppResult<Vec<Work>> {
        self.repository.get_required::<Author>(author_id).await?;
        self.repository
            .list_where("author_id", FieldValue::Int(author_id))
            .await
    }

    pub async fn create_work(&self, data: WorkData) -> AppResult<Work> {
        self.integrity.validate_work_data(&data)?;

        let _guard = self.write_gate.lock().await;
        self.integrity.validate_author_reference(data.author_id).await?;
        let work = self.repository.save(Work::from(data)).await?;
        tracing::info!("Created work id={:?} title={}", work.id, work.title);
        Ok(work)
    }

    pub async fn update_work(&self, id: i64, data: WorkData) -> AppResult<Work> {
        self.integrity.validate_work_data(&data)?;

        let _guard = self.write_gate.lock().await;
        let mut work = self.repository.get_required::<Work>(id).await?;
        if work.author_id != data.author_id {
            self.integrity.validate_author_reference(data.author_id).await?;
        }
        work.apply(data);
        self.repository.save(work).await
    }

    pub async fn delete_work(&self, id: i64) -> AppResult<CascadeReport> {
        let _guard = self.write_gate.lock().await;
        self.cascade.delete_work(id).await
    }

    // ---------------------------------------------------------------------
    // Copies
    // ---------------------------------------------------------------------

    pub async fn list_copies(&self) -> AppResult<Vec<Exemplar>> {
        self.repository.list().await
    }

    pub async fn get_copy(&self, id: i64) -> AppResult<Option<Exemplar>> {
        self.repository.get(id).await
    }

    pub async fn count_copies(&self) -> AppResult<i64> {
        self.repository.count::<Exemplar>().await
    }

    pub async fn copies_by_work(&self, work_id: i64) -> AppResult<Vec<Exemplar>> {
        self.repository.get_required::<Work>(work_id).await?;
        self.repository
            .list_where("work_id", FieldValue::Int(work_id))
            .await
    }

    /// Exact, case-sensitive lookup by inventory number
    pub async fn find_copy_by_inventory_number(
        &self,
        inventory_number: &str,
    ) -> AppResult<Option<Exemplar>> {
        let copies: Vec<Exemplar> = self
            .repository
            .list_where("inventory_number", FieldValue::from(inventory_number))
            .await?;
        Ok(copies.into_iter().next())
    }

    pub async fn copies_by_status(&self, status: CopyStatus) -> AppResult<Vec<Exemplar>> {
        self.repository
            .list_where("status", FieldValue::from(status.as_str()))
            .await
    }

    /// Borrowed copies whose due date has passed
    pub async fn overdue_copies(&self) -> AppResult<Vec<Exemplar>> {
        let today = self.today();
        let borrowed = self.copies_by_status(CopyStatus::Borrowed).await?;
        Ok(borrowed
            .into_iter()
            .filter(|c| self.lending.is_overdue(c, today))
            .collect())
    }

    pub async fn create_copy(&self, data: CopyData) -> AppResult<Exemplar> {
        self.integrity.validate_copy_data(&data)?;

        let _guard = self.write_gate.lock().await;
        let copy = Exemplar::from(data);
        self.integrity.validate_work_reference(copy.work_id).await?;
        self.integrity.validate_copy_create(&copy).await?;
        let copy = self.repository.save(copy).await?;
        tracing::info!(
            "Created copy id={:?} inventory_number={}",
            copy.id,
            copy.inventory_number
        );
        Ok(copy)
    }

    /// Replace the inventory number and work of a copy. Status is left untouched.
    pub async fn update_copy(&self, id: i64, data: CopyData) -> AppResult<Exemplar> {
        self.integrity.validate_copy_data(&data)?;

        let _guard = self.write_gate.lock().await;
        let existing = self.repository.get_required::<Exemplar>(id).await?;
        let mut updated = existing.clone();
        updated.apply(data);

        if existing.work_id != updated.work_id {
            self.integrity.validate_work_reference(updated.work_id).await?;
        }
        self.integrity.validate_copy_update(&existing, &updated).await?;
        // a loan recorded meanwhile by another writer must not be overwritten
        self.repository.save_copy_if(updated, existing.status).await
    }

    pub async fn delete_copy(&self, id: i64) -> AppResult<CascadeReport> {
        let _guard = self.write_gate.lock().await;
        self.cascade.delete_copy(id).await
    }

    // ---------------------------------------------------------------------
    // Lending
    // ---------------------------------------------------------------------

    /// The closed status vocabulary
    pub fn copy_statuses(&self) -> &'static [CopyStatus] {
        &CopyStatus::ALL
    }

    pub async fn borrow(&self, copy_id: i64, borrower_name: &str) -> AppResult<Exemplar> {
        let _guard = self.write_gate.lock().await;
        let mut copy = self.repository.get_required::<Exemplar>(copy_id).await?;
        let seen = copy.status;

        if let Err(e) = self.lending.borrow(&mut copy, borrower_name, self.today()) {
            tracing::warn!("Borrow of copy id={} rejected: {}", copy_id, e);
            return Err(e);
        }
        let copy = match self.repository.save_copy_if(copy, seen).await {
            Ok(copy) => copy,
            Err(e) => {
                tracing::warn!("Borrow of copy id={} lost to another writer: {}", copy_id, e);
                return Err(e);
            }
        };
        tracing::info!("Copy id={} borrowed, due {:?}", copy_id, copy.due_date);
        Ok(copy)
    }

    pub async fn return_copy(&self, copy_id: i64) -> AppResult<Exemplar> {
        let _guard = self.write_gate.lock().await;
        let mut copy = self.repository.get_required::<Exemplar>(copy_id).await?;
        let seen = copy.status;

        if seen != CopyStatus::Borrowed {
            tracing::debug!("Copy id={} returned while {}", copy_id, seen);
        }
        self.lending.return_copy(&mut copy, self.today());
        let copy = self.repository.save_copy_if(copy, seen).await?;
        tracing::info!("Copy id={} returned", copy_id);
        Ok(copy)
    }

    /// Administrative status change (lost, damaged, back in circulation)
    pub async fn set_copy_status(&self, copy_id: i64, status: CopyStatus) -> AppResult<Exemplar> {
        let _guard = self.write_gate.lock().await;
        let mut copy = self.repository.get_required::<Exemplar>(copy_id).await?;
        let seen = copy.status;

        self.lending.set_status(&mut copy, status)?;
        let copy = self.repository.save_copy_if(copy, seen).await?;
        tracing::info!("Copy id={} status set to {}", copy_id, status);
        Ok(copy)
    }
}
