//! Repository layer: the entity store port and its adapters

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{Author, CopyStatus, Exemplar, Work},
};

/// The three entity kinds held by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Author,
    Work,
    Copy,
}

impl EntityKind {
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Author => "authors",
            EntityKind::Work => "works",
            EntityKind::Copy => "copies",
        }
    }

    /// Fields that may be used in `list_where` / `exists_where`
    pub fn queryable_fields(&self) -> &'static [&'static str] {
        match self {
            EntityKind::Author => &["id", "name", "nationality"],
            EntityKind::Work => &["id", "title", "genre", "published_year", "author_id"],
            EntityKind::Copy => &["id", "inventory_number", "status", "work_id", "borrower_name"],
        }
    }

    pub(crate) fn check_field(&self, field: &str) -> AppResult<()> {
        if self.queryable_fields().contains(&field) {
            Ok(())
        } else {
            Err(AppError::Validation(format!(
                "Field {} cannot be queried on {}",
                field, self
            )))
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Author => "author",
            EntityKind::Work => "work",
            EntityKind::Copy => "copy",
        };
        f.write_str(label)
    }
}

/// A value compared against a single field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Int(i64),
    Text(String),
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

/// One stored row of any kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Author(Author),
    Work(Work),
    Copy(Exemplar),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Record::Author(_) => EntityKind::Author,
            Record::Work(_) => EntityKind::Work,
            Record::Copy(_) => EntityKind::Copy,
        }
    }

    pub fn id(&self) -> Option<i64> {
        match self {
            Record::Author(a) => a.id,
            Record::Work(w) => w.id,
            Record::Copy(c) => c.id,
        }
    }

    pub fn set_id(&mut self, id: i64) {
        match self {
            Record::Author(a) => a.id = Some(id),
            Record::Work(w) => w.id = Some(id),
            Record::Copy(c) => c.id = Some(id),
        }
    }

    /// Current value of a queryable field, `None` when the field is unset
    pub fn field(&self, name: &str) -> Option<FieldValue> {
        match (self, name) {
            (_, "id") => self.id().map(FieldValue::Int),
            (Record::Author(a), "name") => Some(FieldValue::from(a.name.as_str())),
            (Record::Author(a), "nationality") => a.nationality.clone().map(FieldValue::Text),
            (Record::Work(w), "title") => Some(FieldValue::from(w.title.as_str())),
            (Record::Work(w), "genre") => Some(FieldValue::from(w.genre.as_str())),
            (Record::Work(w), "published_year") => Some(FieldValue::Int(w.published_year as i64)),
            (Record::Work(w), "author_id") => Some(FieldValue::Int(w.author_id)),
            (Record::Copy(c), "inventory_number") => {
                Some(FieldValue::from(c.inventory_number.as_str()))
            }
            (Record::Copy(c), "status") => Some(FieldValue::from(c.status.as_str())),
            (Record::Copy(c), "work_id") => Some(FieldValue::Int(c.work_id)),
            (Record::Copy(c), "borrower_name") => c.borrower_name.clone().map(FieldValue::Text),
            _ => None,
        }
    }
}

/// A single write inside an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    /// Insert when the record has no id, otherwise update the row with that id
    Save(Record),
    /// Update an existing copy only while its stored status is still `expect_status`.
    /// A different stored status fails the batch with `InvalidTransition`.
    SaveCopyIf {
        copy: Exemplar,
        expect_status: CopyStatus,
    },
    Delete(EntityKind, i64),
}

/// Key-based persistence for authors, works and copies.
///
/// Implementations must apply a batch passed to [`EntityStore::apply`] all-or-nothing:
/// either every op is visible to readers or none is.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Fetch a row by id
    async fn load(&self, kind: EntityKind, id: i64) -> AppResult<Option<Record>>;

    /// All rows of a kind, in insertion order
    async fn list_all(&self, kind: EntityKind) -> AppResult<Vec<Record>>;

    /// Rows whose `field` equals `value`, in insertion order
    async fn list_where(
        &self,
        kind: EntityKind,
        field: &str,
        value: &FieldValue,
    ) -> AppResult<Vec<Record>>;

    async fn exists_where(&self, kind: EntityKind, field: &str, value: &FieldValue)
        -> AppResult<bool>;

    async fn count(&self, kind: EntityKind) -> AppResult<i64>;

    /// Apply an ordered batch of writes atomically.
    /// Returns the id touched by each op, in order (assigned ids for inserts).
    async fn apply(&self, ops: Vec<WriteOp>) -> AppResult<Vec<i64>>;

    /// Insert or update a single row, returning its id
    async fn save(&self, record: Record) -> AppResult<i64> {
        let ids = self.apply(vec![WriteOp::Save(record)]).await?;
        ids.first().copied().ok_or_else(|| {
            AppError::StoreUnavailable("Store did not report an id for the saved row".to_string())
        })
    }

    async fn delete(&self, kind: EntityKind, id: i64) -> AppResult<()> {
        self.apply(vec![WriteOp::Delete(kind, id)]).await?;
        Ok(())
    }
}

/// Typed view of a stored entity
pub trait Entity: Clone + Send + Sync + Sized + 'static {
    const KIND: EntityKind;

    fn into_record(self) -> Record;
    fn from_record(record: Record) -> Option<Self>;
}

impl Entity for Author {
    const KIND: EntityKind = EntityKind::Author;

    fn into_record(self) -> Record {
        Record::Author(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Author(a) => Some(a),
            _ => None,
        }
    }
}

impl Entity for Work {
    const KIND: EntityKind = EntityKind::Work;

    fn into_record(self) -> Record {
        Record::Work(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Work(w) => Some(w),
            _ => None,
        }
    }
}

impl Entity for Exemplar {
    const KIND: EntityKind = EntityKind::Copy;

    fn into_record(self) -> Record {
        Record::Copy(self)
    }

    fn from_record(record: Record) -> Option<Self> {
        match record {
            Record::Copy(c) => Some(c),
            _ => None,
        }
    }
}

fn typed<E: Entity>(record: Record) -> AppResult<E> {
    let kind = record.kind();
    E::from_record(record).ok_or_else(|| {
        AppError::StoreUnavailable(format!("Store returned a {} where a {} was expected", kind, E::KIND))
    })
}

/// Typed facade over the entity store, shared by all services
#[derive(Clone)]
pub struct Repository {
    store: Arc<dyn EntityStore>,
}

impl Repository {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self { store }
    }

    /// Repository backed by a fresh in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(memory::MemoryStore::new()))
    }

    pub async fn get<E: Entity>(&self, id: i64) -> AppResult<Option<E>> {
        self.store
            .load(E::KIND, id)
            .await?
            .map(typed::<E>)
            .transpose()
    }

    /// Like [`Repository::get`] but a missing row is an error
    pub async fn get_required<E: Entity>(&self, id: i64) -> AppResult<E> {
        self.get::<E>(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} with id {} not found", E::KIND, id)))
    }

    pub async fn list<E: Entity>(&self) -> AppResult<Vec<E>> {
        self.store
            .list_all(E::KIND)
            .await?
            .into_iter()
            .map(typed::<E>)
            .collect()
    }

    pub async fn list_where<E: Entity>(&self, field: &str, value: FieldValue) -> AppResult<Vec<E>> {
        self.store
            .list_where(E::KIND, field, &value)
            .await?
            .into_iter()
            .map(typed::<E>)
            .collect()
    }

    pub async fn exists<E: Entity>(&self, id: i64) -> AppResult<bool> {
        self.store.exists_where(E::KIND, "id", &FieldValue::Int(id)).await
    }

    pub async fn exists_where<E: Entity>(&self, field: &str, value: FieldValue) -> AppResult<bool> {
        self.store.exists_where(E::KIND, field, &value).await
    }

    pub async fn count<E: Entity>(&self) -> AppResult<i64> {
        self.store.count(E::KIND).await
    }

    /// Insert or update one entity, returning it with its id set
    pub async fn save<E: Entity>(&self, entity: E) -> AppResult<E> {
        let mut record = entity.into_record();
        let id = self.store.save(record.clone()).await?;
        record.set_id(id);
        typed::<E>(record)
    }

    /// Write a copy whose status change was decided from `expect_status`.
    /// Fails with `InvalidTransition` when another writer changed the status first.
    pub async fn save_copy_if(&self, copy: Exemplar, expect_status: CopyStatus) -> AppResult<Exemplar> {
        if copy.id.is_none() {
            return Err(AppError::Validation(
                "A conditional copy write needs an existing copy".to_string(),
            ));
        }
        self.store
            .apply(vec![WriteOp::SaveCopyIf {
                copy: copy.clone(),
                expect_status,
            }])
            .await?;
        Ok(copy)
    }

    pub async fn delete<E: Entity>(&self, id: i64) -> AppResult<()> {
        self.store.delete(E::KIND, id).await
    }

    pub async fn apply(&self, ops: Vec<WriteOp>) -> AppResult<Vec<i64>> {
        self.store.apply(ops).await
    }
}
