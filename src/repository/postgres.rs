//! PostgreSQL entity store

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, Pool, Postgres, Transaction};

use super::{EntityKind, EntityStore, FieldValue, Record, WriteOp};
use crate::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
    models::{Author, CopyStatus, Exemplar, Work},
};

const COPIES_INVENTORY_NUMBER_KEY: &str = "copies_inventory_number_key";

/// Translate constraint violations into catalog errors; everything else is a store failure
fn map_db_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() && db.constraint() == Some(COPIES_INVENTORY_NUMBER_KEY) {
            return AppError::DuplicateInventoryNumber(
                "A copy with this inventory number already exists".to_string(),
            );
        }
        if db.is_foreign_key_violation() {
            return AppError::ReferenceNotFound(db.message().to_string());
        }
    }
    AppError::from(e)
}

/// A foreign key violation on DELETE means a child row appeared after the cascade
/// plan was read. The delete can be retried; it is not a dangling reference.
fn map_delete_error(e: sqlx::Error, kind: EntityKind, id: i64) -> AppError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_foreign_key_violation() {
            tracing::warn!("Delete of {} id={} blocked by new dependent rows", kind, id);
            return AppError::StoreUnavailable(format!(
                "{} with id {} gained dependent rows during the delete, retry",
                kind, id
            ));
        }
    }
    map_db_error(e)
}

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Connect using the database section of the configuration
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect(&config.url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Run pending schema migrations
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn fetch(&self, kind: EntityKind, sql: &str, value: Option<&FieldValue>) -> AppResult<Vec<Record>> {
        tracing::debug!("{}", sql);
        macro_rules! fetch_as {
            ($ty:ty, $variant:ident) => {{
                let mut query = sqlx::query_as::<_, $ty>(sql);
                query = match value {
                    Some(FieldValue::Int(v)) => query.bind(*v),
                    Some(FieldValue::Text(v)) => query.bind(v.clone()),
                    None => query,
                };
                query
                    .fetch_all(&self.pool)
                    .await?
                    .into_iter()
                    .map(Record::$variant)
                    .collect()
            }};
        }
        let records: Vec<Record> = match kind {
            EntityKind::Author => fetch_as!(Author, Author),
            EntityKind::Work => fetch_as!(Work, Work),
            EntityKind::Copy => fetch_as!(Exemplar, Copy),
        };
        Ok(records)
    }

    async fn save_in(tx: &mut Transaction<'_, Postgres>, record: &Record) -> AppResult<i64> {
        let id = match (record, record.id()) {
            (Record::Author(a), None) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO authors (name, birth_date, nationality, biography)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(&a.name)
                .bind(a.birth_date)
                .bind(&a.nationality)
                .bind(&a.biography)
                .fetch_one(&mut **tx)
                .await
            }
            (Record::Author(a), Some(id)) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    UPDATE authors
                    SET name = $2, birth_date = $3, nationality = $4, biography = $5
                    WHERE id = $1
                    RETURNING id
                    "#,
                )
                .bind(id)
                .bind(&a.name)
                .bind(a.birth_date)
                .bind(&a.nationality)
                .bind(&a.biography)
                .fetch_one(&mut **tx)
                .await
            }
            (Record::Work(w), None) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO works (title, genre, published_year, author_id)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(&w.title)
                .bind(&w.genre)
                .bind(w.published_year)
                .bind(w.author_id)
                .fetch_one(&mut **tx)
                .await
            }
            (Record::Work(w), Some(id)) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    UPDATE works
                    SET title = $2, genre = $3, published_year = $4, author_id = $5
                    WHERE id = $1
                    RETURNING id
                    "#,
                )
                .bind(id)
                .bind(&w.title)
                .bind(&w.genre)
                .bind(w.published_year)
                .bind(w.author_id)
                .fetch_one(&mut **tx)
                .await
            }
            (Record::Copy(c), None) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO copies (inventory_number, status, work_id,
                                        borrower_name, borrow_date, due_date, return_date)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id
                    "#,
                )
                .bind(&c.inventory_number)
                .bind(c.status)
                .bind(c.work_id)
                .bind(&c.borrower_name)
                .bind(c.borrow_date)
                .bind(c.due_date)
                .bind(c.return_date)
                .fetch_one(&mut **tx)
                .await
            }
            (Record::Copy(c), Some(id)) => {
                sqlx::query_scalar::<_, i64>(
                    r#"
                    UPDATE copies
                    SET inventory_number = $2, status = $3, work_id = $4,
                        borrower_name = $5, borrow_date = $6, due_date = $7, return_date = $8
                    WHERE id = $1
                    RETURNING id
                    "#,
                )
                .bind(id)
                .bind(&c.inventory_number)
                .bind(c.status)
                .bind(c.work_id)
                .bind(&c.borrower_name)
                .bind(c.borrow_date)
                .bind(c.due_date)
                .bind(c.return_date)
                .fetch_one(&mut **tx)
                .await
            }
        };

        match id {
            Ok(id) => Ok(id),
            Err(sqlx::Error::RowNotFound) => Err(AppError::NotFound(format!(
                "{} with id {} not found",
                record.kind(),
                record.id().unwrap_or_default()
            ))),
            Err(e) => Err(map_db_error(e)),
        }
    }

    async fn delete_in(tx: &mut Transaction<'_, Postgres>, kind: EntityKind, id: i64) -> AppResult<i64> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut **tx)
            .await
            .map_err(|e| map_delete_error(e, kind, id))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{} with id {} not found", kind, id)));
        }
        Ok(id)
    }

    /// Update a copy only while its stored status matches; the row lock taken by the
    /// UPDATE makes a concurrent writer re-check the status after this one commits.
    async fn save_copy_if_in(
        tx: &mut Transaction<'_, Postgres>,
        copy: &Exemplar,
        expect_status: CopyStatus,
    ) -> AppResult<i64> {
        let id = copy.id.unwrap_or_default();
        let updated = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE copies
            SET inventory_number = $2, status = $3, work_id = $4,
                borrower_name = $5, borrow_date = $6, due_date = $7, return_date = $8
            WHERE id = $1 AND status = $9
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(&copy.inventory_number)
        .bind(copy.status)
        .bind(copy.work_id)
        .bind(&copy.borrower_name)
        .bind(copy.borrow_date)
        .bind(copy.due_date)
        .bind(copy.return_date)
        .bind(expect_status)
        .fetch_optional(&mut **tx)
        .await
        .map_err(map_db_error)?;

        if let Some(id) = updated {
            return Ok(id);
        }

        let current = sqlx::query_scalar::<_, CopyStatus>("SELECT status FROM copies WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
        match current {
            Some(status) => Err(AppError::InvalidTransition(format!(
                "copy {} is {}, expected {}",
                id, status, expect_status
            ))),
            None => Err(AppError::NotFound(format!("copy with id {} not found", id))),
        }
    }
}

/// WHERE clause for a whitelisted field; text values compare against the column's text form
fn where_clause(field: &str, value: &FieldValue) -> String {
    match value {
        FieldValue::Int(_) => format!("{} = $1", field),
        FieldValue::Text(_) => format!("{}::text = $1", field),
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn load(&self, kind: EntityKind, id: i64) -> AppResult<Option<Record>> {
        let sql = format!("SELECT * FROM {} WHERE id = $1", kind.table());
        Ok(self
            .fetch(kind, &sql, Some(&FieldValue::Int(id)))
            .await?
            .into_iter()
            .next())
    }

    async fn list_all(&self, kind: EntityKind) -> AppResult<Vec<Record>> {
        let sql = format!("SELECT * FROM {} ORDER BY id", kind.table());
        self.fetch(kind, &sql, None).await
    }

    async fn list_where(
        &self,
        kind: EntityKind,
        field: &str,
        value: &FieldValue,
    ) -> AppResult<Vec<Record>> {
        kind.check_field(field)?;
        let sql = format!(
            "SELECT * FROM {} WHERE {} ORDER BY id",
            kind.table(),
            where_clause(field, value)
        );
        self.fetch(kind, &sql, Some(value)).await
    }

    async fn exists_where(
        &self,
        kind: EntityKind,
        field: &str,
        value: &FieldValue,
    ) -> AppResult<bool> {
        kind.check_field(field)?;
        let sql = format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE {})",
            kind.table(),
            where_clause(field, value)
        );
        let query = sqlx::query_scalar::<_, bool>(&sql);
        let query = match value {
            FieldValue::Int(v) => query.bind(*v),
            FieldValue::Text(v) => query.bind(v.clone()),
        };
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn count(&self, kind: EntityKind) -> AppResult<i64> {
        let sql = format!("SELECT COUNT(*) FROM {}", kind.table());
        Ok(sqlx::query_scalar::<_, i64>(&sql).fetch_one(&self.pool).await?)
    }

    async fn apply(&self, ops: Vec<WriteOp>) -> AppResult<Vec<i64>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(ops.len());
        for op in &ops {
            let id = match op {
                WriteOp::Save(record) => Self::save_in(&mut tx, record).await?,
                WriteOp::SaveCopyIf {
                    copy,
                    expect_status,
                } => Self::save_copy_if_in(&mut tx, copy, *expect_status).await?,
                WriteOp::Delete(kind, id) => Self::delete_in(&mut tx, *kind, *id).await?,
            };
            ids.push(id);
        }
        // Dropping the transaction on an early return rolls it back
        tx.commit().await?;
        tracing::debug!("Committed batch of {} writes", ids.len());
        Ok(ids)
    }
}
