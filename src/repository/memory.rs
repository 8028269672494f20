//! In-memory entity store.
//!
//! Each kind lives in an insertion-ordered table. A whole batch is validated, then
//! applied under one write lock, so readers never see half of it.

use async_trait::async_trait;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use super::{EntityKind, EntityStore, FieldValue, Record, WriteOp};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Table {
    rows: IndexMap<i64, Record>,
    next_id: i64,
}

impl Table {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Default)]
struct Tables {
    authors: Table,
    works: Table,
    copies: Table,
}

impl Tables {
    fn table(&self, kind: EntityKind) -> &Table {
        match kind {
            EntityKind::Author => &self.authors,
            EntityKind::Work => &self.works,
            EntityKind::Copy => &self.copies,
        }
    }

    fn table_mut(&mut self, kind: EntityKind) -> &mut Table {
        match kind {
            EntityKind::Author => &mut self.authors,
            EntityKind::Work => &mut self.works,
            EntityKind::Copy => &mut self.copies,
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Reject a batch that would touch a missing row, or whose status precondition no
/// longer holds, before anything is written.
/// Rows deleted earlier in the same batch count as missing for later ops.
fn check_batch(tables: &Tables, ops: &[WriteOp]) -> AppResult<()> {
    let mut deleted: Vec<(EntityKind, i64)> = Vec::new();
    for op in ops {
        let (kind, id) = match op {
            WriteOp::Save(record) => match record.id() {
                Some(id) => (record.kind(), id),
                None => continue,
            },
            WriteOp::SaveCopyIf { copy, .. } => (EntityKind::Copy, copy.id.unwrap_or_default()),
            WriteOp::Delete(kind, id) => (*kind, *id),
        };
        let stored = tables.table(kind).rows.get(&id);
        if stored.is_none() || deleted.contains(&(kind, id)) {
            return Err(AppError::NotFound(format!("{} with id {} not found", kind, id)));
        }
        match op {
            WriteOp::SaveCopyIf { expect_status, .. } => {
                if let Some(Record::Copy(current)) = stored {
                    if current.status != *expect_status {
                        return Err(AppError::InvalidTransition(format!(
                            "copy {} is {}, expected {}",
                            id, current.status, expect_status
                        )));
                    }
                }
            }
            WriteOp::Delete(..) => deleted.push((kind, id)),
            WriteOp::Save(_) => {}
        }
    }
    Ok(())
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn load(&self, kind: EntityKind, id: i64) -> AppResult<Option<Record>> {
        let tables = self.tables.read().await;
        Ok(tables.table(kind).rows.get(&id).cloned())
    }

    async fn list_all(&self, kind: EntityKind) -> AppResult<Vec<Record>> {
        let tables = self.tables.read().await;
        Ok(tables.table(kind).rows.values().cloned().collect())
    }

    async fn list_where(
        &self,
        kind: EntityKind,
        field: &str,
        value: &FieldValue,
    ) -> AppResult<Vec<Record>> {
        kind.check_field(field)?;
        let tables = self.tables.read().await;
        Ok(tables
            .table(kind)
            .rows
            .values()
            .filter(|record| record.field(field).as_ref() == Some(value))
            .cloned()
            .collect())
    }

    async fn exists_where(
        &self,
        kind: EntityKind,
        field: &str,
        value: &FieldValue,
    ) -> AppResult<bool> {
        kind.check_field(field)?;
        let tables = self.tables.read().await;
        Ok(tables
            .table(kind)
            .rows
            .values()
            .any(|record| record.field(field).as_ref() == Some(value)))
    }

    async fn count(&self, kind: EntityKind) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.table(kind).rows.len() as i64)
    }

    async fn apply(&self, ops: Vec<WriteOp>) -> AppResult<Vec<i64>> {
        let mut tables = self.tables.write().await;
        check_batch(&tables, &ops)?;

        let mut ids = Vec::with_capacity(ops.len());
        for op in ops {
            match op {
                WriteOp::Save(mut record) => {
                    let table = tables.table_mut(record.kind());
                    let id = match record.id() {
                        Some(id) => id,
                        None => {
                            let id = table.allocate_id();
                            record.set_id(id);
                            id
                        }
                    };
                    // Updating an existing key keeps its position
                    table.rows.insert(id, record);
                    ids.push(id);
                }
                WriteOp::SaveCopyIf { copy, .. } => {
                    let id = copy.id.unwrap_or_default();
                    tables.copies.rows.insert(id, Record::Copy(copy));
                    ids.push(id);
                }
                WriteOp::Delete(kind, id) => {
                    tables.table_mut(kind).rows.shift_remove(&id);
                    ids.push(id);
                }
            }
        }
        tracing::debug!("Applied batch of {} writes", ids.len());
        Ok(ids)
    }
}
