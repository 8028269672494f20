//! Ownership cascade on delete: authors own works, works own copies

use crate::{
    error::AppResult,
    models::{Author, Exemplar, Work},
    repository::{Entity, FieldValue, Repository, WriteOp},
};

/// Rows removed by one delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub authors: usize,
    pub works: usize,
    pub copies: usize,
}

#[derive(Clone)]
pub struct CascadeManager {
    repository: Repository,
}

impl CascadeManager {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Delete an author with every work and copy it owns
    pub async fn delete_author(&self, id: i64) -> AppResult<CascadeReport> {
        self.repository.get_required::<Author>(id).await?;

        let works: Vec<Work> = self
            .repository
            .list_where("author_id", FieldValue::Int(id))
            .await?;

        let mut ops = Vec::new();
        for work in &works {
            if let Some(work_id) = work.id {
                ops.extend(self.copy_deletes(work_id).await?);
            }
        }
        let copies = ops.len();
        ops.extend(
            works
                .iter()
                .filter_map(|w| w.id)
                .map(|work_id| WriteOp::Delete(Work::KIND, work_id)),
        );
        ops.push(WriteOp::Delete(Author::KIND, id));

        self.repository.apply(ops).await?;

        let report = CascadeReport {
            authors: 1,
            works: works.len(),
            copies,
        };
        tracing::info!(
            "Deleted author id={} with {} works and {} copies",
            id,
            report.works,
            report.copies
        );
        Ok(report)
    }

    /// Delete a work with every copy it owns
    pub async fn delete_work(&self, id: i64) -> AppResult<CascadeReport> {
        self.repository.get_required::<Work>(id).await?;

        let mut ops = self.copy_deletes(id).await?;
        let copies = ops.len();
        ops.push(WriteOp::Delete(Work::KIND, id));

        self.repository.apply(ops).await?;

        tracing::info!("Deleted work id={} with {} copies", id, copies);
        Ok(CascadeReport {
            authors: 0,
            works: 1,
            copies,
        })
    }

    pub async fn delete_copy(&self, id: i64) -> AppResult<CascadeReport> {
        self.repository.get_required::<Exemplar>(id).await?;
        self.repository.delete::<Exemplar>(id).await?;

        tracing::info!("Deleted copy id={}", id);
        Ok(CascadeReport {
            authors: 0,
            works: 0,
            copies: 1,
        })
    }

    async fn copy_deletes(&self, work_id: i64) -> AppResult<Vec<WriteOp>> {
        let copies: Vec<Exemplar> = self
            .repository
            .list_where("work_id", FieldValue::Int(work_id))
            .await?;
        Ok(copies
            .into_iter()
            .filter_map(|c| c.id)
            .map(|id| WriteOp::Delete(Exemplar::KIND, id))
            .collect())
    }
}
