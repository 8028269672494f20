//! Exemplar (physical copy of a work) model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::AppError;

/// Availability status of a copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "copy_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CopyStatus {
    Available,
    Borrowed,
    Lost,
    Damaged,
}

impl CopyStatus {
    /// Every status, in display order
    pub const ALL: [CopyStatus; 4] = [
        CopyStatus::Available,
        CopyStatus::Borrowed,
        CopyStatus::Lost,
        CopyStatus::Damaged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CopyStatus::Available => "AVAILABLE",
            CopyStatus::Borrowed => "BORROWED",
            CopyStatus::Lost => "LOST",
            CopyStatus::Damaged => "DAMAGED",
        }
    }
}

impl Default for CopyStatus {
    fn default() -> Self {
        CopyStatus::Available
    }
}

impl fmt::Display for CopyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CopyStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CopyStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown copy status: {}", s)))
    }
}

/// Full copy model from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Exemplar {
    pub id: Option<i64>,
    pub inventory_number: String,
    pub status: CopyStatus,
    pub work_id: i64,
    // Loan bookkeeping, set by borrow / return
    pub borrower_name: Option<String>,
    pub borrow_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}

/// Create / update copy request. Status is never part of it.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CopyData {
    /// Inventory number, unique across all copies
    #[validate(length(min = 1, max = 6, message = "Inventory number must be 1 to 6 characters"))]
    pub inventory_number: String,
    pub work_id: i64,
}

impl From<CopyData> for Exemplar {
    fn from(data: CopyData) -> Self {
        Self {
            id: None,
            inventory_number: data.inventory_number,
            status: CopyStatus::default(),
            work_id: data.work_id,
            borrower_name: None,
            borrow_date: None,
            due_date: None,
            return_date: None,
        }
    }
}

impl Exemplar {
    pub fn apply(&mut self, data: CopyData) {
        self.inventory_number = data.inventory_number;
        self.work_id = data.work_id;
    }
}
