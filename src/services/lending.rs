//! Lending lifecycle of a single copy.
//!
//! `borrow` and `return_copy` are the only ways in and out of `BORROWED`.
//! `LOST` and `DAMAGED` are administrative states set through `set_status`.

use chrono::{Duration, NaiveDate};

use crate::{
    config::LendingConfig,
    error::{AppError, AppResult},
    models::{CopyStatus, Exemplar},
};

#[derive(Debug, Clone)]
pub struct LendingStateMachine {
    loan_duration: Duration,
}

impl LendingStateMachine {
    pub fn new(config: &LendingConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            loan_duration: Duration::days(config.loan_duration_days),
        })
    }

    /// AVAILABLE -> BORROWED
    pub fn borrow(&self, copy: &mut Exemplar, borrower_name: &str, today: NaiveDate) -> AppResult<()> {
        if copy.status != CopyStatus::Available {
            return Err(AppError::InvalidTransition("copy is not available".to_string()));
        }
        let borrower_name = borrower_name.trim();
        if borrower_name.is_empty() {
            return Err(AppError::Validation("Borrower name must not be empty".to_string()));
        }
        let due_date = today.checked_add_signed(self.loan_duration).ok_or_else(|| {
            AppError::Validation(format!("Due date after {} is out of range", today))
        })?;

        copy.status = CopyStatus::Borrowed;
        copy.borrower_name = Some(borrower_name.to_string());
        copy.borrow_date = Some(today);
        copy.due_date = Some(due_date);
        Ok(())
    }

    /// Any state -> AVAILABLE. Returning a copy that is not borrowed just resets the bookkeeping.
    pub fn return_copy(&self, copy: &mut Exemplar, today: NaiveDate) {
        copy.status = CopyStatus::Available;
        clear_loan(copy);
        copy.return_date = Some(today);
    }

    /// Administrative status change. BORROWED can only be reached through `borrow`.
    pub fn set_status(&self, copy: &mut Exemplar, status: CopyStatus) -> AppResult<()> {
        match status {
            CopyStatus::Borrowed => Err(AppError::InvalidTransition(
                "copy can only become borrowed through a loan".to_string(),
            )),
            CopyStatus::Available => {
                copy.status = status;
                clear_loan(copy);
                Ok(())
            }
            // the last loan stays on record
            CopyStatus::Lost | CopyStatus::Damaged => {
                copy.status = status;
                Ok(())
            }
        }
    }

    pub fn is_overdue(&self, copy: &Exemplar, today: NaiveDate) -> bool {
        copy.status == CopyStatus::Borrowed && copy.due_date.map(|due| due < today).unwrap_or(false)
    }
}

impl Default for LendingStateMachine {
    fn default() -> Self {
        Self {
            loan_duration: Duration::days(LendingConfig::default().loan_duration_days),
        }
    }
}

fn clear_loan(copy: &mut Exemplar) {
    copy.borrower_name = None;
    copy.borrow_date = None;
    copy.due_date = None;
}
