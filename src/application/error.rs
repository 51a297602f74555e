use thiserror::Error;

use crate::domain::{AmountError, ExpenseError, LedgerImbalance};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Player already exists: {0}")]
    PlayerAlreadyExists(String),

    #[error("Invalid player name: {0:?}")]
    InvalidName(String),

    #[error("Player {name} is still part of {expenses} food expense(s); delete those first")]
    PlayerHasExpenses { name: String, expenses: i64 },

    #[error("Food expense not found: {0}")]
    ExpenseNotFound(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    #[error("Invalid expense: {0}")]
    InvalidExpense(#[from] ExpenseError),

    #[error(transparent)]
    LedgerImbalance(#[from] LedgerImbalance),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors caused by the caller's input rather than the system.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::InvalidAmount(_) | AppError::InvalidExpense(_) | AppError::InvalidName(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::PlayerNotFound(_) | AppError::ExpenseNotFound(_)
        )
    }
}
