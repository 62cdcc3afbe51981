use thiserror::Error;

use crate::domain::ValidationError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No expenses recorded yet ({0} does not exist)")]
    MissingStore(String),

    #[error(transparent)]
    InvalidInput(#[from] ValidationError),

    #[error("Expense #{position} has a malformed amount: '{value}'")]
    MalformedRecord { position: usize, value: String },

    #[error("Expense #{position} pushes the totals past the largest representable amount")]
    TotalOverflow { position: usize },

    #[error("No expense #{position}: the ledger has {len} expense(s)")]
    SelectionOutOfRange { position: usize, len: usize },

    #[error("Storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}
