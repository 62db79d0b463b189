use leafline_shared::{BookId, ValidationError};
use thiserror::Error;

/// Errors surfaced by ledger operations.
///
/// Storage failures are not represented here: the table layer absorbs them.
/// Missing comments are reported through `None` / `false` return values.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid comment: {0}")]
    Validation(#[from] ValidationError),

    #[error("Unknown book: {0}")]
    UnknownBook(BookId),

    #[error("Invalid import payload: {0}")]
    Format(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
