use thiserror::Error;

/// Errors produced by the key-value backends.
///
/// These never cross the [`TableStore`](crate::TableStore) boundary: table
/// reads fall back to defaults and table writes are dropped with a warning.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// The backing store is disabled or cannot be reached.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    /// A write would exceed the backend's byte budget.
    #[error("Storage quota exceeded: {needed} bytes needed (limit {limit})")]
    QuotaExceeded { needed: usize, limit: usize },
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
