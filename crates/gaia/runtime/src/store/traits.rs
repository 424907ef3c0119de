//! Storage trait definitions

use async_trait::async_trait;
use gaia_types::JournalEntry;
use thiserror::Error;

/// Errors raised by a ledger store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only journal storage
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Durably append a batch; either all entries land or none do
    async fn append(&self, entries: &[JournalEntry]) -> StoreResult<()>;

    /// All entries in append order
    async fn entries(&self) -> StoreResult<Vec<JournalEntry>>;
}
