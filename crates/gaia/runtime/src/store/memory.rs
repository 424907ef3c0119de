//! In-memory ledger store

use super::traits::{LedgerStore, StoreResult};
use async_trait::async_trait;
use gaia_types::JournalEntry;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory store for development and testing
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<Vec<JournalEntry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn append(&self, entries: &[JournalEntry]) -> StoreResult<()> {
        let mut stored = self.entries.write().await;
        stored.extend_from_slice(entries);
        Ok(())
    }

    async fn entries(&self) -> StoreResult<Vec<JournalEntry>> {
        Ok(self.entries.read().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use gaia_types::{verify_chain, JournalCursor, LedgerEvent};

    #[tokio::test]
    async fn test_append_preserves_order() {
        let store = InMemoryStore::new();
        let mut cursor = JournalCursor::default();
        let now = Utc::now();

        let first = cursor.seal(None, LedgerEvent::Unpaused, now);
        let second = cursor.seal(None, LedgerEvent::Unpaused, now);
        store.append(&[first]).await.unwrap();
        store.append(&[second]).await.unwrap();

        let entries = store.entries().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(store.len().await, 2);
        assert!(verify_chain(&entries).is_ok());
    }
}
