//! Journal persistence
//!
//! The coordinator appends every committed batch of journal entries to a
//! [`LedgerStore`] before making the change visible. An append failure
//! aborts the enclosing operation unless reading the store back shows the
//! whole batch already landed.

mod jsonl;
mod memory;
mod traits;

pub use jsonl::JsonLinesStore;
pub use memory::InMemoryStore;
pub use traits::{LedgerStore, StoreError, StoreResult};
