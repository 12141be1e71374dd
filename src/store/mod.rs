//! Ordered, index-addressed storage.
//!
//! Both the sentence ledger and the request queue sit on [`IndexedStore`], so
//! the orchestration logic runs the same against memory or disk.
mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;

/// A dense, 0-based, append-only collection whose slots can be rewritten.
pub trait IndexedStore<T> {
    /// Add `value` at index `len()`.
    fn append(&mut self, value: T) -> Result<()>;

    /// Read the value at `index`, failing with a lookup fault when absent.
    fn get(&self, index: usize) -> Result<T>;

    /// Overwrite an existing slot, failing with a lookup fault when absent.
    fn set(&mut self, index: usize, value: T) -> Result<()>;

    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every value while keeping the backing resource usable.
    fn clear(&mut self) -> Result<()>;

    /// Release the backing resource. Calling it twice is harmless.
    fn destroy(&mut self) -> Result<()>;
}

#[cfg(test)]
mod contract {
    //! Behavior every backend must share.
    use super::IndexedStore;
    use crate::error::WhisperError;

    pub(super) fn exercise<S: IndexedStore<String>>(store: &mut S) {
        assert!(store.is_empty().expect("empty"));
        store.append("zero".to_string()).expect("append 0");
        store.append("one".to_string()).expect("append 1");
        assert_eq!(store.len().expect("len"), 2);
        assert_eq!(store.get(0).expect("get 0"), "zero");
        assert_eq!(store.get(1).expect("get 1"), "one");

        store.set(1, "uno".to_string()).expect("set 1");
        assert_eq!(store.get(1).expect("get 1"), "uno");

        assert!(matches!(
            store.get(2),
            Err(WhisperError::Lookup { index: 2, .. })
        ));
        assert!(matches!(
            store.set(5, "five".to_string()),
            Err(WhisperError::Lookup { index: 5, .. })
        ));

        store.clear().expect("clear");
        assert_eq!(store.len().expect("len after clear"), 0);
        store.append("again".to_string()).expect("append after clear");
        assert_eq!(store.get(0).expect("index restarts at 0"), "again");

        store.destroy().expect("destroy");
        store.destroy().expect("destroy twice");
        assert!(matches!(store.len(), Err(WhisperError::StoreDestroyed)));
    }
}
