use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, trace, warn};

use crate::error::{Result, StoreError};
use crate::tree::{RedBlackTree, TreeStats};

/// Sorted in-memory key-value store shared between threads.
///
/// One reader-writer lock guards the whole tree: `put` takes it exclusively,
/// `get` takes it shared. Readers never see a tree in the middle of a
/// rotation, and writers are fully serialized.
#[derive(Debug)]
pub struct Store {
    tree: RwLock<RedBlackTree>,
}

impl Store {
    /// Create a new empty store
    pub fn new() -> Self {
        debug!("creating empty store");
        Self {
            tree: RwLock::new(RedBlackTree::new()),
        }
    }

    /// Insert `key` or overwrite its value
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        let mut tree = self.write()?;
        let replaced = tree.put(key, value).is_some();
        trace!(key_len = key.len(), value_len = value.len(), replaced, "put");
        Ok(())
    }

    /// Get a copy of the value stored for `key`
    pub fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let tree = self.read()?;
        let value = tree.get(key).map(<[u8]>::to_vec);
        trace!(key_len = key.len(), found = value.is_some(), "get");
        Ok(value)
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Check every tree invariant under the shared lock
    pub fn validate(&self) -> Result<TreeStats> {
        Ok(self.read()?.validate()?)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, RedBlackTree>> {
        self.tree.read().map_err(|_| {
            warn!("read lock poisoned");
            StoreError::LockPoisoned
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, RedBlackTree>> {
        self.tree.write().map_err(|_| {
            warn!("write lock poisoned");
            StoreError::LockPoisoned
        })
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_put_and_get() {
        let store = Store::new();
        store.put(b"testkey", b"testvalue").unwrap();
        assert_eq!(store.get(b"testkey").unwrap(), Some(b"testvalue".to_vec()));
    }

    #[test]
    fn test_get_not_found() {
        let store = Store::new();
        assert_eq!(store.get(b"nonexistent").unwrap(), None);
        assert!(store.is_empty().unwrap());
    }

    #[test]
    fn test_overwrite_keeps_len() {
        let store = Store::new();
        store.put(b"key", b"v1").unwrap();
        store.put(b"key", b"v2").unwrap();
        assert_eq!(store.get(b"key").unwrap(), Some(b"v2".to_vec()));
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn test_validate_after_puts() {
        let store = Store::default();
        for i in 0u16..500 {
            store.put(&i.to_be_bytes(), b"v").unwrap();
        }
        let stats = store.validate().unwrap();
        assert_eq!(stats.len, 500);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let store = Arc::new(Store::new());
        store.put(b"key", b"value").unwrap();

        let poisoner = Arc::clone(&store);
        let result = std::thread::spawn(move || {
            let _guard = poisoner.tree.write().unwrap();
            panic!("writer failed mid-update");
        })
        .join();
        assert!(result.is_err());

        assert_eq!(store.get(b"key"), Err(StoreError::LockPoisoned));
        assert_eq!(store.put(b"key", b"other"), Err(StoreError::LockPoisoned));
    }
}
