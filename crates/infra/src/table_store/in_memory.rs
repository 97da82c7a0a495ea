use std::collections::HashMap;
use std::sync::RwLock;

use super::r#trait::{StoreError, TableStore};

/// In-memory table store.
///
/// Intended for tests/dev. Contents vanish with the process.
#[derive(Debug, Default)]
pub struct InMemoryTableStore {
    tables: RwLock<HashMap<String, String>>,
}

impl InMemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TableStore for InMemoryTableStore {
    fn load(&self, collection: &str) -> Result<Option<String>, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::LockPoisoned)?;
        Ok(tables.get(collection).cloned())
    }

    fn save(&self, collection: &str, value: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        tables.insert(collection.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, collection: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::LockPoisoned)?;
        tables.remove(collection);
        Ok(())
    }
}
