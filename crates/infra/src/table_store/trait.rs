use std::sync::Arc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on collection '{collection}': {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize collection '{collection}': {message}")]
    Serialize { collection: String, message: String },

    #[error("failed to deserialize collection '{collection}': {message}")]
    Deserialize { collection: String, message: String },

    #[error("invalid collection name '{0}'")]
    InvalidCollection(String),

    #[error("lock poisoned")]
    LockPoisoned,
}

/// Durable key-value table store.
///
/// Keys are collection names; values are the collection's records serialized
/// as structured text (a JSON array). The store knows nothing about record types.
pub trait TableStore: Send + Sync {
    /// `Ok(None)` when the collection has never been written.
    fn load(&self, collection: &str) -> Result<Option<String>, StoreError>;

    /// Replace the collection's contents.
    fn save(&self, collection: &str, value: &str) -> Result<(), StoreError>;

    /// Drop a collection entirely. Removing an absent collection is not an error.
    fn remove(&self, collection: &str) -> Result<(), StoreError>;
}

impl<S> TableStore for Arc<S>
where
    S: TableStore + ?Sized,
{
    fn load(&self, collection: &str) -> Result<Option<String>, StoreError> {
        (**self).load(collection)
    }

    fn save(&self, collection: &str, value: &str) -> Result<(), StoreError> {
        (**self).save(collection, value)
    }

    fn remove(&self, collection: &str) -> Result<(), StoreError> {
        (**self).remove(collection)
    }
}
