//! Infrastructure layer: persistence adapter and first-run seeding.

pub mod seed;
pub mod table_store;
pub mod tables;

pub use table_store::{DirectoryTableStore, InMemoryTableStore, StoreError, TableStore};
pub use tables::{collections, initialize, Snapshot};
