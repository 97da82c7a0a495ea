//! Key-value table store boundary.
//!
//! Collections are addressed by name and hold JSON text. Typed access lives
//! in [`crate::tables`].

pub mod directory;
pub mod in_memory;
pub mod r#trait;

pub use directory::DirectoryTableStore;
pub use in_memory::InMemoryTableStore;
pub use r#trait::{StoreError, TableStore};
