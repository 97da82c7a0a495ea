//! Inventory domain module: catalog and stock ledger.
//!
//! This crate contains business rules for inventory, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage). The catalog owns
//! items, categories and locations; the ledger owns the movement log and is
//! the only writer of an item's `amount`.

pub mod catalog;
pub mod category;
pub mod item;
pub mod ledger;
pub mod movement;
pub mod totals;

pub use catalog::CatalogStore;
pub use category::{Category, LabelPatch, Location};
pub use item::{is_low_stock, Item, ItemFilter, ItemPatch, NewItem};
pub use ledger::{AmountMismatch, History, LedgerEngine, ReconcileReport};
pub use movement::{MovementType, StockMovement};
pub use totals::{daily_totals, weekly_totals, DailyTotals, DayTotals};
