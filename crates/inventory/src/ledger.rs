//! Ledger engine: the append-only movement log and the only writer of `Item::amount`.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, TimeZone};
use serde::Serialize;

use stockroom_core::{DomainError, DomainResult, ItemId, MovementId, UserId};

use crate::catalog::CatalogStore;
use crate::movement::{MovementType, StockMovement};
use crate::totals::{self, DailyTotals, DayTotals};

/// Owns the movement log and keeps item amounts in step with it.
///
/// The log is kept sorted by `created_at` (ties in append order) behind an
/// `Arc`, so readers take cheap snapshots while writers copy on write.
#[derive(Debug)]
pub struct LedgerEngine {
    catalog: Arc<CatalogStore>,
    log: RwLock<Arc<Vec<StockMovement>>>,
}

impl LedgerEngine {
    pub fn new(catalog: Arc<CatalogStore>) -> Self {
        Self::with_movements(catalog, Vec::new())
    }

    /// Rehydrate from a persisted log (any order).
    pub fn with_movements(catalog: Arc<CatalogStore>, mut movements: Vec<StockMovement>) -> Self {
        movements.sort_by_key(|m| m.created_at);
        Self {
            catalog,
            log: RwLock::new(Arc::new(movements)),
        }
    }

    pub fn catalog(&self) -> &Arc<CatalogStore> {
        &self.catalog
    }

    /// Record a movement and apply it to the item's amount as one step.
    ///
    /// Outbound movements larger than the amount on hand are rejected with
    /// `InsufficientStock`. On any error nothing is appended or changed.
    pub fn record_movement(
        &self,
        item_id: ItemId,
        kind: MovementType,
        quantity: i64,
        user_id: UserId,
        notes: Option<String>,
    ) -> DomainResult<StockMovement> {
        if quantity <= 0 {
            return Err(DomainError::validation("quantity", "must be greater than zero"));
        }
        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());

        // Lock order: movement log, then the item table (inside the catalog).
        let mut log = write(&self.log);
        let now = self.catalog.clock().now();
        let item = self
            .catalog
            .apply_stock_delta(item_id, kind.signed(quantity), now)
            .inspect_err(|e| {
                tracing::debug!(item_id = %item_id, %kind, quantity, error = %e, "movement rejected");
            })?;

        let movement = StockMovement {
            id: MovementId::new(),
            item_id,
            kind,
            quantity,
            notes,
            user_id,
            created_at: now,
        };
        let entries = Arc::make_mut(&mut log);
        let at = entries.partition_point(|m| m.created_at <= movement.created_at);
        entries.insert(at, movement.clone());

        tracing::info!(
            movement_id = %movement.id,
            item_id = %item_id,
            user_id = %user_id,
            %kind,
            quantity,
            amount = item.amount,
            "stock movement recorded"
        );
        if item.is_low_stock() {
            tracing::info!(item_id = %item_id, amount = item.amount, min_stock = item.min_stock, "item below minimum stock");
        }
        Ok(movement)
    }

    /// Movements of one item, newest first, over a snapshot taken now.
    pub fn history(&self, item_id: ItemId) -> History {
        History {
            item_id: Some(item_id),
            snapshot: self.snapshot(),
        }
    }

    /// The whole log, newest first.
    pub fn movements(&self) -> History {
        History {
            item_id: None,
            snapshot: self.snapshot(),
        }
    }

    pub fn len(&self) -> usize {
        read(&self.log).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The whole log in storage order (oldest first), for persisting.
    pub fn export(&self) -> Vec<StockMovement> {
        self.snapshot().as_ref().clone()
    }

    pub fn daily_totals<Tz: TimeZone>(&self, day: NaiveDate, tz: &Tz) -> DailyTotals {
        totals::daily_totals(self.snapshot().iter(), day, tz)
    }

    pub fn weekly_totals<Tz: TimeZone>(&self, end_day: NaiveDate, tz: &Tz) -> Vec<DayTotals> {
        totals::weekly_totals(self.snapshot().iter(), end_day, tz)
    }

    /// Compare every item that has movements against the ledger-derived amount.
    ///
    /// Items with no movements are taken at their recorded amount. Movements of
    /// deleted items are counted but never flagged.
    pub fn reconcile(&self) -> ReconcileReport {
        let snapshot = self.snapshot();
        let mut derived: HashMap<ItemId, i64> = HashMap::new();
        for m in snapshot.iter() {
            *derived.entry(m.item_id).or_default() += m.delta();
        }

        let mut report = ReconcileReport::default();
        for (item_id, amount) in derived {
            match self.catalog.get_item(item_id) {
                Ok(item) if amount < 0 && item.amount == 0 => {
                    tracing::warn!(item_id = %item_id, derived = amount, "ledger is overdrawn; amount held at zero");
                    report.overdrawn_items.push(item_id);
                }
                Ok(item) if item.amount != amount.max(0) => {
                    tracing::warn!(
                        item_id = %item_id,
                        recorded = item.amount,
                        derived = amount,
                        "item amount disagrees with ledger"
                    );
                    report.mismatches.push(AmountMismatch {
                        item_id,
                        recorded: item.amount,
                        derived: amount,
                    });
                }
                Ok(_) => {}
                Err(_) => report.orphaned_items += 1,
            }
        }
        report.mismatches.sort_by_key(|m| m.item_id);
        report.overdrawn_items.sort();
        report
    }

    /// Overwrite mismatched amounts with the ledger-derived values.
    ///
    /// A negative derived amount is clamped to zero and still reported.
    pub fn repair(&self, report: &ReconcileReport) -> DomainResult<()> {
        let _log = write(&self.log);
        let now = self.catalog.clock().now();
        for m in &report.mismatches {
            let amount = m.derived.max(0);
            self.catalog.set_amount(m.item_id, amount, now)?;
            tracing::warn!(item_id = %m.item_id, from = m.recorded, to = amount, "item amount repaired from ledger");
        }
        Ok(())
    }

    fn snapshot(&self) -> Arc<Vec<StockMovement>> {
        Arc::clone(&read(&self.log))
    }
}

/// Read-only, restartable view over a log snapshot, newest first.
///
/// Filtering happens while iterating; iterating again starts over from the
/// same snapshot.
#[derive(Debug, Clone)]
pub struct History {
    item_id: Option<ItemId>,
    snapshot: Arc<Vec<StockMovement>>,
}

impl History {
    pub fn iter(&self) -> impl Iterator<Item = &StockMovement> + '_ {
        let item_id = self.item_id;
        self.snapshot
            .iter()
            .rev()
            .filter(move |m| item_id.is_none_or(|id| id == m.item_id))
    }

    pub fn to_vec(&self) -> Vec<StockMovement> {
        self.iter().cloned().collect()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a StockMovement;
    type IntoIter = Box<dyn Iterator<Item = &'a StockMovement> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

/// One item whose stored amount disagrees with its movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountMismatch {
    pub item_id: ItemId,
    pub recorded: i64,
    pub derived: i64,
}

/// Outcome of a load-time consistency check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub mismatches: Vec<AmountMismatch>,
    /// Items whose movements sum below zero and whose amount already sits at zero.
    /// Not repairable from the ledger, so not counted as mismatches.
    pub overdrawn_items: Vec<ItemId>,
    /// Items that have movements but no longer exist in the catalog.
    pub orphaned_items: usize,
}

impl ReconcileReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
