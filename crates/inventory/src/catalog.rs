//! Catalog store: items, categories and locations.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use stockroom_core::{
    CategoryId, Clock, DomainError, DomainResult, Entity, EntityKind, ItemId, LocationId,
};

use crate::category::{Category, LabelPatch, Location};
use crate::item::{Item, ItemFilter, ItemPatch, NewItem};

/// Owns the Category, Location and Item tables.
///
/// Tables are keyed by UUIDv7 ids, so iteration order is creation order.
/// Writes validate first and touch the table only once everything checks out.
pub struct CatalogStore {
    clock: Arc<dyn Clock>,
    categories: RwLock<BTreeMap<CategoryId, Category>>,
    locations: RwLock<BTreeMap<LocationId, Location>>,
    items: RwLock<BTreeMap<ItemId, Item>>,
}

impl core::fmt::Debug for CatalogStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CatalogStore")
            .field("categories", &read(&self.categories).len())
            .field("locations", &read(&self.locations).len())
            .field("items", &read(&self.items).len())
            .finish()
    }
}

impl CatalogStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::from_tables(clock, Vec::new(), Vec::new(), Vec::new())
    }

    /// Rehydrate from persisted tables. Records are trusted as-is.
    pub fn from_tables(
        clock: Arc<dyn Clock>,
        categories: Vec<Category>,
        locations: Vec<Location>,
        items: Vec<Item>,
    ) -> Self {
        Self {
            clock,
            categories: RwLock::new(categories.into_iter().map(|c| (c.id, c)).collect()),
            locations: RwLock::new(locations.into_iter().map(|l| (l.id, l)).collect()),
            items: RwLock::new(items.into_iter().map(|i| (i.id, i)).collect()),
        }
    }

    pub(crate) fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Categories
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_category(
        &self,
        name: &str,
        description: Option<String>,
    ) -> DomainResult<Category> {
        let name = required_name(name)?;
        let category = Category {
            id: CategoryId::new(),
            name,
            description,
        };
        write(&self.categories).insert(category.id, category.clone());
        tracing::info!(category_id = %category.id, "category created");
        Ok(category)
    }

    pub fn update_category(&self, id: CategoryId, patch: LabelPatch) -> DomainResult<Category> {
        let name = patch.name.as_deref().map(required_name).transpose()?;
        let mut categories = write(&self.categories);
        let category = categories
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Category, id))?;
        if let Some(name) = name {
            category.name = name;
        }
        if let Some(description) = patch.description {
            category.description = description;
        }
        tracing::info!(category_id = %id, "category updated");
        Ok(category.clone())
    }

    /// Fails with `Conflict` while any item still references the category.
    pub fn delete_category(&self, id: CategoryId) -> DomainResult<()> {
        let items = read(&self.items);
        let mut categories = write(&self.categories);
        if !categories.contains_key(&id) {
            return Err(DomainError::not_found(EntityKind::Category, id));
        }
        let in_use = items.values().filter(|i| i.category_id == id).count();
        if in_use > 0 {
            return Err(DomainError::conflict(
                EntityKind::Category,
                id,
                format!("referenced by {in_use} item(s)"),
            ));
        }
        categories.remove(&id);
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }

    pub fn get_category(&self, id: CategoryId) -> DomainResult<Category> {
        get(&self.categories, id)
    }

    pub fn list_categories(&self) -> Vec<Category> {
        read(&self.categories).values().cloned().collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Locations
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_location(
        &self,
        name: &str,
        description: Option<String>,
    ) -> DomainResult<Location> {
        let name = required_name(name)?;
        let location = Location {
            id: LocationId::new(),
            name,
            description,
        };
        write(&self.locations).insert(location.id, location.clone());
        tracing::info!(location_id = %location.id, "location created");
        Ok(location)
    }

    pub fn update_location(&self, id: LocationId, patch: LabelPatch) -> DomainResult<Location> {
        let name = patch.name.as_deref().map(required_name).transpose()?;
        let mut locations = write(&self.locations);
        let location = locations
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Location, id))?;
        if let Some(name) = name {
            location.name = name;
        }
        if let Some(description) = patch.description {
            location.description = description;
        }
        tracing::info!(location_id = %id, "location updated");
        Ok(location.clone())
    }

    /// Fails with `Conflict` while any item is still stored at the location.
    pub fn delete_location(&self, id: LocationId) -> DomainResult<()> {
        let items = read(&self.items);
        let mut locations = write(&self.locations);
        if !locations.contains_key(&id) {
            return Err(DomainError::not_found(EntityKind::Location, id));
        }
        let in_use = items.values().filter(|i| i.location_id == id).count();
        if in_use > 0 {
            return Err(DomainError::conflict(
                EntityKind::Location,
                id,
                format!("referenced by {in_use} item(s)"),
            ));
        }
        locations.remove(&id);
        tracing::info!(location_id = %id, "location deleted");
        Ok(())
    }

    pub fn get_location(&self, id: LocationId) -> DomainResult<Location> {
        get(&self.locations, id)
    }

    pub fn list_locations(&self) -> Vec<Location> {
        read(&self.locations).values().cloned().collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Items
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_item(&self, new: NewItem) -> DomainResult<Item> {
        new.validate()?;
        let now = self.clock.now();

        // Lock order: items, then categories, then locations.
        let mut items = write(&self.items);
        self.ensure_references(new.category_id, new.location_id)?;
        ensure_unique_code(&items, &new.code, None)?;

        let item = Item {
            id: ItemId::new(),
            code: new.code.trim().to_string(),
            name: new.name.trim().to_string(),
            category_id: new.category_id,
            location_id: new.location_id,
            amount: new.amount,
            min_stock: new.min_stock,
            image_ref: new.image_ref,
            created_at: now,
            updated_at: now,
        };
        items.insert(item.id, item.clone());
        tracing::info!(item_id = %item.id, code = %item.code, amount = item.amount, "item created");
        Ok(item)
    }

    pub fn update_item(&self, id: ItemId, patch: ItemPatch) -> DomainResult<Item> {
        patch.validate()?;
        let now = self.clock.now();

        let mut items = write(&self.items);
        let current = items
            .get(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Item, id))?;
        self.ensure_references(
            patch.category_id.unwrap_or(current.category_id),
            patch.location_id.unwrap_or(current.location_id),
        )?;
        if let Some(code) = &patch.code {
            ensure_unique_code(&items, code, Some(id))?;
        }

        let Some(item) = items.get_mut(&id) else {
            return Err(DomainError::not_found(EntityKind::Item, id));
        };
        patch.apply_to(item);
        item.updated_at = now;
        tracing::info!(item_id = %id, "item updated");
        Ok(item.clone())
    }

    /// Removes the item. Movements already recorded against it are kept.
    pub fn delete_item(&self, id: ItemId) -> DomainResult<()> {
        match write(&self.items).remove(&id) {
            Some(_) => {
                tracing::info!(item_id = %id, "item deleted");
                Ok(())
            }
            None => Err(DomainError::not_found(EntityKind::Item, id)),
        }
    }

    pub fn get_item(&self, id: ItemId) -> DomainResult<Item> {
        get(&self.items, id)
    }

    pub fn list_items(&self, filter: &ItemFilter) -> Vec<Item> {
        read(&self.items)
            .values()
            .filter(|item| filter.matches(item))
            .cloned()
            .collect()
    }

    pub fn low_stock_items(&self) -> Vec<Item> {
        read(&self.items)
            .values()
            .filter(|item| item.is_low_stock())
            .cloned()
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Ledger hooks (crate-private: only the ledger changes `amount`)
    // ─────────────────────────────────────────────────────────────────────────

    /// Check-and-update of an item's amount under the item table's write lock.
    ///
    /// Nothing is written when the item is missing or the result would go negative.
    pub(crate) fn apply_stock_delta(
        &self,
        id: ItemId,
        delta: i64,
        at: DateTime<Utc>,
    ) -> DomainResult<Item> {
        let mut items = write(&self.items);
        let item = items
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Item, id))?;

        let next = item.amount.checked_add(delta).ok_or_else(|| {
            DomainError::validation("quantity", "amount would overflow")
        })?;
        if next < 0 {
            return Err(DomainError::InsufficientStock {
                item_id: id.to_string(),
                available: item.amount,
                requested: -delta,
            });
        }

        item.amount = next;
        item.updated_at = at;
        Ok(item.clone())
    }

    /// Overwrite the materialized amount (reconciliation repair).
    pub(crate) fn set_amount(&self, id: ItemId, amount: i64, at: DateTime<Utc>) -> DomainResult<()> {
        let mut items = write(&self.items);
        let item = items
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(EntityKind::Item, id))?;
        item.amount = amount;
        item.updated_at = at;
        Ok(())
    }

    fn ensure_references(&self, category_id: CategoryId, location_id: LocationId) -> DomainResult<()> {
        if !read(&self.categories).contains_key(&category_id) {
            return Err(DomainError::not_found(EntityKind::Category, category_id));
        }
        if !read(&self.locations).contains_key(&location_id) {
            return Err(DomainError::not_found(EntityKind::Location, location_id));
        }
        Ok(())
    }
}

fn required_name(name: &str) -> DomainResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DomainError::validation("name", "cannot be empty"));
    }
    Ok(name.to_string())
}

/// Codes compare case-insensitively after trimming.
fn ensure_unique_code(
    items: &BTreeMap<ItemId, Item>,
    code: &str,
    except: Option<ItemId>,
) -> DomainResult<()> {
    let wanted = code.trim().to_lowercase();
    let clash = items
        .values()
        .find(|i| Some(i.id) != except && i.code.to_lowercase() == wanted);
    match clash {
        Some(existing) => Err(DomainError::conflict(
            EntityKind::Item,
            existing.id,
            format!("code '{}' already in use", existing.code),
        )),
        None => Ok(()),
    }
}

fn get<E>(table: &RwLock<BTreeMap<E::Id, E>>, id: E::Id) -> DomainResult<E>
where
    E: Entity + Clone,
    E::Id: Ord,
{
    read(table)
        .get(&id)
        .cloned()
        .ok_or_else(|| DomainError::not_found(E::KIND, id))
}

// Writers validate before mutating, so a poisoned table is still consistent.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
