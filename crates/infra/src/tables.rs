//! Typed access to the persisted collections.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use stockroom_auth::{Credential, User};
use stockroom_core::UserId;
use stockroom_inventory::{Category, Item, Location, StockMovement};

use crate::table_store::{StoreError, TableStore};

/// Collection names, as the browser build stored them.
pub mod collections {
    pub const USERS: &str = "inventory_users";
    pub const CREDENTIALS: &str = "inventory_credentials";
    pub const ITEMS: &str = "inventory_items";
    pub const CATEGORIES: &str = "inventory_categories";
    pub const LOCATIONS: &str = "inventory_locations";
    pub const MOVEMENTS: &str = "inventory_movements";
    pub const CURRENT_USER: &str = "inventory_current_user";

    /// The data tables (the session pointer is not one of them).
    pub const ALL: [&str; 6] = [USERS, CREDENTIALS, ITEMS, CATEGORIES, LOCATIONS, MOVEMENTS];
}

/// Every persisted record, as one value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub credentials: Vec<Credential>,
    pub categories: Vec<Category>,
    pub locations: Vec<Location>,
    pub items: Vec<Item>,
    pub movements: Vec<StockMovement>,
}

impl Snapshot {
    /// Read all collections; an absent collection reads as empty.
    pub fn load(store: &impl TableStore) -> Result<Self, StoreError> {
        Ok(Self {
            users: load_records(store, collections::USERS)?,
            credentials: load_records(store, collections::CREDENTIALS)?,
            categories: load_records(store, collections::CATEGORIES)?,
            locations: load_records(store, collections::LOCATIONS)?,
            items: load_records(store, collections::ITEMS)?,
            movements: load_records(store, collections::MOVEMENTS)?,
        })
    }
}

/// Write each collection from `seed` that the store does not have yet.
///
/// Returns the names of the collections that were seeded.
pub fn initialize(store: &impl TableStore, seed: &Snapshot) -> Result<Vec<&'static str>, StoreError> {
    let mut seeded = Vec::new();
    for name in collections::ALL {
        if store.load(name)?.is_some() {
            continue;
        }
        match name {
            collections::USERS => save_records(store, name, &seed.users)?,
            collections::CREDENTIALS => save_records(store, name, &seed.credentials)?,
            collections::CATEGORIES => save_records(store, name, &seed.categories)?,
            collections::LOCATIONS => save_records(store, name, &seed.locations)?,
            collections::ITEMS => save_records(store, name, &seed.items)?,
            _ => save_records(store, name, &seed.movements)?,
        }
        seeded.push(name);
    }
    if !seeded.is_empty() {
        tracing::info!(collections = ?seeded, "seeded absent collections");
    }
    Ok(seeded)
}

pub fn load_records<T: DeserializeOwned>(
    store: &impl TableStore,
    collection: &str,
) -> Result<Vec<T>, StoreError> {
    match store.load(collection)? {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(&text).map_err(|e| StoreError::Deserialize {
            collection: collection.to_string(),
            message: e.to_string(),
        }),
    }
}

pub fn save_records<T: Serialize>(
    store: &impl TableStore,
    collection: &str,
    records: &[T],
) -> Result<(), StoreError> {
    let text = serde_json::to_string(records).map_err(|e| StoreError::Serialize {
        collection: collection.to_string(),
        message: e.to_string(),
    })?;
    store.save(collection, &text)
}

/// The persisted "who is signed in" pointer.
pub fn load_current_user(store: &impl TableStore) -> Result<Option<UserId>, StoreError> {
    match store.load(collections::CURRENT_USER)? {
        None => Ok(None),
        Some(text) => serde_json::from_str(&text).map_err(|e| StoreError::Deserialize {
            collection: collections::CURRENT_USER.to_string(),
            message: e.to_string(),
        }),
    }
}

pub fn save_current_user(store: &impl TableStore, user: Option<UserId>) -> Result<(), StoreError> {
    match user {
        None => store.remove(collections::CURRENT_USER),
        Some(id) => {
            let text = serde_json::to_string(&id).map_err(|e| StoreError::Serialize {
                collection: collections::CURRENT_USER.to_string(),
                message: e.to_string(),
            })?;
            store.save(collections::CURRENT_USER, &text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table_store::InMemoryTableStore;
    use chrono::Utc;
    use stockroom_core::CategoryId;

    fn category(name: &str) -> Category {
        Category {
            id: CategoryId::new(),
            name: name.to_string(),
            description: None,
        }
    }

    #[test]
    fn initialize_only_fills_absent_collections() {
        let store = InMemoryTableStore::new();
        save_records(&store, collections::CATEGORIES, &[category("Tools")]).unwrap();

        let seed = Snapshot {
            categories: vec![category("Electronics"), category("Furniture")],
            ..Snapshot::default()
        };
        let seeded = initialize(&store, &seed).unwrap();
        assert!(!seeded.contains(&collections::CATEGORIES));
        assert_eq!(seeded.len(), collections::ALL.len() - 1);

        let loaded = Snapshot::load(&store).unwrap();
        assert_eq!(loaded.categories.len(), 1);
        assert_eq!(loaded.categories[0].name, "Tools");

        // Second run is a no-op.
        assert!(initialize(&store, &seed).unwrap().is_empty());
    }

    #[test]
    fn corrupt_collection_reports_its_name() {
        let store = InMemoryTableStore::new();
        store.save(collections::ITEMS, "{not json").unwrap();
        match Snapshot::load(&store).unwrap_err() {
            StoreError::Deserialize { collection, .. } => assert_eq!(collection, collections::ITEMS),
            other => panic!("Expected Deserialize error, got {other:?}"),
        }
    }

    #[test]
    fn current_user_pointer_round_trips_and_clears() {
        let store = InMemoryTableStore::new();
        assert_eq!(load_current_user(&store).unwrap(), None);
        let id = UserId::new();
        save_current_user(&store, Some(id)).unwrap();
        assert_eq!(load_current_user(&store).unwrap(), Some(id));
        save_current_user(&store, None).unwrap();
        assert_eq!(load_current_user(&store).unwrap(), None);
    }

    #[test]
    fn users_are_stored_without_credentials() {
        let store = InMemoryTableStore::new();
        let user = User {
            id: UserId::new(),
            email: "admin@inventory.com".to_string(),
            name: "Admin User".to_string(),
            role: stockroom_auth::Role::Admin,
            created_at: Utc::now(),
        };
        save_records(&store, collections::USERS, &[user]).unwrap();
        let text = store.load(collections::USERS).unwrap().unwrap();
        assert!(text.contains("\"role\":\"admin\""));
        assert!(!text.contains("password"));
    }
}
