//! Demo data written on first start.
//!
//! Every item's amount is backed by movements (an opening balance plus the
//! demo activity), so a freshly seeded store reconciles cleanly.

use chrono::{DateTime, Duration, Utc};

use stockroom_auth::{AuthError, Credential, CredentialHasher, Role, User};
use stockroom_core::{CategoryId, ItemId, LocationId, MovementId, UserId};
use stockroom_inventory::{Category, Item, Location, MovementType, StockMovement};

use crate::tables::Snapshot;

pub const OPENING_BALANCE_NOTE: &str = "Opening balance";

/// Build the demo data set.
///
/// With `admin_password`, the admin account gets a hashed credential; without
/// it no account can sign in until an operator sets one.
pub fn demo_snapshot(
    now: DateTime<Utc>,
    admin_password: Option<&str>,
    hasher: &CredentialHasher,
) -> Result<Snapshot, AuthError> {
    let admin = user("admin@inventory.com", "Admin User", Role::Admin, now);
    let clerk = user("user@inventory.com", "Regular User", Role::User, now);

    let credentials = match admin_password {
        Some(password) => vec![Credential {
            user_id: admin.id,
            password_hash: hasher.hash(password)?,
        }],
        None => {
            tracing::warn!("no admin password configured; seeded accounts cannot sign in");
            Vec::new()
        }
    };

    let categories = vec![
        category("Electronics", "Electronic devices and components"),
        category("Furniture", "Office and home furniture"),
        category("Stationery", "Office supplies and stationery"),
        category("Tools", "Hardware tools and equipment"),
    ];
    let locations = vec![
        location("Warehouse A", "Main storage facility"),
        location("Warehouse B", "Secondary storage"),
        location("Store Front", "Retail display area"),
        location("Office", "Office storage"),
    ];

    let opened = now - Duration::days(2);
    let laptop = item("ELEC-001", "Laptop Dell XPS 15", &categories[0], &locations[0], 15, 5, opened, now);
    let chair = item("FURN-001", "Office Chair Ergonomic", &categories[1], &locations[1], 3, 10, opened, now);
    let paper = item("STAT-001", "A4 Paper (500 sheets)", &categories[2], &locations[3], 25, 10, opened, now);

    let movements = vec![
        movement(&laptop, MovementType::In, 5, OPENING_BALANCE_NOTE, &admin, opened),
        movement(&chair, MovementType::In, 8, OPENING_BALANCE_NOTE, &admin, opened),
        movement(&paper, MovementType::In, 25, OPENING_BALANCE_NOTE, &admin, opened),
        movement(&laptop, MovementType::In, 10, "New stock arrival", &admin, now - Duration::days(1)),
        movement(&chair, MovementType::Out, 5, "Office setup", &clerk, now - Duration::hours(12)),
    ];

    Ok(Snapshot {
        users: vec![admin, clerk],
        credentials,
        categories,
        locations,
        items: vec![laptop, chair, paper],
        movements,
    })
}

fn user(email: &str, name: &str, role: Role, now: DateTime<Utc>) -> User {
    User {
        id: UserId::new(),
        email: email.to_string(),
        name: name.to_string(),
        role,
        created_at: now,
    }
}

fn category(name: &str, description: &str) -> Category {
    Category {
        id: CategoryId::new(),
        name: name.to_string(),
        description: Some(description.to_string()),
    }
}

fn location(name: &str, description: &str) -> Location {
    Location {
        id: LocationId::new(),
        name: name.to_string(),
        description: Some(description.to_string()),
    }
}

#[allow(clippy::too_many_arguments)]
fn item(
    code: &str,
    name: &str,
    category: &Category,
    location: &Location,
    amount: i64,
    min_stock: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Item {
    Item {
        id: ItemId::new(),
        code: code.to_string(),
        name: name.to_string(),
        category_id: category.id,
        location_id: location.id,
        amount,
        min_stock,
        image_ref: None,
        created_at,
        updated_at,
    }
}

fn movement(
    item: &Item,
    kind: MovementType,
    quantity: i64,
    notes: &str,
    by: &User,
    at: DateTime<Utc>,
) -> StockMovement {
    StockMovement {
        id: MovementId::new(),
        item_id: item.id,
        kind,
        quantity,
        notes: Some(notes.to_string()),
        user_id: by.id,
        created_at: at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use stockroom_core::SystemClock;
    use stockroom_inventory::{CatalogStore, LedgerEngine};

    #[test]
    fn demo_data_reconciles_against_its_movements() {
        let hasher = CredentialHasher::with_cost(64, 1).unwrap();
        let seed = demo_snapshot(Utc::now(), None, &hasher).unwrap();
        assert!(seed.credentials.is_empty());

        let catalog = Arc::new(CatalogStore::from_tables(
            Arc::new(SystemClock),
            seed.categories.clone(),
            seed.locations.clone(),
            seed.items.clone(),
        ));
        let ledger = LedgerEngine::with_movements(catalog, seed.movements.clone());
        assert!(ledger.reconcile().is_consistent());
    }

    #[test]
    fn admin_password_is_hashed() {
        let hasher = CredentialHasher::with_cost(64, 1).unwrap();
        let seed = demo_snapshot(Utc::now(), Some("change-me-now"), &hasher).unwrap();
        let admin = seed.users.iter().find(|u| u.role == Role::Admin).unwrap();
        let cred = &seed.credentials[0];
        assert_eq!(cred.user_id, admin.id);
        assert!(hasher.verify("change-me-now", &cred.password_hash).unwrap());
    }

    #[test]
    fn chair_starts_below_minimum() {
        let hasher = CredentialHasher::with_cost(64, 1).unwrap();
        let seed = demo_snapshot(Utc::now(), None, &hasher).unwrap();
        let low: Vec<_> = seed.items.iter().filter(|i| i.is_low_stock()).map(|i| i.code.as_str()).collect();
        assert_eq!(low, vec!["FURN-001"]);
    }
}
