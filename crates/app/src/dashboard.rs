//! Read-side aggregates for the dashboard and the movement feed.

use std::collections::HashMap;

use serde::Serialize;

use stockroom_auth::User;
use stockroom_core::{ItemId, UserId};
use stockroom_inventory::{DailyTotals, DayTotals, Item, StockMovement};

/// Headline figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Units on hand across all items.
    pub total_units: i64,
    pub item_count: usize,
    pub total_categories: usize,
    pub low_stock_items: usize,
    /// Movements recorded during the seven-day window.
    pub recent_movements: usize,
    /// Totals for the requested day.
    #[serde(flatten)]
    pub today: DailyTotals,
    /// Seven days ending at the requested day, oldest first.
    pub week: Vec<DayTotals>,
}

pub(crate) fn stats(items: &[Item], total_categories: usize, week: Vec<DayTotals>, recent_movements: usize) -> DashboardStats {
    let today = week.last().map(|d| d.totals).unwrap_or_default();
    DashboardStats {
        total_units: items.iter().map(|i| i.amount).sum(),
        item_count: items.len(),
        total_categories,
        low_stock_items: items.iter().filter(|i| i.is_low_stock()).count(),
        recent_movements,
        today,
        week,
    }
}

/// A movement with display names resolved.
///
/// Names are `None` when the item or user no longer exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementView {
    #[serde(flatten)]
    pub movement: StockMovement,
    pub item_name: Option<String>,
    pub user_name: Option<String>,
}

pub(crate) fn movement_views<'a>(
    movements: impl Iterator<Item = &'a StockMovement>,
    items: &[Item],
    users: &[User],
) -> Vec<MovementView> {
    let item_names: HashMap<ItemId, &str> = items.iter().map(|i| (i.id, i.name.as_str())).collect();
    let user_names: HashMap<UserId, &str> = users.iter().map(|u| (u.id, u.name.as_str())).collect();

    movements
        .map(|m| MovementView {
            movement: m.clone(),
            item_name: item_names.get(&m.item_id).map(|n| n.to_string()),
            user_name: user_names.get(&m.user_id).map(|n| n.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use stockroom_auth::Role;
    use stockroom_core::{CategoryId, LocationId, MovementId};
    use stockroom_inventory::MovementType;

    fn item(name: &str, amount: i64, min_stock: i64) -> Item {
        let now = Utc::now();
        Item {
            id: ItemId::new(),
            code: name.to_uppercase(),
            name: name.to_string(),
            category_id: CategoryId::new(),
            location_id: LocationId::new(),
            amount,
            min_stock,
            image_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn stats_sum_units_and_count_low_stock() {
        let items = vec![item("laptop", 15, 5), item("chair", 3, 10), item("paper", 10, 10)];
        let week: Vec<DayTotals> = (1..=7)
            .map(|d| DayTotals {
                day: day(d),
                totals: DailyTotals {
                    stock_in: d as i64,
                    stock_out: 0,
                },
            })
            .collect();

        let stats = stats(&items, 4, week, 9);
        assert_eq!(stats.total_units, 28);
        assert_eq!(stats.item_count, 3);
        assert_eq!(stats.total_categories, 4);
        assert_eq!(stats.low_stock_items, 1);
        assert_eq!(stats.recent_movements, 9);
        assert_eq!(stats.today.stock_in, 7);
    }

    #[test]
    fn views_resolve_names_and_tolerate_missing_ones() {
        let laptop = item("laptop", 15, 5);
        let user = User {
            id: UserId::new(),
            email: "clerk@example.test".into(),
            name: "Clerk".into(),
            role: Role::User,
            created_at: Utc::now(),
        };
        let known = StockMovement {
            id: MovementId::new(),
            item_id: laptop.id,
            kind: MovementType::In,
            quantity: 2,
            notes: None,
            user_id: user.id,
            created_at: Utc::now(),
        };
        let orphan = StockMovement {
            id: MovementId::new(),
            item_id: ItemId::new(),
            user_id: UserId::new(),
            ..known.clone()
        };

        let views = movement_views([known, orphan].iter(), &[laptop], &[user]);
        assert_eq!(views[0].item_name.as_deref(), Some("laptop"));
        assert_eq!(views[0].user_name.as_deref(), Some("Clerk"));
        assert_eq!(views[1].item_name, None);
        assert_eq!(views[1].user_name, None);

        let json = serde_json::to_value(&views[0]).unwrap();
        assert_eq!(json["type"], "in");
        assert_eq!(json["itemName"], "laptop");
    }
}
