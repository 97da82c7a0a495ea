use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{Entity, EntityKind, ItemId, MovementId, UserId};

/// Direction of a stock movement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    In,
    Out,
}

impl MovementType {
    /// Signed change this movement applies to an item's amount.
    pub fn signed(self, quantity: i64) -> i64 {
        match self {
            MovementType::In => quantity,
            MovementType::Out => -quantity,
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MovementType::In => f.write_str("in"),
            MovementType::Out => f.write_str("out"),
        }
    }
}

/// Immutable ledger entry: stock entering or leaving for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMovement {
    pub id: MovementId,
    pub item_id: ItemId,
    #[serde(rename = "type")]
    pub kind: MovementType,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn delta(&self) -> i64 {
        self.kind.signed(self.quantity)
    }
}

impl Entity for StockMovement {
    type Id = MovementId;
    const KIND: EntityKind = EntityKind::Movement;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_field_uses_wire_names() {
        let movement = StockMovement {
            id: MovementId::new(),
            item_id: ItemId::new(),
            kind: MovementType::Out,
            quantity: 5,
            notes: Some("Office setup".to_string()),
            user_id: UserId::new(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&movement).unwrap();
        assert_eq!(json["type"], "out");
        assert_eq!(json["notes"], "Office setup");
        assert_eq!(movement.delta(), -5);
    }
}
