use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, Entity, EntityKind, ItemId, LocationId};

/// One stock-keeping unit and its quantity on hand.
///
/// `amount` is a materialized view of the movement ledger. Only the ledger
/// changes it after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub code: String,
    pub name: String,
    pub category_id: CategoryId,
    pub location_id: LocationId,
    pub amount: i64,
    pub min_stock: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Item {
    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self)
    }
}

impl Entity for Item {
    type Id = ItemId;
    const KIND: EntityKind = EntityKind::Item;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// `amount < min_stock`. Equality is not low stock.
pub fn is_low_stock(item: &Item) -> bool {
    item.amount < item.min_stock
}

/// Input for creating an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub code: String,
    pub name: String,
    pub category_id: CategoryId,
    pub location_id: LocationId,
    pub amount: i64,
    pub min_stock: i64,
    #[serde(default)]
    pub image_ref: Option<String>,
}

impl NewItem {
    pub(crate) fn validate(&self) -> DomainResult<()> {
        validate_code(&self.code)?;
        validate_name(&self.name)?;
        if self.amount < 0 {
            return Err(DomainError::validation("amount", "cannot be negative"));
        }
        validate_min_stock(self.min_stock)
    }
}

/// Partial update for an item.
///
/// There is deliberately no `amount` here: quantity changes go through the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub code: Option<String>,
    pub name: Option<String>,
    pub category_id: Option<CategoryId>,
    pub location_id: Option<LocationId>,
    pub min_stock: Option<i64>,
    pub image_ref: Option<Option<String>>,
}

impl ItemPatch {
    pub(crate) fn validate(&self) -> DomainResult<()> {
        if let Some(code) = &self.code {
            validate_code(code)?;
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(min_stock) = self.min_stock {
            validate_min_stock(min_stock)?;
        }
        Ok(())
    }

    pub(crate) fn apply_to(self, item: &mut Item) {
        if let Some(code) = self.code {
            item.code = code.trim().to_string();
        }
        if let Some(name) = self.name {
            item.name = name.trim().to_string();
        }
        if let Some(category_id) = self.category_id {
            item.category_id = category_id;
        }
        if let Some(location_id) = self.location_id {
            item.location_id = location_id;
        }
        if let Some(min_stock) = self.min_stock {
            item.min_stock = min_stock;
        }
        if let Some(image_ref) = self.image_ref {
            item.image_ref = image_ref;
        }
    }
}

/// Item listing filter. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    /// Case-insensitive substring of `code` or `name`.
    pub text: Option<String>,
    pub category_id: Option<CategoryId>,
    pub location_id: Option<LocationId>,
}

impl ItemFilter {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        let text_ok = match self.text.as_deref() {
            None => true,
            Some(needle) => {
                let needle = needle.to_lowercase();
                item.code.to_lowercase().contains(&needle) || item.name.to_lowercase().contains(&needle)
            }
        };
        text_ok
            && self.category_id.is_none_or(|c| c == item.category_id)
            && self.location_id.is_none_or(|l| l == item.location_id)
    }
}

fn validate_code(code: &str) -> DomainResult<()> {
    if code.trim().is_empty() {
        return Err(DomainError::validation("code", "cannot be empty"));
    }
    Ok(())
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("name", "cannot be empty"));
    }
    Ok(())
}

fn validate_min_stock(min_stock: i64) -> DomainResult<()> {
    if min_stock < 0 {
        return Err(DomainError::validation("minStock", "cannot be negative"));
    }
    Ok(())
}
