use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, Entity, EntityKind, LocationId};

/// Grouping of items by kind (e.g. "Electronics").
///
/// Names are not required to be unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for Category {
    type Id = CategoryId;
    const KIND: EntityKind = EntityKind::Category;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Physical storage place (e.g. "Warehouse A").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Entity for Location {
    type Id = LocationId;
    const KIND: EntityKind = EntityKind::Location;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Partial update for a category or a location.
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

impl LabelPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }
}
