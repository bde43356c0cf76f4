use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::entity::Entity;
use crate::types::Event;

/// One immutable audit record describing a change to a tracked entity.
///
/// `object` holds the entity's attributes as they were immediately before
/// the change; it is absent for `create` events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: i64,
    pub item_type: String,
    pub item_id: i64,
    pub event: Event,
    pub whodunnit: Option<String>,
    pub object: Option<Map<String, Value>>,
    pub created_at: DateTime<Utc>,
}

impl Version {
    /// Rebuild the entity as it was just before this version was recorded
    pub fn reify(&self) -> Option<Entity> {
        let mut attributes = self.object.clone()?;
        // The payload may repeat the primary key; the version's item id wins.
        attributes.remove("id");
        Some(Entity::new(self.item_type.clone(), self.item_id, attributes))
    }

    /// Display ordering: newest first, id breaks ties
    pub fn display_cmp(&self, other: &Version) -> std::cmp::Ordering {
        other
            .created_at
            .cmp(&self.created_at)
            .then_with(|| other.id.cmp(&self.id))
    }
}
