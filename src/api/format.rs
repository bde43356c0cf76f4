use serde_json::{json, Map, Value};

use crate::models::{Entity, Version};
use crate::pagination::Page;
use crate::registry::TypeRegistry;

/// Convert a version into the public wire format:
/// { id, item_type, item_id, event, whodunnit, object, created_at, links }
pub fn version_to_api_value(version: &Version, registry: &TypeRegistry) -> Value {
    let mut links = Map::new();
    links.insert("self".into(), Value::String(format!("/changes/{}", version.id)));
    // Display hint only: unknown item types simply get no link.
    if let Some(item) = registry.item_url(version) {
        links.insert("item".into(), Value::String(item));
    }

    json!({
        "id": version.id,
        "item_type": version.item_type,
        "item_id": version.item_id,
        "event": version.event,
        "whodunnit": version.whodunnit,
        "object": version.object,
        "created_at": version.created_at.to_rfc3339(),
        "links": Value::Object(links),
    })
}

/// Listing payload: versions plus the pagination block
pub fn version_page_to_api_value(page: &Page<Version>, registry: &TypeRegistry) -> Value {
    let versions: Vec<Value> = page
        .items
        .iter()
        .map(|v| version_to_api_value(v, registry))
        .collect();

    json!({
        "versions": versions,
        "pagination": {
            "page": page.page,
            "per_page": page.per_page,
            "total_count": page.total_count,
            "total_pages": page.total_pages,
        }
    })
}

pub fn entity_to_api_value(entity: &Entity) -> Value {
    json!({
        "item_type": entity.item_type,
        "id": entity.id,
        "attributes": entity.attributes,
    })
}
