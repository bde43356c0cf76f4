use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use super::{EntityStore, StoreError, VersionFilter, VersionStore};
use crate::models::{Entity, Version};
use crate::pagination::{Page, PageParams};
use crate::types::Event;

/// In-process version and entity store used for development and tests.
///
/// Unique attribute constraints can be declared per item type so that saves
/// are rejected the way a database constraint would reject them. With change
/// tracking enabled every save and delete appends a version, like a host
/// application that audits its own writes.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    unique: HashMap<String, Vec<String>>,
    track_changes: bool,
}

#[derive(Default)]
struct Inner {
    versions: Vec<Version>,
    entities: BTreeMap<(String, i64), Map<String, Value>>,
    next_version_id: i64,
}

#[derive(Debug, Deserialize)]
struct Seed {
    #[serde(default)]
    entities: Vec<Entity>,
    #[serde(default)]
    versions: Vec<Version>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject saves that would duplicate `attribute` across records of `item_type`
    pub fn with_unique(mut self, item_type: impl Into<String>, attribute: impl Into<String>) -> Self {
        self.unique.entry(item_type.into()).or_default().push(attribute.into());
        self
    }

    pub fn with_change_tracking(mut self) -> Self {
        self.track_changes = true;
        self
    }

    /// Load `{ "entities": [...], "versions": [...] }` fixture data
    pub async fn seed_from_json(&self, raw: &str) -> Result<(), StoreError> {
        let seed: Seed = serde_json::from_str(raw).map_err(|e| StoreError::Seed(e.to_string()))?;
        let mut inner = self.inner.write().await;
        for entity in seed.entities {
            inner.entities.insert((entity.item_type, entity.id), entity.attributes);
        }
        for version in seed.versions {
            inner.next_version_id = inner.next_version_id.max(version.id);
            inner.versions.push(version);
        }
        tracing::info!(
            "Seeded memory store with {} entities and {} versions",
            inner.entities.len(),
            inner.versions.len()
        );
        Ok(())
    }

    /// Store an entity directly, bypassing constraints and change tracking
    pub async fn put_entity(&self, entity: Entity) {
        let mut inner = self.inner.write().await;
        inner.entities.insert((entity.item_type, entity.id), entity.attributes);
    }

    /// Append a version with the next id and the current time
    pub async fn record_version(
        &self,
        item_type: &str,
        item_id: i64,
        event: Event,
        object: Option<Map<String, Value>>,
    ) -> Version {
        let mut inner = self.inner.write().await;
        inner.append(item_type, item_id, event, object, Utc::now())
    }

    /// Append a version with an explicit timestamp
    pub async fn record_version_at(
        &self,
        item_type: &str,
        item_id: i64,
        event: Event,
        object: Option<Map<String, Value>>,
        created_at: DateTime<Utc>,
    ) -> Version {
        let mut inner = self.inner.write().await;
        inner.append(item_type, item_id, event, object, created_at)
    }

    pub async fn version_count(&self) -> usize {
        self.inner.read().await.versions.len()
    }

    fn check_unique(&self, inner: &Inner, entity: &Entity) -> Result<(), StoreError> {
        let Some(attributes) = self.unique.get(&entity.item_type) else {
            return Ok(());
        };
        for attribute in attributes {
            let Some(value) = entity.get(attribute).filter(|v| !v.is_null()) else {
                continue;
            };
            let taken = inner.entities.iter().any(|((item_type, id), other)| {
                item_type == &entity.item_type && *id != entity.id && other.get(attribute) == Some(value)
            });
            if taken {
                return Err(StoreError::Rejected(format!(
                    "{} {} has already been taken",
                    entity.item_type, attribute
                )));
            }
        }
        Ok(())
    }
}

impl Inner {
    fn append(
        &mut self,
        item_type: &str,
        item_id: i64,
        event: Event,
        object: Option<Map<String, Value>>,
        created_at: DateTime<Utc>,
    ) -> Version {
        self.next_version_id += 1;
        let version = Version {
            id: self.next_version_id,
            item_type: item_type.to_string(),
            item_id,
            event,
            whodunnit: None,
            object,
            created_at,
        };
        self.versions.push(version.clone());
        version
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Version>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.versions.iter().find(|v| v.id == id).cloned())
    }

    async fn list(&self, filter: &VersionFilter, page: PageParams) -> Result<Page<Version>, StoreError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&Version> = inner.versions.iter().filter(|v| filter.matches(v)).collect();
        matching.sort_by(|a, b| a.display_cmp(b));

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();
        Ok(Page::new(items, page, total))
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn load(&self, item_type: &str, id: i64) -> Result<Option<Entity>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .entities
            .get(&(item_type.to_string(), id))
            .map(|attributes| Entity::new(item_type, id, attributes.clone())))
    }

    async fn delete(&self, entity: &Entity) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let key = (entity.item_type.clone(), entity.id);
        let Some(previous) = inner.entities.remove(&key) else {
            return Err(StoreError::Rejected(format!(
                "{} {} no longer exists",
                entity.item_type, entity.id
            )));
        };
        if self.track_changes {
            inner.append(&entity.item_type, entity.id, Event::Destroy, Some(previous), Utc::now());
        }
        Ok(())
    }

    async fn save(&self, entity: &Entity) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        self.check_unique(&inner, entity)?;

        let key = (entity.item_type.clone(), entity.id);
        let previous = inner.entities.insert(key, entity.attributes.clone());
        if self.track_changes {
            let event = if previous.is_some() { Event::Update } else { Event::Create };
            inner.append(&entity.item_type, entity.id, event, previous, Utc::now());
        }
        Ok(())
    }
}
