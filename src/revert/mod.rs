//! Undoing a single recorded change.
//!
//! A `create` is undone by deleting the record it created. An `update` or
//! `destroy` is undone by reifying the state the record had just before the
//! change and saving it back. Failures the caller can recover from come back
//! as a [`RevertOutcome`]; only infrastructure errors are returned as `Err`.

use serde::Serialize;

use crate::models::{Entity, Version};
use crate::store::{EntityStore, StoreError, VersionStore};
use crate::types::Event;

pub const DESTROYED_CREATE_MESSAGE: &str = "Rolled back newly-created record by destroying it.";
pub const REVERTED_CHANGES_MESSAGE: &str = "Rolled back changes to this record.";
pub const ROLLBACK_FAILED_MESSAGE: &str = "Couldn't rollback. Sorry.";
pub const TARGET_NOT_FOUND_MESSAGE: &str = "The record created by this change no longer exists.";

/// Result of one revert attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RevertOutcome {
    /// The version recorded a creation and the created record was deleted
    DestroyedCreate { entity: Entity },
    /// The record was restored to its state before the version
    RevertedChanges { entity: Entity },
    /// Storage refused the delete or save, or there was nothing to restore
    RollbackFailed { reason: String },
    /// The record a creation refers to is already gone
    TargetNotFound { item_type: String, item_id: i64 },
}

impl RevertOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, RevertOutcome::DestroyedCreate { .. } | RevertOutcome::RevertedChanges { .. })
    }

    pub fn message(&self) -> &'static str {
        match self {
            RevertOutcome::DestroyedCreate { .. } => DESTROYED_CREATE_MESSAGE,
            RevertOutcome::RevertedChanges { .. } => REVERTED_CHANGES_MESSAGE,
            RevertOutcome::RollbackFailed { .. } => ROLLBACK_FAILED_MESSAGE,
            RevertOutcome::TargetNotFound { .. } => TARGET_NOT_FOUND_MESSAGE,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            RevertOutcome::DestroyedCreate { .. } => "destroyed_create",
            RevertOutcome::RevertedChanges { .. } => "reverted_changes",
            RevertOutcome::RollbackFailed { .. } => "rollback_failed",
            RevertOutcome::TargetNotFound { .. } => "target_not_found",
        }
    }

    /// The record deleted or restored by the attempt, if any
    pub fn entity(&self) -> Option<&Entity> {
        match self {
            RevertOutcome::DestroyedCreate { entity } | RevertOutcome::RevertedChanges { entity } => Some(entity),
            _ => None,
        }
    }
}

/// Stateless revert engine over a version store and an entity store
pub struct RevertEngine<'a> {
    versions: &'a dyn VersionStore,
    entities: &'a dyn EntityStore,
}

impl<'a> RevertEngine<'a> {
    pub fn new(versions: &'a dyn VersionStore, entities: &'a dyn EntityStore) -> Self {
        Self { versions, entities }
    }

    /// Undo `version`. Existence and permission checks are the caller's job.
    pub async fn attempt_revert(&self, version: &Version) -> Result<RevertOutcome, StoreError> {
        let outcome = match version.event {
            Event::Create => self.destroy_created(version).await?,
            Event::Update | Event::Destroy => self.restore_previous(version).await?,
        };

        if outcome.succeeded() {
            tracing::info!(
                version_id = version.id,
                event = %version.event,
                item_type = %version.item_type,
                item_id = version.item_id,
                outcome = outcome.tag(),
                "Reverted change"
            );
        } else {
            tracing::warn!(
                version_id = version.id,
                event = %version.event,
                item_type = %version.item_type,
                item_id = version.item_id,
                outcome = outcome.tag(),
                "Revert did not apply"
            );
        }
        Ok(outcome)
    }

    async fn destroy_created(&self, version: &Version) -> Result<RevertOutcome, StoreError> {
        let loaded = match self.entities.load(&version.item_type, version.item_id).await {
            Ok(found) => found,
            Err(e) if e.is_unknown_target() => None,
            Err(e) => return Err(e),
        };
        let Some(entity) = loaded else {
            return Ok(RevertOutcome::TargetNotFound {
                item_type: version.item_type.clone(),
                item_id: version.item_id,
            });
        };

        match self.entities.delete(&entity).await {
            Ok(()) => Ok(RevertOutcome::DestroyedCreate { entity }),
            Err(StoreError::Rejected(reason)) => Ok(RevertOutcome::RollbackFailed { reason }),
            Err(e) if e.is_unknown_target() => Ok(RevertOutcome::RollbackFailed { reason: e.to_string() }),
            Err(e) => Err(e),
        }
    }

    async fn restore_previous(&self, version: &Version) -> Result<RevertOutcome, StoreError> {
        let Some(entity) = self.versions.reify(version).await? else {
            return Ok(RevertOutcome::RollbackFailed {
                reason: format!("version {} has no prior state to restore", version.id),
            });
        };

        match self.entities.save(&entity).await {
            Ok(()) => Ok(RevertOutcome::RevertedChanges { entity }),
            Err(StoreError::Rejected(reason)) => Ok(RevertOutcome::RollbackFailed { reason }),
            Err(e) if e.is_unknown_target() => Ok(RevertOutcome::RollbackFailed { reason: e.to_string() }),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};

    /// How [`BrokenEntities`] answers each call
    #[derive(Clone, Copy)]
    enum Failure {
        Reject,
        UnknownTable,
        InvalidName,
        Unconfigured,
    }

    impl Failure {
        fn error(self) -> StoreError {
            match self {
                Failure::Reject => StoreError::Rejected("foreign key violation".into()),
                Failure::UnknownTable => StoreError::UnknownTable("relation \"widgets\" does not exist".into()),
                Failure::InvalidName => StoreError::InvalidIdentifier("Gadget-Thing".into()),
                Failure::Unconfigured => StoreError::ConfigMissing("DATABASE_URL"),
            }
        }
    }

    /// Entity store whose records exist but whose writes always fail
    struct BrokenEntities {
        load: Option<Failure>,
        write: Failure,
    }

    impl BrokenEntities {
        fn failing_writes(write: Failure) -> Self {
            Self { load: None, write }
        }
    }

    #[async_trait]
    impl EntityStore for BrokenEntities {
        async fn load(&self, item_type: &str, id: i64) -> Result<Option<Entity>, StoreError> {
            match self.load {
                Some(failure) => Err(failure.error()),
                None => Ok(Some(Entity::new(item_type, id, attrs(json!({"name": "live"}))))),
            }
        }

        async fn delete(&self, _entity: &Entity) -> Result<(), StoreError> {
            Err(self.write.error())
        }

        async fn save(&self, _entity: &Entity) -> Result<(), StoreError> {
            Err(self.write.error())
        }
    }

    fn attrs(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    async fn revert(store: &MemoryStore, version: &Version) -> RevertOutcome {
        RevertEngine::new(store, store).attempt_revert(version).await.unwrap()
    }

    #[tokio::test]
    async fn undoing_a_create_destroys_the_record() {
        let store = MemoryStore::new();
        store.put_entity(Entity::new("Widget", 7, attrs(json!({"name": "new"})))).await;
        let version = store.record_version("Widget", 7, Event::Create, None).await;

        let outcome = revert(&store, &version).await;
        assert!(matches!(outcome, RevertOutcome::DestroyedCreate { .. }));
        assert_eq!(outcome.message(), DESTROYED_CREATE_MESSAGE);
        assert!(store.load("Widget", 7).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn undoing_an_update_restores_prior_state() {
        let store = MemoryStore::new();
        store.put_entity(Entity::new("Widget", 7, attrs(json!({"name": "new"})))).await;
        let version = store
            .record_version("Widget", 7, Event::Update, Some(attrs(json!({"name": "old"}))))
            .await;

        let outcome = revert(&store, &version).await;
        assert_eq!(outcome.tag(), "reverted_changes");
        assert_eq!(outcome.message(), REVERTED_CHANGES_MESSAGE);
        let widget = store.load("Widget", 7).await.unwrap().unwrap();
        assert_eq!(widget.get("name"), Some(&json!("old")));
    }

    #[tokio::test]
    async fn undoing_a_destroy_recreates_the_record() {
        let store = MemoryStore::new();
        let version = store
            .record_version("Widget", 9, Event::Destroy, Some(attrs(json!({"name": "gone"}))))
            .await;

        let outcome = revert(&store, &version).await;
        assert!(outcome.succeeded());
        let widget = store.load("Widget", 9).await.unwrap().unwrap();
        assert_eq!(widget.get("name"), Some(&json!("gone")));
    }

    #[tokio::test]
    async fn rejected_save_is_a_failed_outcome_and_leaves_record_unchanged() {
        let store = MemoryStore::new().with_unique("Widget", "name");
        store.put_entity(Entity::new("Widget", 7, attrs(json!({"name": "current"})))).await;
        store.put_entity(Entity::new("Widget", 8, attrs(json!({"name": "old"})))).await;
        let version = store
            .record_version("Widget", 7, Event::Update, Some(attrs(json!({"name": "old"}))))
            .await;

        let outcome = revert(&store, &version).await;
        assert!(matches!(outcome, RevertOutcome::RollbackFailed { .. }));
        assert_eq!(outcome.message(), ROLLBACK_FAILED_MESSAGE);
        assert!(outcome.entity().is_none());
        let widget = store.load("Widget", 7).await.unwrap().unwrap();
        assert_eq!(widget.get("name"), Some(&json!("current")));
    }

    #[tokio::test]
    async fn undoing_a_create_whose_record_is_gone_reports_not_found() {
        let store = MemoryStore::new();
        let version = store.record_version("Widget", 999, Event::Create, None).await;

        let outcome = revert(&store, &version).await;
        assert_eq!(
            outcome,
            RevertOutcome::TargetNotFound { item_type: "Widget".to_string(), item_id: 999 }
        );
        assert!(!outcome.succeeded());
    }

    #[tokio::test]
    async fn reverting_the_same_create_twice_diverges() {
        let store = MemoryStore::new();
        store.put_entity(Entity::new("Widget", 7, Map::new())).await;
        let version = store.record_version("Widget", 7, Event::Create, None).await;

        let first = revert(&store, &version).await;
        let second = revert(&store, &version).await;
        assert!(first.succeeded());
        assert_eq!(second.tag(), "target_not_found");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn update_without_prior_state_fails_softly() {
        let store = MemoryStore::new();
        let version = store.record_version("Widget", 7, Event::Update, None).await;

        let outcome = revert(&store, &version).await;
        assert_eq!(outcome.tag(), "rollback_failed");
    }

    #[tokio::test]
    async fn revert_leaves_history_alone_apart_from_host_tracking() {
        let store = MemoryStore::new().with_change_tracking();
        store.put_entity(Entity::new("Widget", 7, attrs(json!({"name": "new"})))).await;
        let version = store
            .record_version("Widget", 7, Event::Update, Some(attrs(json!({"name": "old"}))))
            .await;

        revert(&store, &version).await;
        assert_eq!(store.find_by_id(version.id).await.unwrap(), Some(version));
        // The host's own tracking recorded the revert as a new update.
        assert_eq!(store.version_count().await, 2);
    }

    #[tokio::test]
    async fn refused_delete_of_a_created_record_fails_softly() {
        let versions = MemoryStore::new();
        let entities = BrokenEntities::failing_writes(Failure::Reject);
        let version = versions.record_version("Widget", 7, Event::Create, None).await;

        let outcome = RevertEngine::new(&versions, &entities).attempt_revert(&version).await.unwrap();
        assert_eq!(outcome.tag(), "rollback_failed");
        assert_eq!(outcome.message(), ROLLBACK_FAILED_MESSAGE);
        assert!(outcome.entity().is_none());
    }

    #[tokio::test]
    async fn infrastructure_errors_are_returned_not_reported() {
        let versions = MemoryStore::new();
        let entities = BrokenEntities::failing_writes(Failure::Unconfigured);
        let update = versions
            .record_version("Widget", 7, Event::Update, Some(attrs(json!({"name": "old"}))))
            .await;
        let create = versions.record_version("Widget", 8, Event::Create, None).await;

        let engine = RevertEngine::new(&versions, &entities);
        assert!(matches!(engine.attempt_revert(&update).await, Err(StoreError::ConfigMissing(_))));
        assert!(matches!(engine.attempt_revert(&create).await, Err(StoreError::ConfigMissing(_))));
    }

    #[tokio::test]
    async fn item_types_without_storage_are_soft_failures() {
        let versions = MemoryStore::new();
        let create = versions.record_version("Gadget", 1, Event::Create, None).await;
        let destroy = versions
            .record_version("Gadget", 2, Event::Destroy, Some(attrs(json!({"name": "old"}))))
            .await;

        let unmapped = BrokenEntities { load: Some(Failure::UnknownTable), write: Failure::UnknownTable };
        let engine = RevertEngine::new(&versions, &unmapped);
        assert_eq!(
            engine.attempt_revert(&create).await.unwrap(),
            RevertOutcome::TargetNotFound { item_type: "Gadget".to_string(), item_id: 1 }
        );
        assert_eq!(engine.attempt_revert(&destroy).await.unwrap().tag(), "rollback_failed");

        let invalid = BrokenEntities { load: Some(Failure::InvalidName), write: Failure::InvalidName };
        assert_eq!(
            RevertEngine::new(&versions, &invalid).attempt_revert(&create).await.unwrap().tag(),
            "target_not_found"
        );
    }
}
