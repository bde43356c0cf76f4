//! Persistence seams: where versions are read from and where the live
//! records they describe are loaded, deleted and saved.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Entity, Version};
use crate::pagination::{Page, PageParams};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The write was refused by validation or a storage constraint
    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The item type has no backing table, e.g. a model that was dropped
    #[error("Unknown table: {0}")]
    UnknownTable(String),

    #[error("Corrupt version {id}: {reason}")]
    CorruptVersion { id: i64, reason: String },

    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Seed data error: {0}")]
    Seed(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl StoreError {
    /// The item type cannot be mapped to storage at all
    pub fn is_unknown_target(&self) -> bool {
        matches!(self, StoreError::InvalidIdentifier(_) | StoreError::UnknownTable(_))
    }
}

/// Optional listing filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VersionFilter {
    pub item_type: Option<String>,
    pub item_id: Option<i64>,
}

impl VersionFilter {
    pub fn matches(&self, version: &Version) -> bool {
        self.item_type.as_deref().map_or(true, |t| t == version.item_type)
            && self.item_id.map_or(true, |id| id == version.item_id)
    }
}

/// Read access to recorded versions
#[async_trait]
pub trait VersionStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Version>, StoreError>;

    /// Entity state as of just before `version` was recorded; `None` when the
    /// version carries no prior state (creations).
    async fn reify(&self, version: &Version) -> Result<Option<Entity>, StoreError> {
        Ok(version.reify())
    }

    /// Versions newest first (`created_at DESC, id DESC`)
    async fn list(&self, filter: &VersionFilter, page: PageParams) -> Result<Page<Version>, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Generic load/delete/save of live records by item type and id
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn load(&self, item_type: &str, id: i64) -> Result<Option<Entity>, StoreError>;

    /// Fails with [`StoreError::Rejected`] when storage refuses the delete
    async fn delete(&self, entity: &Entity) -> Result<(), StoreError>;

    /// Insert or replace the entity's current state. Fails with
    /// [`StoreError::Rejected`] when validation or constraints refuse it.
    async fn save(&self, entity: &Entity) -> Result<(), StoreError>;
}
