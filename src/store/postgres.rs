use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{postgres::PgPoolOptions, FromRow, PgPool, Row};
use std::time::Duration;
use tracing::info;

use super::{EntityStore, StoreError, VersionFilter, VersionStore};
use crate::config::StoreConfig;
use crate::models::{Entity, Version};
use crate::pagination::{Page, PageParams};
use crate::registry::{validate_identifier, TypeRegistry};

const VERSIONS_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS versions (
    id          BIGSERIAL PRIMARY KEY,
    item_type   VARCHAR(255) NOT NULL,
    item_id     BIGINT NOT NULL,
    event       VARCHAR(16) NOT NULL,
    whodunnit   VARCHAR(255),
    object      JSONB,
    created_at  TIMESTAMPTZ NOT NULL DEFAULT NOW()
)"#;

const VERSIONS_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS index_versions_on_item_type_and_item_id ON versions (item_type, item_id)";

const VERSION_COLUMNS: &str = "id, item_type, item_id, event, whodunnit, object, created_at";

/// PostgreSQL-backed version and entity store
pub struct PgStore {
    pool: PgPool,
    registry: TypeRegistry,
}

#[derive(Debug, FromRow)]
struct VersionRow {
    id: i64,
    item_type: String,
    item_id: i64,
    event: String,
    whodunnit: Option<String>,
    object: Option<Value>,
    created_at: DateTime<Utc>,
}

impl TryFrom<VersionRow> for Version {
    type Error = StoreError;

    fn try_from(row: VersionRow) -> Result<Self, Self::Error> {
        let event = row
            .event
            .parse()
            .map_err(|reason| StoreError::CorruptVersion { id: row.id, reason })?;
        let object = match row.object {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(other) => {
                return Err(StoreError::CorruptVersion {
                    id: row.id,
                    reason: format!("object payload is not a JSON object: {}", other),
                })
            }
        };
        Ok(Version {
            id: row.id,
            item_type: row.item_type,
            item_id: row.item_id,
            event,
            whodunnit: row.whodunnit,
            object,
            created_at: row.created_at,
        })
    }
}

impl PgStore {
    pub fn new(pool: PgPool, registry: TypeRegistry) -> Self {
        Self { pool, registry }
    }

    /// Open a pool from the store configuration
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let database_url = config
            .database_url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;
        url::Url::parse(database_url).map_err(|_| StoreError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(database_url)
            .await?;
        info!("Connected version store pool (max {} connections)", config.max_connections);

        Ok(Self::new(pool, TypeRegistry::from_config(config)))
    }

    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(VERSIONS_SCHEMA).execute(&self.pool).await?;
        sqlx::query(VERSIONS_INDEX).execute(&self.pool).await?;
        info!("Versions table ready");
        Ok(())
    }

    fn table_for(&self, item_type: &str) -> Result<String, StoreError> {
        self.registry.table_for(item_type).map_err(StoreError::InvalidIdentifier)
    }
}

/// Build the upsert for an entity; every column name is validated first
fn upsert_sql(table: &str, columns: &[&str]) -> Result<String, StoreError> {
    for column in columns {
        validate_identifier(column).map_err(StoreError::InvalidIdentifier)?;
    }
    let mut all = vec!["\"id\"".to_string()];
    all.extend(columns.iter().map(|c| format!("\"{}\"", c)));
    let column_list = all.join(", ");

    let conflict = if columns.is_empty() {
        "DO NOTHING".to_string()
    } else {
        let sets: Vec<String> = columns
            .iter()
            .map(|c| format!("\"{c}\" = EXCLUDED.\"{c}\""))
            .collect();
        format!("DO UPDATE SET {}", sets.join(", "))
    };

    Ok(format!(
        "INSERT INTO \"{table}\" ({column_list}) SELECT {column_list} FROM json_populate_record(NULL::\"{table}\", $1::json) ON CONFLICT (\"id\") {conflict}"
    ))
}

/// Integrity (23xxx) and data (22xxx) errors mean the row itself was refused;
/// an unknown column (42703) means the reified state no longer fits the table.
/// An undefined table (42P01) means the item type has no storage any more.
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        let code = db.code().map(|c| c.to_string()).unwrap_or_default();
        if code.starts_with("23") || code.starts_with("22") || code == "42703" {
            return StoreError::Rejected(db.message().to_string());
        }
        if code == "42P01" {
            return StoreError::UnknownTable(db.message().to_string());
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl VersionStore for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Version>, StoreError> {
        let sql = format!("SELECT {} FROM versions WHERE id = $1", VERSION_COLUMNS);
        let row = sqlx::query_as::<_, VersionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Version::try_from).transpose()
    }

    async fn list(&self, filter: &VersionFilter, page: PageParams) -> Result<Page<Version>, StoreError> {
        const WHERE: &str = "($1::text IS NULL OR item_type = $1) AND ($2::bigint IS NULL OR item_id = $2)";

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM versions WHERE {}", WHERE))
            .bind(filter.item_type.as_deref())
            .bind(filter.item_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM versions WHERE {} ORDER BY created_at DESC, id DESC LIMIT $3 OFFSET $4",
            VERSION_COLUMNS, WHERE
        );
        let rows = sqlx::query_as::<_, VersionRow>(&sql)
            .bind(filter.item_type.as_deref())
            .bind(filter.item_id)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Version::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, page, total.max(0) as u64))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn load(&self, item_type: &str, id: i64) -> Result<Option<Entity>, StoreError> {
        let table = self.table_for(item_type)?;
        let sql = format!(
            "SELECT row_to_json(t) AS row FROM (SELECT * FROM \"{}\" WHERE id = $1) t",
            table
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;

        let Some(row) = row else { return Ok(None) };
        let value: Value = row.try_get("row")?;
        let mut attributes = match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        attributes.remove("id");
        Ok(Some(Entity::new(item_type, id, attributes)))
    }

    async fn delete(&self, entity: &Entity) -> Result<(), StoreError> {
        let table = self.table_for(&entity.item_type)?;
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1", table);
        let result = sqlx::query(&sql)
            .bind(entity.id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Rejected(format!(
                "{} {} no longer exists",
                entity.item_type, entity.id
            )));
        }
        tracing::debug!("Deleted {} {} from {}", entity.item_type, entity.id, table);
        Ok(())
    }

    async fn save(&self, entity: &Entity) -> Result<(), StoreError> {
        let table = self.table_for(&entity.item_type)?;
        let columns: Vec<&str> = entity.attributes.keys().map(String::as_str).collect();
        let sql = upsert_sql(&table, &columns)?;

        let mut payload = entity.attributes.clone();
        payload.insert("id".to_string(), Value::from(entity.id));

        sqlx::query(&sql)
            .bind(Value::Object(payload))
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        tracing::debug!("Saved {} {} into {}", entity.item_type, entity.id, table);
        Ok(())
    }
}
