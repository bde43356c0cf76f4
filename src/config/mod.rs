use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;

use crate::types::AccessLevel;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub pagination: PaginationConfig,
    pub security: SecurityConfig,
    pub permissions: PermissionsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    /// Create the versions table at startup when it is missing
    pub create_schema: bool,
    /// JSON fixture loaded into the memory backend at startup
    pub seed_file: Option<String>,
    /// Item type to table name, e.g. Widget => widgets
    pub entity_tables: HashMap<String, String>,
    /// Item type to display route template, e.g. Widget => /widgets/{id}
    pub item_routes: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_per_page: u32,
    pub max_per_page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
}

/// Minimum caller access required for each action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionsConfig {
    pub index: AccessLevel,
    pub show: AccessLevel,
    pub revert: AccessLevel,
}

/// Number of changes listed per page when the request does not say.
pub const DEFAULT_PER_PAGE: u32 = 50;

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from a key lookup (the process environment in production use)
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        // Server
        if let Some(v) = lookup("CHANGES_API_PORT").or_else(|| lookup("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Store
        if let Some(v) = lookup("CHANGES_STORE") {
            match v.to_ascii_lowercase().as_str() {
                "postgres" | "postgresql" => self.store.backend = StoreBackend::Postgres,
                "memory" => self.store.backend = StoreBackend::Memory,
                other => tracing::warn!("Ignoring unknown CHANGES_STORE value: {}", other),
            }
        }
        if let Some(v) = lookup("DATABASE_URL") {
            self.store.database_url = Some(v);
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.store.max_connections = v.parse().unwrap_or(self.store.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.store.connection_timeout = v.parse().unwrap_or(self.store.connection_timeout);
        }
        if let Some(v) = lookup("CHANGES_CREATE_SCHEMA") {
            self.store.create_schema = v.parse().unwrap_or(self.store.create_schema);
        }
        if let Some(v) = lookup("CHANGES_SEED_FILE") {
            self.store.seed_file = Some(v);
        }
        if let Some(v) = lookup("CHANGES_ENTITY_TABLES") {
            self.store.entity_tables.extend(parse_pairs(&v));
        }
        if let Some(v) = lookup("CHANGES_ITEM_ROUTES") {
            self.store.item_routes.extend(parse_pairs(&v));
        }

        // Pagination
        if let Some(v) = lookup("PAGINATION_DEFAULT_PER_PAGE") {
            self.pagination.default_per_page = v.parse().unwrap_or(self.pagination.default_per_page);
        }
        if let Some(v) = lookup("PAGINATION_MAX_PER_PAGE") {
            self.pagination.max_per_page = v.parse().unwrap_or(self.pagination.max_per_page);
        }

        // Security
        if let Some(v) = lookup("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = lookup("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Some(v) = lookup("SECURITY_JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }

        // Permissions
        if let Some(v) = lookup("PERMISSIONS_INDEX") {
            self.permissions.index = v.parse().unwrap_or(self.permissions.index);
        }
        if let Some(v) = lookup("PERMISSIONS_SHOW") {
            self.permissions.show = v.parse().unwrap_or(self.permissions.show);
        }
        if let Some(v) = lookup("PERMISSIONS_REVERT") {
            self.permissions.revert = v.parse().unwrap_or(self.permissions.revert);
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { port: 3000 },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_url: None,
                max_connections: 10,
                connection_timeout: 30,
                create_schema: true,
                seed_file: None,
                entity_tables: HashMap::new(),
                item_routes: HashMap::new(),
            },
            pagination: PaginationConfig {
                default_per_page: DEFAULT_PER_PAGE,
                max_per_page: 1000,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: "development-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
            },
            permissions: PermissionsConfig {
                index: AccessLevel::Anonymous,
                show: AccessLevel::Anonymous,
                revert: AccessLevel::Anonymous,
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig { port: 3000 },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 20,
                connection_timeout: 10,
                create_schema: true,
                seed_file: None,
                entity_tables: HashMap::new(),
                item_routes: HashMap::new(),
            },
            pagination: PaginationConfig {
                default_per_page: DEFAULT_PER_PAGE,
                max_per_page: 500,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
            },
            permissions: PermissionsConfig {
                index: AccessLevel::Read,
                show: AccessLevel::Read,
                revert: AccessLevel::Edit,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { port: 3000 },
            store: StoreConfig {
                backend: StoreBackend::Postgres,
                database_url: None,
                max_connections: 50,
                connection_timeout: 5,
                create_schema: false,
                seed_file: None,
                entity_tables: HashMap::new(),
                item_routes: HashMap::new(),
            },
            pagination: PaginationConfig {
                default_per_page: DEFAULT_PER_PAGE,
                max_per_page: 200,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
            },
            permissions: PermissionsConfig {
                index: AccessLevel::Read,
                show: AccessLevel::Read,
                revert: AccessLevel::Full,
            },
        }
    }
}

/// Parse `Key=value,Other=value` lists; malformed entries are skipped
fn parse_pairs(raw: &str) -> Vec<(String, String)> {
    raw.split(',')
        .filter_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            let (k, v) = (k.trim(), v.trim());
            if k.is_empty() || v.is_empty() {
                tracing::warn!("Ignoring malformed mapping entry: {}", pair);
                return None;
            }
            Some((k.to_string(), v.to_string()))
        })
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
