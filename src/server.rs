use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, SecurityConfig, StoreBackend};
use crate::handlers;
use crate::middleware::caller_middleware;
use crate::permissions::{AccessPolicy, PermissionOracle};
use crate::registry::TypeRegistry;
use crate::store::{EntityStore, MemoryStore, PgStore, StoreError, VersionStore};

/// Collaborators shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub versions: Arc<dyn VersionStore>,
    pub entities: Arc<dyn EntityStore>,
    pub permissions: Arc<dyn PermissionOracle>,
    pub registry: Arc<TypeRegistry>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        versions: Arc<dyn VersionStore>,
        entities: Arc<dyn EntityStore>,
        permissions: Arc<dyn PermissionOracle>,
        config: AppConfig,
    ) -> Self {
        let registry = TypeRegistry::from_config(&config.store);
        Self {
            versions,
            entities,
            permissions,
            registry: Arc::new(registry),
            config: Arc::new(config),
        }
    }

    /// State backed by a single in-memory store
    pub fn memory(store: Arc<MemoryStore>, permissions: Arc<dyn PermissionOracle>, config: AppConfig) -> Self {
        Self::new(store.clone(), store, permissions, config)
    }

    /// Build stores and the access policy from configuration
    pub async fn from_config(config: AppConfig) -> Result<Self, StoreError> {
        let permissions: Arc<dyn PermissionOracle> = Arc::new(AccessPolicy::from_config(&config.permissions));

        match config.store.backend {
            StoreBackend::Memory => {
                let store = MemoryStore::new();
                if let Some(path) = &config.store.seed_file {
                    let raw = tokio::fs::read_to_string(path)
                        .await
                        .map_err(|e| StoreError::Seed(format!("{}: {}", path, e)))?;
                    store.seed_from_json(&raw).await?;
                }
                tracing::info!("Using in-memory version store");
                Ok(Self::memory(Arc::new(store), permissions, config))
            }
            StoreBackend::Postgres => {
                let store = PgStore::connect(&config.store).await?;
                if config.store.create_schema {
                    store.ensure_schema().await?;
                }
                let store = Arc::new(store);
                Ok(Self::new(store.clone(), store, permissions, config))
            }
        }
    }
}

pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health))
        .merge(change_routes())
        .layer(middleware::from_fn_with_state(state.clone(), caller_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn change_routes() -> Router<AppState> {
    use handlers::changes;

    Router::new()
        .route("/changes", get(changes::index))
        // Reverting is the "update" of a change
        .route(
            "/changes/:id",
            get(changes::show).put(changes::revert).patch(changes::revert),
        )
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.enable_cors {
        return CorsLayer::new();
    }
    if security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::PUT, Method::PATCH])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
