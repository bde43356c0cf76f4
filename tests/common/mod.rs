#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::{TimeZone, Utc};
use serde_json::{Map, Value};
use tower::ServiceExt;

use changes_api::config::AppConfig;
use changes_api::models::{Entity, Version};
use changes_api::permissions::{AllowAll, PermissionOracle};
use changes_api::server::{app, AppState};
use changes_api::store::MemoryStore;
use changes_api::types::Event;

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub router: Router,
    pub config: AppConfig,
}

impl TestApp {
    pub fn new(store: MemoryStore) -> Self {
        Self::with_permissions(store, Arc::new(AllowAll))
    }

    pub fn with_permissions(store: MemoryStore, permissions: Arc<dyn PermissionOracle>) -> Self {
        let mut config = AppConfig::development();
        config.store.item_routes.insert("Widget".into(), "/widgets/{id}".into());
        Self::build(store, permissions, config)
    }

    pub fn build(store: MemoryStore, permissions: Arc<dyn PermissionOracle>, config: AppConfig) -> Self {
        let store = Arc::new(store);
        let state = AppState::memory(store.clone(), permissions, config.clone());
        Self { store, router: app(state), config }
    }

    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn put(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, None).await
    }
}

pub fn attrs(value: Value) -> Map<String, Value> {
    value.as_object().cloned().expect("attributes must be a JSON object")
}

pub fn at(secs: i64) -> chrono::DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
}

pub async fn widget(store: &MemoryStore, id: i64, name: &str) {
    store
        .put_entity(Entity::new("Widget", id, attrs(serde_json::json!({ "name": name }))))
        .await;
}

pub async fn version(store: &MemoryStore, item_id: i64, event: Event, object: Option<Value>, secs: i64) -> Version {
    store
        .record_version_at("Widget", item_id, event, object.map(attrs), at(secs))
        .await
}
