mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use changes_api::store::{EntityStore, MemoryStore};
use changes_api::types::Event;
use common::{version, widget, TestApp};

#[tokio::test]
async fn reverting_a_create_destroys_the_record() {
    let store = MemoryStore::new();
    widget(&store, 7, "new").await;
    let v = version(&store, 7, Event::Create, None, 0).await;
    let app = TestApp::new(store);

    let (status, body) = app.put(&format!("/changes/{}", v.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["notice"], json!("Rolled back newly-created record by destroying it."));
    assert_eq!(body["data"]["outcome"], json!("destroyed_create"));
    assert_eq!(body["redirect_to"], json!("/changes"));
    assert!(app.store.load("Widget", 7).await.unwrap().is_none());
}

#[tokio::test]
async fn reverting_an_update_restores_prior_state() {
    let store = MemoryStore::new();
    widget(&store, 7, "new").await;
    let v = version(&store, 7, Event::Update, Some(json!({"name": "old"})), 0).await;
    let app = TestApp::new(store);

    let (status, body) = app.request(Method::PATCH, &format!("/changes/{}", v.id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["notice"], json!("Rolled back changes to this record."));
    assert_eq!(body["data"]["record"]["attributes"]["name"], json!("old"));

    let restored = app.store.load("Widget", 7).await.unwrap().unwrap();
    assert_eq!(restored.get("name"), Some(&json!("old")));
}

#[tokio::test]
async fn rejected_rollback_reports_failure_and_keeps_record() {
    let store = MemoryStore::new().with_unique("Widget", "name");
    widget(&store, 7, "current").await;
    widget(&store, 8, "old").await;
    let v = version(&store, 7, Event::Update, Some(json!({"name": "old"})), 0).await;
    let app = TestApp::new(store);

    let (status, body) = app.put(&format!("/changes/{}", v.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["error"], json!("Couldn't rollback. Sorry."));
    assert_eq!(body["data"]["outcome"], json!("rollback_failed"));
    assert_eq!(body["data"]["record"], json!(null));
    assert_eq!(body["redirect_to"], json!("/changes"));

    let unchanged = app.store.load("Widget", 7).await.unwrap().unwrap();
    assert_eq!(unchanged.get("name"), Some(&json!("current")));
}

#[tokio::test]
async fn reverting_a_create_whose_record_is_gone_is_a_soft_failure() {
    let store = MemoryStore::new();
    let v = version(&store, 999, Event::Create, None, 0).await;
    let app = TestApp::new(store);

    let (status, body) = app.put(&format!("/changes/{}", v.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["data"]["outcome"], json!("target_not_found"));
    assert_eq!(body["error"], json!("The record created by this change no longer exists."));
}

#[tokio::test]
async fn second_revert_of_a_create_diverges_from_the_first() {
    let store = MemoryStore::new();
    widget(&store, 7, "new").await;
    let v = version(&store, 7, Event::Create, None, 0).await;
    let app = TestApp::new(store);
    let uri = format!("/changes/{}", v.id);

    let (_, first) = app.put(&uri).await;
    let (_, second) = app.put(&uri).await;
    assert_eq!(first["data"]["outcome"], json!("destroyed_create"));
    assert_eq!(second["data"]["outcome"], json!("target_not_found"));
}

#[tokio::test]
async fn reverting_an_unknown_version_redirects_to_the_listing() {
    let app = TestApp::new(MemoryStore::new());

    let (status, body) = app.put("/changes/45").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("No such version."));
    assert_eq!(body["redirect_to"], json!("/changes"));
}
