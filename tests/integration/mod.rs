//! Integration tests for the timebox server.
//!
//! These drive the full router over a file store in a temporary install
//! root, the same layout the binary uses.
//!
//! Run with: cargo test --test integration

use std::collections::HashSet;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio_test::{assert_err, assert_ok};
use tower::ServiceExt;

use timebox_store::api::{create_router, AppState};
use timebox_store::config::Config;
use timebox_store::error::StoreError;
use timebox_store::store::{DateKey, DocumentStore, FileStore};

struct TestServer {
    _root: tempfile::TempDir,
    config: Config,
    store: FileStore,
    app: Router,
}

/// Build a server rooted in a fresh temporary directory.
async fn test_server() -> TestServer {
    let root = tempfile::TempDir::new().unwrap();
    let config = Config::with_root(root.path());

    std::fs::create_dir_all(config.public_dir()).unwrap();
    std::fs::write(config.public_dir().join("index.html"), "<!doctype html>").unwrap();

    let store = assert_ok!(FileStore::open(config.data_dir()).await);
    let app = create_router(AppState::new(store.clone()), &config.public_dir());

    TestServer {
        _root: root,
        config,
        store,
        app,
    }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, String) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    let request = builder
        .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

#[tokio::test]
async fn save_and_fetch_day() {
    let server = test_server().await;
    let doc = r#"{"blocks":[{"label":"work","minutes":90}]}"#;

    let (status, body) = send(&server.app, Method::POST, "/api/data/2024-03-01", Some(doc)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"ok": true}));

    let (status, body) = send(&server.app, Method::GET, "/api/data/2024-03-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, doc);

    // Stored pretty-printed on disk.
    let on_disk = std::fs::read_to_string(server.config.data_dir().join("2024-03-01.json")).unwrap();
    assert!(on_disk.starts_with("{\n  \"blocks\""), "{on_disk}");
}

#[tokio::test]
async fn key_order_survives_round_trip() {
    let server = test_server().await;
    let doc = r#"{"zeta":1,"alpha":[{"start":"09:00","end":"10:30","label":"work"}]}"#;

    let (status, _) = send(&server.app, Method::POST, "/api/data/2024-03-01", Some(doc)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&server.app, Method::GET, "/api/data/2024-03-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, doc);

    // The combined download keeps the posted order inside each document.
    let (_, body) = send(&server.app, Method::GET, "/api/export-all", None).await;
    let compact = serde_json::to_string(&serde_json::from_str::<Value>(&body).unwrap()).unwrap();
    assert_eq!(compact, format!(r#"{{"2024-03-01":{doc}}}"#));
}

#[tokio::test]
async fn invalid_date_is_rejected() {
    let server = test_server().await;

    let (status, _) = send(&server.app, Method::GET, "/api/data/not-a-date", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&server.app, Method::POST, "/api/data/not-a-date", Some("{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&server.app, Method::GET, "/api/export/not-a-date", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Nothing escaped the data directory.
    let entries = std::fs::read_dir(server.config.data_dir()).unwrap().count();
    assert_eq!(entries, 0);
}

#[tokio::test]
async fn unsaved_date_is_not_found() {
    let server = test_server().await;

    let (status, body) = send(&server.app, Method::GET, "/api/data/2099-12-31", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"message": "Not found"}));
}

#[tokio::test]
async fn dates_lists_saved_days() {
    let server = test_server().await;
    send(&server.app, Method::POST, "/api/data/2024-03-01", Some("{}")).await;
    send(&server.app, Method::POST, "/api/data/2024-03-02", Some("[]")).await;

    let (status, body) = send(&server.app, Method::GET, "/api/dates", None).await;
    assert_eq!(status, StatusCode::OK);

    let parsed: Value = serde_json::from_str(&body).unwrap();
    let dates: HashSet<&str> = parsed["dates"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d.as_str().unwrap())
        .collect();
    assert_eq!(dates, HashSet::from(["2024-03-01", "2024-03-02"]));
}

#[tokio::test]
async fn export_all_survives_corrupt_document() {
    let server = test_server().await;
    send(&server.app, Method::POST, "/api/data/2024-03-01", Some(r#"{"a":1}"#)).await;
    send(&server.app, Method::POST, "/api/data/2024-03-03", Some(r#"{"c":3}"#)).await;
    std::fs::write(server.config.data_dir().join("2024-03-02.json"), "{\"b\":").unwrap();

    let (status, body) = send(&server.app, Method::GET, "/api/export-all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!({
            "2024-03-01": {"a": 1},
            "2024-03-02": "{\"b\":",
            "2024-03-03": {"c": 3}
        })
    );

    // The corrupt day still fails on its own.
    let (status, _) = send(&server.app, Method::GET, "/api/data/2024-03-02", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn export_one_returns_stored_bytes() {
    let server = test_server().await;
    send(&server.app, Method::POST, "/api/data/2024-03-01", Some(r#"{"a":[1,2]}"#)).await;

    let (status, body) = send(&server.app, Method::GET, "/api/export/2024-03-01", None).await;
    assert_eq!(status, StatusCode::OK);
    let on_disk = std::fs::read_to_string(server.config.data_dir().join("2024-03-01.json")).unwrap();
    assert_eq!(body, on_disk);
}

#[tokio::test]
async fn interrupted_save_is_invisible() {
    let server = test_server().await;
    send(&server.app, Method::POST, "/api/data/2024-03-01", Some(r#"{"v":1}"#)).await;

    // Temp file left behind by a save that died before its rename.
    std::fs::write(
        server.config.data_dir().join("2024-03-01.json.999-0.tmp"),
        "{\"v\":2,\"trunc",
    )
    .unwrap();

    let (status, body) = send(&server.app, Method::GET, "/api/data/2024-03-01", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"v":1}"#);

    let (_, body) = send(&server.app, Method::GET, "/api/dates", None).await;
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"dates": ["2024-03-01"]}));
}

#[tokio::test]
async fn store_round_trips_directly() {
    let server = test_server().await;
    let key = DateKey::parse("2024-02-29").unwrap();
    let doc = json!({"nested": {"list": [1, "two", null, false, 3.5]}});

    assert_ok!(server.store.save(&key, &doc).await);
    assert_eq!(assert_ok!(server.store.get(&key).await), doc);

    let missing = DateKey::parse("2024-02-28").unwrap();
    let err = assert_err!(server.store.get(&missing).await);
    assert!(matches!(err, StoreError::NotFound { .. }));
}

#[tokio::test]
async fn spa_fallback_serves_index() {
    let server = test_server().await;

    let (status, body) = send(&server.app, Method::GET, "/week/2024-10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<!doctype html>");

    let (status, body) = send(&server.app, Method::GET, "/api/nothing-here", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "<!doctype html>");
}
