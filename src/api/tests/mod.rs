use super::*;
use crate::manager::test_helpers::{create_test_manager, seed_batch};
use crate::status::Status;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


/// Helper to create a test BatchManager wrapped in Arc
async fn create_shared_manager() -> (Arc<BatchManager>, tempfile::TempDir) {
    let (manager, temp_dir) = create_test_manager().await;
    (Arc::new(manager), temp_dir)
}

/// Router over a fresh manager, with the manager kept for seeding
async fn test_app() -> (Router, Arc<BatchManager>, tempfile::TempDir) {
    let (manager, temp_dir) = create_shared_manager().await;
    let config = manager.get_config();
    (create_router(manager.clone(), config), manager, temp_dir)
}

/// Send one request and return status plus decoded JSON body (Null when empty)
async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (manager, _temp_dir) = create_shared_manager().await;

    // Port 0 = OS assigns a free port
    let mut config = (*manager.get_config()).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let config = Arc::new(config);

    let api_handle = tokio::spawn({
        let manager = manager.clone();
        let config = config.clone();
        async move { start_api_server(manager, config).await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;

    // Still running means bind succeeded
    assert!(!api_handle.is_finished());
    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (manager, _temp_dir) = create_shared_manager().await;

    let mut config = (*manager.get_config()).clone();
    config.api.cors_enabled = true;
    config.api.cors_origins = vec!["*".to_string()];
    let app = create_router(manager, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled() {
    let (manager, _temp_dir) = create_shared_manager().await;

    let mut config = (*manager.get_config()).clone();
    config.api.cors_enabled = false;
    let app = create_router(manager, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin"),
        "CORS header should be absent when CORS is disabled"
    );
}

#[tokio::test]
async fn test_cors_specific_origin() {
    let (manager, _temp_dir) = create_shared_manager().await;

    let mut config = (*manager.get_config()).clone();
    config.api.cors_origins = vec!["http://allowed.example".to_string()];
    let app = create_router(manager, Arc::new(config));

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://allowed.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("http://allowed.example")
    );
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let (manager, _temp_dir) = create_test_manager().await;

    let mut config = (*manager.get_config()).clone();
    config.api.bind_address = "127.0.0.1:0".parse().unwrap();
    let manager = Arc::new(BatchManager {
        config: Arc::new(config),
        ..manager
    });

    let api_handle = manager.spawn_api_server();
    tokio::time::sleep(Duration::from_millis(100)).await;
    api_handle.abort();
}
