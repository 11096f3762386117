//! Shared fixtures: an in-memory store with migrations applied and the
//! full router on top of it.

#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use sqlx::SqlitePool;
use tower::ServiceExt;

use task_manager_api::config::{AppConfig, IN_MEMORY_URL};
use task_manager_api::db::{self, TaskRepository};
use task_manager_api::routes::router;
use task_manager_api::state::AppState;

pub fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "DATABASE_URL" => Some(IN_MEMORY_URL.to_string()),
        _ => None,
    })
    .expect("test config")
}

pub async fn test_pool() -> SqlitePool {
    let pool = db::connect(&test_config())
        .await
        .expect("Failed to create database");
    db::migrate(&pool).await.expect("Failed to run migrations");
    pool
}

pub async fn test_repository() -> TaskRepository {
    TaskRepository::new(test_pool().await)
}

pub fn test_app(pool: SqlitePool) -> Router {
    let state = AppState {
        tasks: TaskRepository::new(pool),
    };
    let cors = test_config().cors_layer().expect("cors layer");
    router(state, cors)
}

pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap();

    app.clone().oneshot(request).await.unwrap()
}

pub async fn send_json(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send(app, method, uri, body).await;
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
