
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;

use crate::adapters::{AppState, router};
use crate::domain::Todo;
use crate::seed::seed_todos;
use crate::services::TodoService;
use crate::storage::Storage;

/// Seeds `storage` and mounts it behind the real router.
async fn seeded_app<S: Storage + 'static>(storage: S) -> (Router, Vec<Todo<S::Key>>) {
    let seeded = seed_todos(&storage).await.unwrap().todos;
    let state = AppState::new(TodoService::new(Arc::new(storage)));
    (router(state, CorsLayer::permissive()), seeded)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if body.is_some() {
        request = request.header(header::CONTENT_TYPE, "application/json");
    }
    let request = request
        .body(body.map(|b| Body::from(b.to_owned())).unwrap_or_else(Body::empty))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, None).await
}

async fn post(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Some(body)).await
}

async fn patch(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send(app, Method::PATCH, uri, Some(body)).await
}

async fn delete(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::DELETE, uri, None).await
}

fn message(body: &Value) -> &str {
    body["message"].as_str().unwrap_or_default()
}
