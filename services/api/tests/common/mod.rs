//! Shared helpers for the router tests: an app over the in-memory store and
//! small request/response utilities.

#![allow(dead_code)]

use std::sync::Arc;

use api_lib::adapters::MemoryCardStore;
use api_lib::config::{Config, StoreBackend};
use api_lib::web::{build_router, AppState};
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use card_catalog_core::gate::{hash_password, DEFAULT_SALT};
use card_catalog_core::{CardStore, HashScheme};
use http_body_util::BodyExt;
use tower::ServiceExt;
use tracing::Level;

pub const PASSWORD: &str = "letmein";

/// Configuration for tests: in-memory store and the rolling hash so the gate
/// is instant.
pub fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        store: StoreBackend::Memory,
        log_level: Level::INFO,
        admin_password_hash: hash_password(PASSWORD, DEFAULT_SALT, HashScheme::Rolling),
        gate_salt: DEFAULT_SALT.to_string(),
        gate_hash_scheme: HashScheme::Rolling,
        cors_origin: "http://localhost:3000".to_string(),
    }
}

/// Builds the full router over `store`.
pub fn build_test_app_with(store: Arc<dyn CardStore>) -> Router {
    let state = Arc::new(AppState::new(store, Arc::new(test_config())));
    build_router(state)
}

pub fn build_test_app() -> Router {
    build_test_app_with(Arc::new(MemoryCardStore::new()))
}

pub async fn send(app: &Router, req: Request<Body>) -> Response<Body> {
    app.clone().oneshot(req).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json(method: &str, uri: &str, cookie: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn empty(method: &str, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

/// A multipart upload with a single `file` part.
pub fn multipart_csv(uri: &str, cookie: Option<&str>, csv: &str) -> Request<Body> {
    let boundary = "card-catalog-test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"cards.csv\"\r\n\
         Content-Type: text/csv\r\n\r\n\
         {csv}\r\n\
         --{boundary}--\r\n"
    );
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body)).unwrap()
}

/// Enters the correct password and returns the `session=...` cookie pair.
pub async fn unlock(app: &Router) -> String {
    let response = send(
        app,
        json("POST", "/gate/verify", None, &serde_json::json!({ "password": PASSWORD })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    session_pair(&response)
}

/// Extracts `session=<id>` from a response's `Set-Cookie` header.
pub fn session_pair(response: &Response<Body>) -> String {
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("response should set the session cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().trim().to_string()
}

/// A minimal valid add/edit form body.
pub fn card_form(player: &str, year: i32, sport: &str) -> serde_json::Value {
    serde_json::json!({
        "player": player,
        "year": year,
        "sport": sport,
    })
}
