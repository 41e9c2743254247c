use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use session_backend::{
    AppState, SessionService, cache::MemoryStore, config::Config, middleware::INTERNAL_KEY_HEADER,
    routes,
};
use tower::ServiceExt;

const INTERNAL_KEY: &str = "internal-test-key";

enum Auth<'a> {
    None,
    Bearer(&'a str),
    Internal(&'a str),
}

fn app() -> Router {
    let config = Config {
        internal_api_key: Some(INTERNAL_KEY.to_string()),
        ..Config::default()
    };
    let sessions = Arc::new(SessionService::new(Arc::new(MemoryStore::new()), &config));
    routes::router(AppState { config, sessions })
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    auth: Auth<'_>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    builder = match auth {
        Auth::None => builder,
        Auth::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        Auth::Internal(key) => builder.header(INTERNAL_KEY_HEADER, key),
    };
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, user_id: &str, payload: Value) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/sessions",
        Auth::Internal(INTERNAL_KEY),
        Some(json!({ "userId": user_id, "payload": payload })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["content"]["sessionId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_ttl() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/health", Auth::None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["sessionTtlSecs"], 86400);
}

#[tokio::test]
async fn session_lifecycle_over_http() {
    let app = app();
    let sid = login(&app, "u1", json!({"status": "online"})).await;

    let (status, body) = send(&app, Method::GET, "/sessions/current", Auth::Bearer(&sid), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], 0);
    assert_eq!(body["content"]["sessionId"], sid.as_str());
    assert_eq!(body["content"]["userId"], "u1");
    assert_eq!(body["content"]["status"], "online");

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/sessions/current",
        Auth::Bearer(&sid),
        Some(json!({"status": "away"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["updated"], true);

    let (_, body) = send(&app, Method::GET, "/sessions/current", Auth::Bearer(&sid), None).await;
    assert_eq!(body["content"]["status"], "away");

    let (status, _) = send(&app, Method::DELETE, "/sessions/current", Auth::Bearer(&sid), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, Method::GET, "/sessions/current", Auth::Bearer(&sid), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 1002);
}

#[tokio::test]
async fn current_session_requires_bearer() {
    let app = app();

    let (status, _) = send(&app, Method::GET, "/sessions/current", Auth::None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::GET,
        "/sessions/current",
        Auth::Bearer("u1:1:nope"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn issuing_sessions_requires_the_internal_key() {
    let app = app();
    let body = Some(json!({ "userId": "u1" }));

    let (status, _) = send(&app, Method::POST, "/sessions", Auth::None, body.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::POST, "/sessions", Auth::Internal("guess"), body).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/admin/active-users", Auth::None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn internal_routes_are_closed_without_a_configured_key() {
    let config = Config::default();
    let sessions = Arc::new(SessionService::new(Arc::new(MemoryStore::new()), &config));
    let app = routes::router(AppState { config, sessions });

    let (status, _) = send(
        &app,
        Method::POST,
        "/sessions",
        Auth::Internal(""),
        Some(json!({ "userId": "u1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn invalid_user_id_is_rejected() {
    let app = app();

    for user_id in ["bad:id", ""] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/sessions",
            Auth::Internal(INTERNAL_KEY),
            Some(json!({ "userId": user_id })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 1000);
    }
}

#[tokio::test]
async fn user_sessions_require_the_owners_session() {
    let app = app();
    let victim = login(&app, "victim", json!({})).await;
    let other = login(&app, "u2", json!({})).await;

    let (status, body) = send(&app, Method::GET, "/users/victim/sessions", Auth::None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["content"].is_null());

    let (status, body) = send(
        &app,
        Method::GET,
        "/users/victim/sessions",
        Auth::Bearer(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 1003);

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/users/victim/sessions",
        Auth::Bearer(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(&app, Method::GET, "/sessions/current", Auth::Bearer(&victim), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn session_listing_does_not_expose_session_ids() {
    let app = app();
    let sid = login(&app, "u1", json!({"device": "web"})).await;
    login(&app, "u1", json!({"device": "ios"})).await;

    let (status, body) = send(&app, Method::GET, "/users/u1/sessions", Auth::Bearer(&sid), None).await;
    assert_eq!(status, StatusCode::OK);

    let sessions = body["content"].as_array().unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(!body.to_string().contains(&sid));
    let current: Vec<&Value> = sessions.iter().filter(|s| s["current"] == true).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0]["session"]["device"], "web");
    assert_eq!(current[0]["session"]["userId"], "u1");
}

#[tokio::test]
async fn admin_views_and_bulk_logout() {
    let app = app();
    let sid = login(&app, "u1", json!({})).await;
    login(&app, "u1", json!({})).await;
    let keep = login(&app, "u2", json!({"device": "ios"})).await;

    let (_, body) = send(
        &app,
        Method::GET,
        "/admin/active-users",
        Auth::Internal(INTERNAL_KEY),
        None,
    )
    .await;
    assert_eq!(
        body["content"],
        json!([
            {"userId": "u1", "sessionCount": 2},
            {"userId": "u2", "sessionCount": 1},
        ])
    );

    let (status, body) = send(&app, Method::DELETE, "/users/u1/sessions", Auth::Bearer(&sid), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"]["destroyed"], 2);

    let (status, _) = send(&app, Method::GET, "/users/u1/sessions", Auth::Bearer(&sid), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, body) = send(
        &app,
        Method::GET,
        "/admin/active-users",
        Auth::Internal(INTERNAL_KEY),
        None,
    )
    .await;
    assert_eq!(body["content"], json!([{"userId": "u2", "sessionCount": 1}]));

    let (status, _) = send(&app, Method::GET, "/sessions/current", Auth::Bearer(&keep), None).await;
    assert_eq!(status, StatusCode::OK);
}
