#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use std::sync::Arc;
use tower::ServiceExt;

use mathmaster_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    services::AppState,
    storage::MemStorage,
};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

/// Builds the full router over a fresh in-memory store. Every test gets an
/// isolated store, so tests never observe each other's sessions.
pub fn create_test_app() -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let config = Config {
        bind_address: "127.0.0.1:0".to_string(),
        mongo_uri: None,
        mongo_database: "mathmaster_test".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
    };

    let app_state = Arc::new(AppState::new(config, Arc::new(MemStorage::new())));
    create_router(app_state)
}

/// Mints a bearer token the identity middleware will accept.
pub fn mint_token(user_id: &str, is_admin: bool) -> String {
    let service = JwtService::new(TEST_JWT_SECRET);
    let now = chrono::Utc::now().timestamp();
    service
        .generate_token(JwtClaims {
            sub: user_id.to_string(),
            email: Some(format!("{}@example.com", user_id)),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
            profile_image_url: None,
            is_admin,
            exp: (now + 3600) as usize,
            iat: now as usize,
        })
        .unwrap()
}

/// Drives one request through the router and decodes the JSON body (Null for
/// empty bodies such as 204 responses).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

/// Generates a problem and returns its JSON.
pub async fn fetch_problem(app: &Router, difficulty: &str) -> serde_json::Value {
    let (status, problem) = send(
        app,
        "GET",
        &format!("/api/problem/{}", difficulty),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    problem
}

/// Generates a problem and submits its correct answer for the given caller.
pub async fn submit_correct_answer(app: &Router, token: Option<&str>) -> serde_json::Value {
    let problem = fetch_problem(app, "easy").await;
    let (status, response) = send(
        app,
        "POST",
        "/api/check-answer",
        token,
        Some(serde_json::json!({
            "problemId": problem["id"],
            "selectedAnswer": problem["correctAnswer"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["isCorrect"], true);
    response
}
