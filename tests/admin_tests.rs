mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_admin_routes_require_authentication() {
    let app = common::create_test_app();

    let (status, _) = common::send(&app, "GET", "/api/admin/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) =
        common::send(&app, "GET", "/api/admin/tutoring-sessions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_reject_non_admins() {
    let app = common::create_test_app();
    let token = common::mint_token("alice", false);

    let (status, _) = common::send(&app, "GET", "/api/admin/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_lists_known_users() {
    let app = common::create_test_app();
    let alice = common::mint_token("alice", false);
    let admin = common::mint_token("root", true);

    // Users are mirrored into the store when they touch the session API.
    let (status, _) = common::send(&app, "GET", "/api/session", Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = common::send(&app, "GET", "/api/session", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, users) = common::send(&app, "GET", "/api/admin/users", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let ids: Vec<&str> = users
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"alice"));
    assert!(ids.contains(&"root"));

    let alice_row = users
        .as_array()
        .unwrap()
        .iter()
        .find(|u| u["id"] == "alice")
        .unwrap();
    assert_eq!(alice_row["email"], "alice@example.com");
    assert_eq!(alice_row["isAdmin"], false);
}

#[tokio::test]
async fn test_admin_sees_tutoring_sessions_across_owners() {
    let app = common::create_test_app();
    let alice = common::mint_token("alice", false);
    let admin = common::mint_token("root", true);

    let body = |student: &str| {
        json!({
            "weekNumber": 1,
            "date": "2026-01-09",
            "studentName": student,
            "duration": 30,
        })
    };

    let (status, _) = common::send(
        &app,
        "POST",
        "/api/tutoring-sessions",
        Some(&alice),
        Some(body("Jamie")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = common::send(
        &app,
        "POST",
        "/api/tutoring-sessions",
        None,
        Some(body("Sam")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, records) = common::send(
        &app,
        "GET",
        "/api/admin/tutoring-sessions",
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(records.as_array().unwrap().len(), 2);
}
