mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn test_get_session_is_idempotent() {
    let app = common::create_test_app();

    let (status, first) = common::send(&app, "GET", "/api/session", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, second) = common::send(&app, "GET", "/api/session", None, None).await;

    assert_eq!(first["session"]["id"], second["session"]["id"]);
    assert!(first["achievements"].as_array().unwrap().is_empty());

    // Fresh default session.
    let session = &first["session"];
    assert_eq!(session["score"], 0);
    assert_eq!(session["streak"], 0);
    assert_eq!(session["difficulty"], "easy");
    assert_eq!(session["soundEnabled"], true);
    assert_eq!(session["questionsPerSession"], 10);
    assert_eq!(session["timerEnabled"], false);
    assert_eq!(session["timerSeconds"], 30);
    assert!(session["userId"].is_null());
}

#[tokio::test]
async fn test_sessions_are_per_identity() {
    let app = common::create_test_app();
    let alice = common::mint_token("alice", false);
    let bob = common::mint_token("bob", false);

    let (_, anon) = common::send(&app, "GET", "/api/session", None, None).await;
    let (_, alice_overview) =
        common::send(&app, "GET", "/api/session", Some(&alice), None).await;
    let (_, bob_overview) = common::send(&app, "GET", "/api/session", Some(&bob), None).await;

    assert_ne!(anon["session"]["id"], alice_overview["session"]["id"]);
    assert_ne!(alice_overview["session"]["id"], bob_overview["session"]["id"]);
    assert_eq!(alice_overview["session"]["userId"], "alice");

    // Same token maps back to the same session.
    let (_, again) = common::send(&app, "GET", "/api/session", Some(&alice), None).await;
    assert_eq!(again["session"]["id"], alice_overview["session"]["id"]);
}

#[tokio::test]
async fn test_patch_merges_settings_and_retains_counters() {
    let app = common::create_test_app();

    common::submit_correct_answer(&app, None).await;

    let (status, patched) = common::send(
        &app,
        "PATCH",
        "/api/session",
        None,
        Some(json!({ "difficulty": "hard", "soundEnabled": false })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["difficulty"], "hard");
    assert_eq!(patched["soundEnabled"], false);
    // Unset fields retained.
    assert_eq!(patched["score"], 12);
    assert_eq!(patched["timerSeconds"], 30);

    let (_, overview) = common::send(&app, "GET", "/api/session", None, None).await;
    assert_eq!(overview["session"]["difficulty"], "hard");
}

#[tokio::test]
async fn test_patch_rejects_out_of_range_settings() {
    let app = common::create_test_app();

    let (status, body) = common::send(
        &app,
        "PATCH",
        "/api/session",
        None,
        Some(json!({ "timerSeconds": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("Validation error"));
}

#[tokio::test]
async fn test_patch_rejects_counter_writes() {
    let app = common::create_test_app();

    common::submit_correct_answer(&app, None).await;

    // Writing streak above bestStreak would break the counter ordering.
    let (status, body) = common::send(
        &app,
        "PATCH",
        "/api/session",
        None,
        Some(json!({ "streak": 50, "bestStreak": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("counters"));

    // Counters are untouched by the rejected patch.
    let (_, overview) = common::send(&app, "GET", "/api/session", None, None).await;
    assert_eq!(overview["session"]["streak"], 1);
    assert_eq!(overview["session"]["bestStreak"], 1);
    assert_eq!(overview["session"]["score"], 12);
}

#[tokio::test]
async fn test_patch_rejects_unknown_difficulty() {
    let app = common::create_test_app();

    let (status, body) = common::send(
        &app,
        "PATCH",
        "/api/session",
        None,
        Some(json!({ "difficulty": "nightmare" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    // The rejection names the offending field.
    assert!(body["message"].as_str().unwrap().contains("difficulty"));
}

#[tokio::test]
async fn test_reset_zeroes_counters_and_preserves_settings() {
    let app = common::create_test_app();

    let (_, _) = common::send(
        &app,
        "PATCH",
        "/api/session",
        None,
        Some(json!({ "difficulty": "expert", "timerEnabled": true })),
    )
    .await;
    for _ in 0..3 {
        common::submit_correct_answer(&app, None).await;
    }

    let (status, reset) = common::send(&app, "POST", "/api/reset", None, None).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(reset["score"], 0);
    assert_eq!(reset["streak"], 0);
    assert_eq!(reset["bestStreak"], 0);
    assert_eq!(reset["correctAnswers"], 0);
    assert_eq!(reset["totalQuestions"], 0);
    // Settings survive the reset.
    assert_eq!(reset["difficulty"], "expert");
    assert_eq!(reset["timerEnabled"], true);
    assert_eq!(reset["soundEnabled"], true);
}

#[tokio::test]
async fn test_achievements_survive_reset_listing() {
    let app = common::create_test_app();

    common::submit_correct_answer(&app, None).await;
    let (_, _) = common::send(&app, "POST", "/api/reset", None, None).await;

    // Achievements are append-only; reset only touches counters.
    let (_, overview) = common::send(&app, "GET", "/api/session", None, None).await;
    let titles: Vec<&str> = overview["achievements"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["First Victory"]);
}
