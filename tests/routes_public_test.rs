// ABOUTME: HTTP integration tests for health probes, option lists and route guards
// ABOUTME: Checks public endpoints answer without a session and protected ones reject bad sessions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{TestApp, TEST_SECRET};
use fithub_server::{auth::UserRole, config::ServerConfig};
use helpers::axum_test::AxumTestRequest;
use serde_json::Value;

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_reports_service() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::get("/health")
        .send(app.router())
        .await
        .assert_status(200)
        .json();

    assert_eq!(body["status"], "healthy");
    assert!(body["timestamp"].is_string());
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_ready_checks_database() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::get("/ready")
        .send(app.router())
        .await
        .assert_status(200)
        .json();

    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = TestApp::new().await;

    let response = AxumTestRequest::get("/health")
        .header("x-request-id", "req-123")
        .send(app.router())
        .await;

    assert_eq!(response.header("x-request-id").as_deref(), Some("req-123"));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let config = ServerConfig {
        max_body_bytes: 64,
        ..ServerConfig::for_testing(TEST_SECRET)
    };
    let app = TestApp::with_config(config).await;
    let body = serde_json::json!({ "name": "x".repeat(256), "muscle_group": "legs" });
    let length = serde_json::to_vec(&body).unwrap().len().to_string();

    AxumTestRequest::post("/api/admin/exercises")
        .bearer(&app.admin_token())
        .header("content-length", &length)
        .json(&body)
        .send(app.router())
        .await
        .assert_status(413);
}

#[tokio::test]
async fn test_cors_headers_on_simple_and_preflight_requests() {
    let app = TestApp::new().await;

    let simple = AxumTestRequest::get("/health")
        .header("origin", "https://app.fithub.test")
        .send(app.router())
        .await
        .assert_status(200);
    assert_eq!(simple.header("access-control-allow-origin").as_deref(), Some("*"));

    let preflight = AxumTestRequest::options("/api/admin/exercises")
        .header("origin", "https://app.fithub.test")
        .header("access-control-request-method", "POST")
        .send(app.router())
        .await
        .assert_status(200);
    assert!(preflight.header("access-control-allow-methods").is_some());
}

// ============================================================================
// Options
// ============================================================================

#[tokio::test]
async fn test_calculator_options() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::get("/api/options/calculator")
        .send(app.router())
        .await
        .assert_status(200)
        .json();

    assert_eq!(body["sexes"].as_array().unwrap().len(), 2);
    assert_eq!(body["activity_levels"].as_array().unwrap().len(), 5);
    assert_eq!(body["goals"][0]["value"], "lose_fast");
    assert!(body["goals"][0]["label"].is_string());
}

#[tokio::test]
async fn test_exercise_and_program_options() {
    let app = TestApp::new().await;

    let exercises: Value = AxumTestRequest::get("/api/options/exercises")
        .send(app.router())
        .await
        .assert_status(200)
        .json();
    assert!(exercises["muscle_groups"]
        .as_array()
        .unwrap()
        .iter()
        .any(|o| o["value"] == "full_body"));
    assert_eq!(exercises["difficulties"].as_array().unwrap().len(), 3);

    let programs: Value = AxumTestRequest::get("/api/options/programs")
        .send(app.router())
        .await
        .assert_status(200)
        .json();
    assert!(programs["goals"]
        .as_array()
        .unwrap()
        .iter()
        .any(|o| o["value"] == "fat_loss"));
}

#[tokio::test]
async fn test_recipe_options_list_tags_in_use() {
    let app = TestApp::new().await;
    let admin = app.admin_token();
    for (title, tags, published) in [
        ("Tofu Scramble", vec!["vegan", "quick"], true),
        ("Secret Stew", vec!["unreleased"], false),
    ] {
        AxumTestRequest::post("/api/admin/recipes")
            .bearer(&admin)
            .json(&serde_json::json!({
                "title": title,
                "category": "breakfast",
                "servings": 2,
                "calories": 300.0,
                "tags": tags,
                "is_published": published,
            }))
            .send(app.router())
            .await
            .assert_status(201);
    }

    let body: Value = AxumTestRequest::get("/api/options/recipes")
        .send(app.router())
        .await
        .assert_status(200)
        .json();

    assert_eq!(body["tags"], serde_json::json!(["quick", "vegan"]));
    assert!(!body["categories"].as_array().unwrap().is_empty());
}

// ============================================================================
// Guards
// ============================================================================

#[tokio::test]
async fn test_dashboard_requires_session() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::get("/api/achievements")
        .send(app.router())
        .await
        .assert_status(401)
        .json();

    assert_eq!(body["error"]["code"], "AUTH_REQUIRED");
}

#[tokio::test]
async fn test_tampered_token_is_rejected() {
    let app = TestApp::new().await;
    let mut token = app.user_token("user-1");
    token.push('x');

    AxumTestRequest::get("/api/achievements")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(401);
}

#[tokio::test]
async fn test_session_cookie_is_accepted() {
    let app = TestApp::new().await;
    let cookie = format!("theme=dark; session_token={}", app.user_token("user-1"));

    AxumTestRequest::get("/api/achievements")
        .header("cookie", &cookie)
        .send(app.router())
        .await
        .assert_status(200);
}

#[tokio::test]
async fn test_admin_routes_reject_regular_users() {
    let app = TestApp::new().await;
    let token = app.token_for("user-1", UserRole::User);

    let body: Value = AxumTestRequest::get("/api/admin/exercises")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(403)
        .json();

    assert_eq!(body["error"]["code"], "PERMISSION_DENIED");
}

#[tokio::test]
async fn test_first_session_sends_welcome_email() {
    let app = TestApp::new().await;
    let token = app.user_token("newcomer");

    for _ in 0..2 {
        AxumTestRequest::get("/api/achievements")
            .bearer(&token)
            .send(app.router())
            .await
            .assert_status(200);
    }

    let sent = app.mail.sent().await;
    let welcomes: Vec<_> = sent.iter().filter(|m| m.template == "welcome").collect();
    assert_eq!(welcomes.len(), 1);
    assert_eq!(welcomes[0].to, "newcomer@example.com");
}
