// ABOUTME: HTTP integration tests for the admin course, lesson and achievement endpoints
// ABOUTME: Covers dense lesson ordering, course cascades and unique achievement names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::TestApp;
use helpers::axum_test::{AxumTestRequest, AxumTestResponse};
use serde_json::{json, Value};

async fn post(app: &TestApp, uri: &str, body: &Value) -> AxumTestResponse {
    AxumTestRequest::post(uri)
        .bearer(&app.admin_token())
        .json(body)
        .send(app.router())
        .await
}

async fn put(app: &TestApp, uri: &str, body: &Value) -> AxumTestResponse {
    AxumTestRequest::put(uri)
        .bearer(&app.admin_token())
        .json(body)
        .send(app.router())
        .await
}

async fn get(app: &TestApp, uri: &str) -> AxumTestResponse {
    AxumTestRequest::get(uri)
        .bearer(&app.admin_token())
        .send(app.router())
        .await
}

async fn delete(app: &TestApp, uri: &str) -> AxumTestResponse {
    AxumTestRequest::delete(uri)
        .bearer(&app.admin_token())
        .send(app.router())
        .await
}

fn titles(lessons: &Value) -> Vec<String> {
    lessons
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap().to_owned())
        .collect()
}

fn ids(lessons: &Value) -> Vec<String> {
    lessons
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["id"].as_str().unwrap().to_owned())
        .collect()
}

// ============================================================================
// Courses
// ============================================================================

#[tokio::test]
async fn test_course_crud_and_level_filter() {
    let app = TestApp::new().await;

    let created: Value = post(
        &app,
        "/api/admin/courses",
        &json!({ "title": "Running Form & Cadence", "level": "intermediate" }),
    )
    .await
    .assert_status(201)
    .json();
    assert_eq!(created["slug"], "running-form-cadence");
    assert_eq!(created["is_published"], false);
    assert!(created["lessons"].as_array().unwrap().is_empty());
    let id = created["id"].as_str().unwrap().to_owned();

    post(
        &app,
        "/api/admin/courses",
        &json!({ "title": "Desk Stretches", "level": "beginner" }),
    )
    .await
    .assert_status(201);

    let filtered: Value = get(&app, "/api/admin/courses?difficulty=intermediate")
        .await
        .assert_status(200)
        .json();
    assert_eq!(filtered["total"], 1);
    assert_eq!(filtered["items"][0]["id"], id.as_str());

    let updated: Value = put(
        &app,
        &format!("/api/admin/courses/{id}"),
        &json!({
            "title": "Running Form",
            "slug": "running-form",
            "level": "advanced",
            "is_published": true,
        }),
    )
    .await
    .assert_status(200)
    .json();
    assert_eq!(updated["slug"], "running-form");
    assert_eq!(updated["level"], "advanced");
    assert_eq!(updated["is_published"], true);

    delete(&app, &format!("/api/admin/courses/{id}"))
        .await
        .assert_status(204);
    get(&app, &format!("/api/admin/courses/{id}"))
        .await
        .assert_status(404);
}

#[tokio::test]
async fn test_course_slug_conflict_and_invalid_slug() {
    let app = TestApp::new().await;
    let body = json!({ "title": "Core Strength", "level": "beginner" });
    post(&app, "/api/admin/courses", &body).await.assert_status(201);
    post(&app, "/api/admin/courses", &body).await.assert_status(409);

    post(
        &app,
        "/api/admin/courses",
        &json!({ "title": "Other", "slug": "Not A Slug", "level": "beginner" }),
    )
    .await
    .assert_status(400);
}

#[tokio::test]
async fn test_lesson_positions_stay_dense() {
    let app = TestApp::new().await;
    let course: Value = post(
        &app,
        "/api/admin/courses",
        &json!({ "title": "Breathing", "level": "beginner" }),
    )
    .await
    .assert_status(201)
    .json();
    let course_id = course["id"].as_str().unwrap().to_owned();
    let lessons_uri = format!("/api/admin/courses/{course_id}/lessons");

    for title in ["Box", "Nasal"] {
        post(&app, &lessons_uri, &json!({ "title": title, "duration_minutes": 5 }))
            .await
            .assert_status(201);
    }
    // Inserting at the front shifts the others down
    let intro: Value = post(&app, &lessons_uri, &json!({ "title": "Intro", "position": 0 }))
        .await
        .assert_status(201)
        .json();
    assert_eq!(intro["position"], 0);

    let detail: Value = get(&app, &format!("/api/admin/courses/{course_id}"))
        .await
        .assert_status(200)
        .json();
    assert_eq!(titles(&detail["lessons"]), ["Intro", "Box", "Nasal"]);
    assert_eq!(detail["lesson_count"], 3);

    let mut order = ids(&detail["lessons"]);
    order.reverse();
    let reordered: Value = put(
        &app,
        &format!("{lessons_uri}/order"),
        &json!({ "lesson_ids": order }),
    )
    .await
    .assert_status(200)
    .json();
    assert_eq!(titles(&reordered), ["Nasal", "Box", "Intro"]);
    let positions: Vec<u64> = reordered
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["position"].as_u64().unwrap())
        .collect();
    assert_eq!(positions, [0, 1, 2]);

    // Reorder must name exactly the course's lessons
    put(
        &app,
        &format!("{lessons_uri}/order"),
        &json!({ "lesson_ids": &order[..2] }),
    )
    .await
    .assert_status(400);

    delete(&app, &format!("/api/admin/lessons/{}", order[1]))
        .await
        .assert_status(204);
    let after: Value = get(&app, &format!("/api/admin/courses/{course_id}"))
        .await
        .json();
    assert_eq!(titles(&after["lessons"]), ["Nasal", "Intro"]);
    assert_eq!(after["lessons"][1]["position"], 1);
}

#[tokio::test]
async fn test_lesson_update_moves_and_validates() {
    let app = TestApp::new().await;
    let course: Value = post(
        &app,
        "/api/admin/courses",
        &json!({ "title": "Sleep", "level": "beginner" }),
    )
    .await
    .json();
    let course_id = course["id"].as_str().unwrap().to_owned();
    let mut lesson_ids = Vec::new();
    for title in ["One", "Two", "Three"] {
        let lesson: Value = post(
            &app,
            &format!("/api/admin/courses/{course_id}/lessons"),
            &json!({ "title": title }),
        )
        .await
        .json();
        lesson_ids.push(lesson["id"].as_str().unwrap().to_owned());
    }

    let moved: Value = put(
        &app,
        &format!("/api/admin/lessons/{}", lesson_ids[0]),
        &json!({
            "title": "One (revised)",
            "content": "Wind down routine",
            "video_url": "https://video.example.com/one",
            "duration_minutes": 12,
            "position": 2,
        }),
    )
    .await
    .assert_status(200)
    .json();
    assert_eq!(moved["position"], 2);
    assert_eq!(moved["duration_minutes"], 12);

    let detail: Value = get(&app, &format!("/api/admin/courses/{course_id}"))
        .await
        .json();
    assert_eq!(titles(&detail["lessons"]), ["Two", "Three", "One (revised)"]);

    put(
        &app,
        &format!("/api/admin/lessons/{}", lesson_ids[1]),
        &json!({ "title": "Two", "video_url": "not a url" }),
    )
    .await
    .assert_status(400);
    put(&app, "/api/admin/lessons/missing", &json!({ "title": "Ghost" }))
        .await
        .assert_status(404);
}

#[tokio::test]
async fn test_course_delete_cascades_lessons_and_progress() {
    let app = TestApp::new().await;
    let course: Value = post(
        &app,
        "/api/admin/courses",
        &json!({ "title": "Posture", "level": "beginner", "is_published": true }),
    )
    .await
    .json();
    let course_id = course["id"].as_str().unwrap().to_owned();
    let lesson: Value = post(
        &app,
        &format!("/api/admin/courses/{course_id}/lessons"),
        &json!({ "title": "Neutral spine" }),
    )
    .await
    .json();
    let lesson_id = lesson["id"].as_str().unwrap().to_owned();

    let token = app.user_token("grace");
    AxumTestRequest::post(&format!(
        "/api/courses/{course_id}/lessons/{lesson_id}/complete"
    ))
    .bearer(&token)
    .send(app.router())
    .await
    .assert_status(200);

    delete(&app, &format!("/api/admin/courses/{course_id}"))
        .await
        .assert_status(204);

    let metrics = app.db().achievements().metrics("grace").await.unwrap();
    assert_eq!(metrics.lessons_completed, 0);
    assert_eq!(metrics.courses_completed, 0);
    put(&app, &format!("/api/admin/lessons/{lesson_id}"), &json!({ "title": "x" }))
        .await
        .assert_status(404);
}

// ============================================================================
// Achievements
// ============================================================================

#[tokio::test]
async fn test_achievement_crud_and_unique_name() {
    let app = TestApp::new().await;
    let created: Value = post(
        &app,
        "/api/admin/achievements",
        &json!({
            "name": "First Steps",
            "criteria": "workouts_completed",
            "threshold": 1,
            "points": 10,
        }),
    )
    .await
    .assert_status(201)
    .json();
    assert_eq!(created["is_active"], true);
    let id = created["id"].as_str().unwrap().to_owned();

    // Names are unique regardless of case
    post(
        &app,
        "/api/admin/achievements",
        &json!({ "name": "first steps", "criteria": "lessons_completed", "threshold": 2 }),
    )
    .await
    .assert_status(409);

    post(
        &app,
        "/api/admin/achievements",
        &json!({ "name": "Zero", "criteria": "lessons_completed", "threshold": 0 }),
    )
    .await
    .assert_status(400);

    let updated: Value = put(
        &app,
        &format!("/api/admin/achievements/{id}"),
        &json!({
            "name": "First Steps",
            "criteria": "workouts_completed",
            "threshold": 3,
            "points": 15,
            "is_active": false,
        }),
    )
    .await
    .assert_status(200)
    .json();
    assert_eq!(updated["threshold"], 3);
    assert_eq!(updated["is_active"], false);

    // Admin listing includes inactive achievements, the dashboard does not
    let all: Value = get(&app, "/api/admin/achievements").await.json();
    assert_eq!(all.as_array().unwrap().len(), 1);
    let dashboard: Value = AxumTestRequest::get("/api/achievements")
        .bearer(&app.user_token("ada"))
        .send(app.router())
        .await
        .assert_status(200)
        .json();
    assert!(dashboard["achievements"].as_array().unwrap().is_empty());

    delete(&app, &format!("/api/admin/achievements/{id}"))
        .await
        .assert_status(204);
    get(&app, &format!("/api/admin/achievements/{id}"))
        .await
        .assert_status(404);
}

#[tokio::test]
async fn test_admin_content_requires_admin_role() {
    let app = TestApp::new().await;
    AxumTestRequest::post("/api/admin/courses")
        .bearer(&app.user_token("ada"))
        .json(&json!({ "title": "Nope", "level": "beginner" }))
        .send(app.router())
        .await
        .assert_status(403);
    AxumTestRequest::get("/api/admin/achievements")
        .send(app.router())
        .await
        .assert_status(401);
}
