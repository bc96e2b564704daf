// ABOUTME: HTTP integration tests for exercise, workout and program administration
// ABOUTME: Covers copy-on-write edits of shared workouts and program duplication
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::TestApp;
use helpers::axum_test::AxumTestRequest;
use serde_json::{json, Value};

struct Admin {
    app: TestApp,
    token: String,
}

impl Admin {
    async fn new() -> Self {
        let app = TestApp::new().await;
        let token = app.admin_token();
        Self { app, token }
    }

    async fn post(&self, uri: &str, body: Value, status: u16) -> Value {
        AxumTestRequest::post(uri)
            .bearer(&self.token)
            .json(&body)
            .send(self.app.router())
            .await
            .assert_status(status)
            .json()
    }

    async fn put(&self, uri: &str, body: Value, status: u16) -> Value {
        AxumTestRequest::put(uri)
            .bearer(&self.token)
            .json(&body)
            .send(self.app.router())
            .await
            .assert_status(status)
            .json()
    }

    async fn get(&self, uri: &str) -> Value {
        AxumTestRequest::get(uri)
            .bearer(&self.token)
            .send(self.app.router())
            .await
            .assert_status(200)
            .json()
    }

    async fn delete(&self, uri: &str) -> u16 {
        AxumTestRequest::delete(uri)
            .bearer(&self.token)
            .send(self.app.router())
            .await
            .status()
    }

    async fn exercise(&self, name: &str) -> String {
        let body = self
            .post(
                "/api/admin/exercises",
                json!({
                    "name": name,
                    "muscle_group": "legs",
                    "equipment": "barbell",
                    "difficulty": "intermediate",
                    "instructions": ["Brace", "Move"],
                }),
                201,
            )
            .await;
        body["id"].as_str().unwrap().to_owned()
    }

    async fn workout(&self, name: &str) -> String {
        let body = self
            .post(
                "/api/admin/workouts",
                json!({ "name": name, "difficulty": "beginner", "estimated_minutes": 30 }),
                201,
            )
            .await;
        body["id"].as_str().unwrap().to_owned()
    }

    async fn program(&self, name: &str) -> String {
        let body = self
            .post(
                "/api/admin/programs",
                json!({
                    "name": name,
                    "goal": "strength",
                    "difficulty": "beginner",
                    "duration_weeks": 4,
                    "days_per_week": 3,
                    "is_published": true,
                }),
                201,
            )
            .await;
        body["id"].as_str().unwrap().to_owned()
    }

    async fn schedule(&self, program_id: &str, workout_id: &str, week: u32, day: u32) -> String {
        let body = self
            .post(
                &format!("/api/admin/programs/{program_id}/workouts"),
                json!({ "workout_id": workout_id, "week": week, "day": day }),
                201,
            )
            .await;
        body["id"].as_str().unwrap().to_owned()
    }

    async fn add_set(&self, workout_id: &str, exercise_id: &str, program_workout_id: Option<&str>) -> Value {
        self.post(
            "/api/admin/workout-exercises",
            json!({
                "workout_id": workout_id,
                "exercise_id": exercise_id,
                "sets": 3,
                "reps": 5,
                "program_workout_id": program_workout_id,
            }),
            201,
        )
        .await
    }
}

// ============================================================================
// Exercises
// ============================================================================

#[tokio::test]
async fn test_exercise_crud_and_filters() {
    let admin = Admin::new().await;
    let id = admin.exercise("Back Squat").await;
    admin
        .post(
            "/api/admin/exercises",
            json!({
                "name": "Plank",
                "muscle_group": "core",
                "equipment": "none",
                "difficulty": "beginner",
            }),
            201,
        )
        .await;

    let legs = admin.get("/api/admin/exercises?muscle_group=legs").await;
    assert_eq!(legs["total"], 1);
    assert_eq!(legs["items"][0]["name"], "Back Squat");

    let updated = admin
        .put(
            &format!("/api/admin/exercises/{id}"),
            json!({
                "name": "Front Squat",
                "muscle_group": "legs",
                "equipment": "barbell",
                "difficulty": "advanced",
            }),
            200,
        )
        .await;
    assert_eq!(updated["name"], "Front Squat");
    assert_eq!(updated["difficulty"], "advanced");

    assert_eq!(admin.delete(&format!("/api/admin/exercises/{id}")).await, 204);
    assert_eq!(admin.delete(&format!("/api/admin/exercises/{id}")).await, 404);
}

#[tokio::test]
async fn test_unknown_filter_value_is_rejected() {
    let admin = Admin::new().await;

    AxumTestRequest::get("/api/admin/exercises?equipment=spaceship")
        .bearer(&admin.token)
        .send(admin.app.router())
        .await
        .assert_status(400);
}

#[tokio::test]
async fn test_exercise_in_use_cannot_be_deleted() {
    let admin = Admin::new().await;
    let exercise = admin.exercise("Deadlift").await;
    let workout = admin.workout("Pull Day").await;
    admin.add_set(&workout, &exercise, None).await;

    assert_eq!(admin.delete(&format!("/api/admin/exercises/{exercise}")).await, 409);
}

// ============================================================================
// Workouts
// ============================================================================

#[tokio::test]
async fn test_unknown_exercise_reference_is_bad_request() {
    let admin = Admin::new().await;
    let workout = admin.workout("Leg Day").await;

    admin
        .post(
            "/api/admin/workout-exercises",
            json!({ "workout_id": workout, "exercise_id": "missing", "sets": 3, "reps": 8 }),
            400,
        )
        .await;
}

#[tokio::test]
async fn test_workout_exercises_keep_dense_positions() {
    let admin = Admin::new().await;
    let squat = admin.exercise("Squat").await;
    let lunge = admin.exercise("Lunge").await;
    let workout = admin.workout("Leg Day").await;
    admin.add_set(&workout, &squat, None).await;
    let after = admin.add_set(&workout, &lunge, None).await;

    let exercises = after["workout"]["exercises"].as_array().unwrap();
    let positions: Vec<u64> = exercises.iter().map(|e| e["position"].as_u64().unwrap()).collect();
    assert_eq!(positions, vec![0, 1]);

    let first = exercises[0]["id"].as_str().unwrap().to_owned();
    let second = exercises[1]["id"].as_str().unwrap().to_owned();
    let reordered = admin
        .put(
            "/api/admin/workout-exercises/reorder",
            json!({ "workout_id": workout, "workout_exercise_ids": [second, first] }),
            200,
        )
        .await;
    assert_eq!(reordered["copied"], false);
    assert_eq!(reordered["workout"]["exercises"][0]["exercise_id"], lunge);

    let removed: Value = AxumTestRequest::delete(&format!("/api/admin/workout-exercises/{second}"))
        .bearer(&admin.token)
        .send(admin.app.router())
        .await
        .assert_status(200)
        .json();
    let left = removed["workout"]["exercises"].as_array().unwrap();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0]["position"], 0);
}

#[tokio::test]
async fn test_reorder_requires_exact_membership() {
    let admin = Admin::new().await;
    let squat = admin.exercise("Squat").await;
    let workout = admin.workout("Leg Day").await;
    admin.add_set(&workout, &squat, None).await;

    admin
        .put(
            "/api/admin/workout-exercises/reorder",
            json!({ "workout_id": workout, "workout_exercise_ids": [] }),
            400,
        )
        .await;
}

#[tokio::test]
async fn test_edit_through_sole_slot_is_in_place() {
    let admin = Admin::new().await;
    let squat = admin.exercise("Squat").await;
    let workout = admin.workout("Leg Day").await;
    let program = admin.program("Strong 5").await;
    let slot = admin.schedule(&program, &workout, 1, 1).await;

    let mutation = admin.add_set(&workout, &squat, Some(&slot)).await;

    assert_eq!(mutation["copied"], false);
    assert_eq!(mutation["workout_id"], workout);
}

#[tokio::test]
async fn test_edit_through_shared_slot_copies_workout() {
    let admin = Admin::new().await;
    let squat = admin.exercise("Squat").await;
    let bench = admin.exercise("Bench").await;
    let workout = admin.workout("Full Body").await;
    admin.add_set(&workout, &squat, None).await;
    let program = admin.program("Strong 5").await;
    let monday = admin.schedule(&program, &workout, 1, 1).await;
    let friday = admin.schedule(&program, &workout, 1, 5).await;

    let mutation = admin.add_set(&workout, &bench, Some(&friday)).await;

    assert_eq!(mutation["copied"], true);
    let clone = mutation["workout_id"].as_str().unwrap().to_owned();
    assert_ne!(clone, workout);
    assert_eq!(mutation["workout"]["exercises"].as_array().unwrap().len(), 2);

    let original = admin.get(&format!("/api/admin/workouts/{workout}")).await;
    assert_eq!(original["exercises"].as_array().unwrap().len(), 1);
    assert_eq!(original["program_workout_count"], 1);

    let detail = admin.get(&format!("/api/admin/programs/{program}")).await;
    let slots = detail["program_workouts"].as_array().unwrap();
    let by_id = |id: &str| slots.iter().find(|s| s["id"] == id).unwrap()["workout_id"].clone();
    assert_eq!(by_id(&monday), json!(workout));
    assert_eq!(by_id(&friday), json!(clone));
}

#[tokio::test]
async fn test_copy_maps_exercise_ids_for_update() {
    let admin = Admin::new().await;
    let squat = admin.exercise("Squat").await;
    let workout = admin.workout("Full Body").await;
    let created = admin.add_set(&workout, &squat, None).await;
    let original_exercise = created["workout"]["exercises"][0]["id"].as_str().unwrap().to_owned();
    let program = admin.program("Strong 5").await;
    admin.schedule(&program, &workout, 1, 1).await;
    let friday = admin.schedule(&program, &workout, 1, 5).await;

    let mutation = admin
        .put(
            &format!("/api/admin/workout-exercises/{original_exercise}"),
            json!({
                "exercise_id": squat,
                "sets": 5,
                "reps": 3,
                "program_workout_id": friday,
            }),
            200,
        )
        .await;

    assert_eq!(mutation["copied"], true);
    assert_eq!(mutation["workout"]["exercises"][0]["sets"], 5);
    let original = admin.get(&format!("/api/admin/workouts/{workout}")).await;
    assert_eq!(original["exercises"][0]["sets"], 3);
}

fn exercise_order(workout: &Value) -> Vec<(String, u64)> {
    workout["exercises"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            (
                e["exercise_id"].as_str().unwrap().to_owned(),
                e["position"].as_u64().unwrap(),
            )
        })
        .collect()
}

/// Workout with squat then bench, scheduled on two days of one program
async fn shared_two_exercise_workout(admin: &Admin) -> (String, String, String, Vec<String>, String) {
    let squat = admin.exercise("Squat").await;
    let bench = admin.exercise("Bench").await;
    let workout = admin.workout("Full Body").await;
    admin.add_set(&workout, &squat, None).await;
    let created = admin.add_set(&workout, &bench, None).await;
    let rows = created["workout"]["exercises"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_owned())
        .collect();
    let program = admin.program("Strong 5").await;
    admin.schedule(&program, &workout, 1, 1).await;
    let friday = admin.schedule(&program, &workout, 1, 5).await;
    (squat, bench, workout, rows, friday)
}

#[tokio::test]
async fn test_remove_through_shared_slot_copies_workout() {
    let admin = Admin::new().await;
    let (squat, bench, workout, rows, friday) = shared_two_exercise_workout(&admin).await;

    let mutation: Value = AxumTestRequest::delete(&format!(
        "/api/admin/workout-exercises/{}?program_workout_id={friday}",
        rows[0]
    ))
    .bearer(&admin.token)
    .send(admin.app.router())
    .await
    .assert_status(200)
    .json();

    assert_eq!(mutation["copied"], true);
    assert_ne!(mutation["workout_id"], json!(workout));
    assert_eq!(exercise_order(&mutation["workout"]), vec![(bench.clone(), 0)]);

    let original = admin.get(&format!("/api/admin/workouts/{workout}")).await;
    assert_eq!(exercise_order(&original), vec![(squat, 0), (bench, 1)]);
    assert_eq!(original["exercises"][0]["id"], json!(rows[0]));
}

#[tokio::test]
async fn test_reorder_through_shared_slot_copies_workout() {
    let admin = Admin::new().await;
    let (squat, bench, workout, rows, friday) = shared_two_exercise_workout(&admin).await;

    let mutation = admin
        .put(
            "/api/admin/workout-exercises/reorder",
            json!({
                "workout_id": workout,
                "workout_exercise_ids": [rows[1], rows[0]],
                "program_workout_id": friday,
            }),
            200,
        )
        .await;

    assert_eq!(mutation["copied"], true);
    let clone = mutation["workout_id"].as_str().unwrap().to_owned();
    assert_ne!(clone, workout);
    assert_eq!(
        exercise_order(&mutation["workout"]),
        vec![(bench.clone(), 0), (squat.clone(), 1)]
    );

    let original = admin.get(&format!("/api/admin/workouts/{workout}")).await;
    assert_eq!(exercise_order(&original), vec![(squat, 0), (bench, 1)]);
    assert_eq!(original["program_workout_count"], 1);
}

#[tokio::test]
async fn test_mismatched_program_workout_is_bad_request() {
    let admin = Admin::new().await;
    let squat = admin.exercise("Squat").await;
    let legs = admin.workout("Legs").await;
    let arms = admin.workout("Arms").await;
    let program = admin.program("Split").await;
    let arms_slot = admin.schedule(&program, &arms, 1, 2).await;

    admin
        .post(
            "/api/admin/workout-exercises",
            json!({
                "workout_id": legs,
                "exercise_id": squat,
                "sets": 3,
                "reps": 8,
                "program_workout_id": arms_slot,
            }),
            400,
        )
        .await;
}

#[tokio::test]
async fn test_scheduled_workout_cannot_be_deleted() {
    let admin = Admin::new().await;
    let workout = admin.workout("Legs").await;
    let program = admin.program("Split").await;
    let slot = admin.schedule(&program, &workout, 1, 1).await;

    assert_eq!(admin.delete(&format!("/api/admin/workouts/{workout}")).await, 409);

    assert_eq!(admin.delete(&format!("/api/admin/program-workouts/{slot}")).await, 204);
    // Unscheduling keeps the workout itself
    admin.get(&format!("/api/admin/workouts/{workout}")).await;
    assert_eq!(admin.delete(&format!("/api/admin/workouts/{workout}")).await, 204);
}

// ============================================================================
// Programs
// ============================================================================

#[tokio::test]
async fn test_add_program_workout_with_new_workout() {
    let admin = Admin::new().await;
    let program = admin.program("Starter").await;

    let slot = admin
        .post(
            &format!("/api/admin/programs/{program}/workouts"),
            json!({
                "new_workout": { "name": "Day One", "difficulty": "beginner" },
                "week": 1,
                "day": 1,
            }),
            201,
        )
        .await;

    assert_eq!(slot["workout_name"], "Day One");
    assert_eq!(slot["position"], 0);
}

#[tokio::test]
async fn test_program_slot_outside_duration_is_rejected() {
    let admin = Admin::new().await;
    let workout = admin.workout("Legs").await;
    let program = admin.program("Short").await;

    admin
        .post(
            &format!("/api/admin/programs/{program}/workouts"),
            json!({ "workout_id": workout, "week": 9, "day": 1 }),
            400,
        )
        .await;
}

#[tokio::test]
async fn test_move_program_workout_appends_to_target_day() {
    let admin = Admin::new().await;
    let a = admin.workout("A").await;
    let b = admin.workout("B").await;
    let program = admin.program("Mover").await;
    admin.schedule(&program, &a, 1, 3).await;
    let moving = admin.schedule(&program, &b, 1, 1).await;

    let moved = admin
        .put(
            &format!("/api/admin/program-workouts/{moving}"),
            json!({ "week": 1, "day": 3 }),
            200,
        )
        .await;

    assert_eq!(moved["day"], 3);
    assert_eq!(moved["position"], 1);
}

#[tokio::test]
async fn test_duplicate_program_then_edit_copies_shared_workout() {
    let admin = Admin::new().await;
    let squat = admin.exercise("Squat").await;
    let workout = admin.workout("Legs").await;
    admin.add_set(&workout, &squat, None).await;
    let program = admin.program("Strong 5").await;
    admin.schedule(&program, &workout, 1, 1).await;

    let copy = admin
        .post(&format!("/api/admin/programs/{program}/duplicate"), json!({}), 201)
        .await;
    assert_eq!(copy["name"], "Strong 5 (copy)");
    assert_eq!(copy["slug"], "strong-5-copy");
    assert_eq!(copy["is_published"], false);
    let copy_slot = copy["program_workouts"][0]["id"].as_str().unwrap().to_owned();
    assert_eq!(copy["program_workouts"][0]["workout_id"], workout);

    let second = admin
        .post(&format!("/api/admin/programs/{program}/duplicate"), json!({}), 201)
        .await;
    assert_eq!(second["slug"], "strong-5-copy-2");

    // Three programs now share the workout; editing through the copy forks it
    let bench = admin.exercise("Bench").await;
    let mutation = admin.add_set(&workout, &bench, Some(&copy_slot)).await;
    assert_eq!(mutation["copied"], true);

    let original = admin.get(&format!("/api/admin/workouts/{workout}")).await;
    assert_eq!(original["exercises"].as_array().unwrap().len(), 1);
    assert_eq!(original["program_workout_count"], 2);
}

#[tokio::test]
async fn test_published_program_schedule_for_users() {
    let admin = Admin::new().await;
    let a = admin.workout("A").await;
    let b = admin.workout("B").await;
    let program = admin.program("Strong 5").await;
    admin.schedule(&program, &a, 2, 1).await;
    admin.schedule(&program, &b, 1, 4).await;
    let user = admin.app.user_token("lifter");

    let listing: Value = AxumTestRequest::get("/api/programs?goal=strength")
        .bearer(&user)
        .send(admin.app.router())
        .await
        .assert_status(200)
        .json();
    assert_eq!(listing["total"], 1);

    let schedule: Value = AxumTestRequest::get("/api/programs/strong-5")
        .bearer(&user)
        .send(admin.app.router())
        .await
        .assert_status(200)
        .json();
    let weeks = schedule["weeks"].as_array().unwrap();
    assert_eq!(weeks[0]["week"], 1);
    assert_eq!(weeks[1]["week"], 2);

    let copy = admin
        .post(&format!("/api/admin/programs/{program}/duplicate"), json!({}), 201)
        .await;
    AxumTestRequest::get(&format!("/api/programs/{}", copy["slug"].as_str().unwrap()))
        .bearer(&user)
        .send(admin.app.router())
        .await
        .assert_status(404);
}
