// ABOUTME: HTTP integration tests for the calorie calculator, recipes and nutrition plans
// ABOUTME: Covers saved targets, serving scaling, plan recommendation and plan selection
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

fn male_80kg(goal: &str, save: bool) -> Value {
    json!({
        "sex": "male",
        "age": 30,
        "weight_kg": 80.0,
        "height_cm": 180.0,
        "activity_level": "moderate",
        "goal": goal,
        "save": save,
    })
}

async fn create_recipe(app: &TestApp, title: &str, calories: f64, published: bool) -> String {
    let body: Value = AxumTestRequest::post("/api/admin/recipes")
        .bearer(&app.admin_token())
        .json(&json!({
            "title": title,
            "category": "dinner",
            "prep_minutes": 10,
            "cook_minutes": 20,
            "servings": 4,
            "calories": calories,
            "protein_g": 30.0,
            "carbs_g": 40.0,
            "fat_g": 10.0,
            "ingredients": [
                { "name": "chickpeas", "quantity": 400.0, "unit": "g" },
                { "name": "lemon", "quantity": 1.0, "unit": "" }
            ],
            "steps": ["Simmer"],
            "tags": ["vegan"],
            "is_published": published,
        }))
        .send(app.router())
        .await
        .assert_status(201)
        .json();
    body["id"].as_str().unwrap().to_owned()
}

async fn create_plan(app: &TestApp, name: &str, goal: &str, calories: u32) -> String {
    let body: Value = AxumTestRequest::post("/api/admin/nutrition-plans")
        .bearer(&app.admin_token())
        .json(&json!({
            "name": name,
            "goal": goal,
            "daily_calories": calories,
            "days": 3,
            "is_published": true,
        }))
        .send(app.router())
        .await
        .assert_status(201)
        .json();
    body["id"].as_str().unwrap().to_owned()
}

// ============================================================================
// Calculator
// ============================================================================

#[tokio::test]
async fn test_calculator_reference_values() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::post("/api/dashboard/calculator")
        .bearer(&app.user_token("ada"))
        .json(&male_80kg("maintain", false))
        .send(app.router())
        .await
        .assert_status(200)
        .json();

    assert_eq!(body["bmr"], 1780);
    assert_eq!(body["tdee"], 2759);
    assert_eq!(body["target_calories"], 2759);
    assert_eq!(body["floor_applied"], false);
    assert_eq!(body["saved"], false);
}

#[tokio::test]
async fn test_calculator_accepts_imperial_units() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::post("/api/dashboard/calculator")
        .bearer(&app.user_token("ada"))
        .json(&json!({
            "sex": "female",
            "age": 40,
            "weight_lb": 140.0,
            "height_ft": 5.0,
            "height_in": 5.0,
            "activity_level": "light",
            "goal": "lose",
        }))
        .send(app.router())
        .await
        .assert_status(200)
        .json();

    let weight = body["profile"]["weight_kg"].as_f64().unwrap();
    assert!((weight - 63.5).abs() < 0.1);
    let height = body["profile"]["height_cm"].as_f64().unwrap();
    assert!((height - 165.1).abs() < 0.1);
}

#[tokio::test]
async fn test_calculator_missing_field() {
    let app = TestApp::new().await;

    let body: Value = AxumTestRequest::post("/api/dashboard/calculator")
        .bearer(&app.user_token("ada"))
        .json(&json!({ "sex": "male", "age": 30 }))
        .send(app.router())
        .await
        .assert_status(400)
        .json();

    assert_eq!(body["error"]["code"], "MISSING_REQUIRED_FIELD");
    assert!(body["error"]["details"]["field"].is_string());
}

#[tokio::test]
async fn test_saved_calculator_profile() {
    let app = TestApp::new().await;
    let token = app.user_token("ada");

    AxumTestRequest::get("/api/dashboard/calculator")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(404);

    AxumTestRequest::post("/api/dashboard/calculator")
        .bearer(&token)
        .json(&male_80kg("lose", true))
        .send(app.router())
        .await
        .assert_status(200);

    let saved: Value = AxumTestRequest::get("/api/dashboard/calculator")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(200)
        .json();
    assert_eq!(saved["target_calories"], 2259);
    assert_eq!(saved["saved"], true);

    let user = app.db().users().get("ada").await.unwrap().unwrap();
    assert_eq!(user.daily_calorie_target, Some(2259));
}

// ============================================================================
// Recipes
// ============================================================================

#[tokio::test]
async fn test_recipe_detail_scales_servings() {
    let app = TestApp::new().await;
    create_recipe(&app, "Chickpea Stew", 450.0, true).await;

    let body: Value = AxumTestRequest::get("/api/recipes/chickpea-stew?servings=2")
        .bearer(&app.user_token("ada"))
        .send(app.router())
        .await
        .assert_status(200)
        .json();

    assert_eq!(body["requested_servings"], 2);
    assert_eq!(body["scaled_ingredients"][0]["quantity"], 200.0);
    assert_eq!(body["scaled_ingredients"][1]["quantity"], 0.5);
    assert_eq!(body["totals"]["calories"], 900.0);
    assert_eq!(body["total_minutes"], 30);
}

#[tokio::test]
async fn test_recipe_servings_out_of_range() {
    let app = TestApp::new().await;
    create_recipe(&app, "Chickpea Stew", 450.0, true).await;

    AxumTestRequest::get("/api/recipes/chickpea-stew?servings=0")
        .bearer(&app.user_token("ada"))
        .send(app.router())
        .await
        .assert_status(400);
}

#[tokio::test]
async fn test_unpublished_recipes_are_hidden() {
    let app = TestApp::new().await;
    create_recipe(&app, "Chickpea Stew", 450.0, true).await;
    create_recipe(&app, "Draft Curry", 300.0, false).await;
    let token = app.user_token("ada");

    let listing: Value = AxumTestRequest::get("/api/recipes?tag=vegan")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(200)
        .json();
    assert_eq!(listing["total"], 1);

    let light: Value = AxumTestRequest::get("/api/recipes?max_calories=400")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(200)
        .json();
    assert_eq!(light["total"], 0);

    AxumTestRequest::get("/api/recipes/draft-curry")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(404);
}

#[tokio::test]
async fn test_duplicate_recipe_slug_conflicts() {
    let app = TestApp::new().await;
    create_recipe(&app, "Chickpea Stew", 450.0, true).await;

    AxumTestRequest::post("/api/admin/recipes")
        .bearer(&app.admin_token())
        .json(&json!({
            "title": "Chickpea Stew",
            "category": "dinner",
            "servings": 2,
            "calories": 300.0,
        }))
        .send(app.router())
        .await
        .assert_status(409);
}

// ============================================================================
// Nutrition plans
// ============================================================================

#[tokio::test]
async fn test_plan_meals_and_in_use_recipe() {
    let app = TestApp::new().await;
    let admin = app.admin_token();
    let recipe = create_recipe(&app, "Chickpea Stew", 400.0, true).await;
    let plan = create_plan(&app, "Lean Week", "lose", 1800).await;

    AxumTestRequest::post(&format!("/api/admin/nutrition-plans/{plan}/meals"))
        .bearer(&admin)
        .json(&json!({ "day": 1, "meal_type": "dinner", "recipe_id": recipe, "servings": 1.5 }))
        .send(app.router())
        .await
        .assert_status(201);
    AxumTestRequest::post(&format!("/api/admin/nutrition-plans/{plan}/meals"))
        .bearer(&admin)
        .json(&json!({ "day": 9, "meal_type": "lunch", "recipe_id": recipe }))
        .send(app.router())
        .await
        .assert_status(400);

    let detail: Value = AxumTestRequest::get(&format!("/api/nutrition-plans/{plan}"))
        .bearer(&app.user_token("ada"))
        .send(app.router())
        .await
        .assert_status(200)
        .json();
    let days = detail["days"].as_array().unwrap();
    assert_eq!(days.len(), 3);
    assert_eq!(days[0]["totals"]["calories"], 600.0);
    assert_eq!(days[1]["meals"].as_array().unwrap().len(), 0);

    AxumTestRequest::delete(&format!("/api/admin/recipes/{recipe}"))
        .bearer(&admin)
        .send(app.router())
        .await
        .assert_status(409);
}

#[tokio::test]
async fn test_recommendation_needs_saved_target() {
    let app = TestApp::new().await;
    create_plan(&app, "Lean Week", "lose", 1800).await;

    AxumTestRequest::get("/api/nutrition-plans/recommended")
        .bearer(&app.user_token("ada"))
        .send(app.router())
        .await
        .assert_status(404);
}

#[tokio::test]
async fn test_recommendation_prefers_goal_then_distance() {
    let app = TestApp::new().await;
    create_plan(&app, "Lean Week", "lose", 1800).await;
    create_plan(&app, "Cut Steady", "lose", 2300).await;
    create_plan(&app, "Balanced", "maintain", 2250).await;
    let token = app.user_token("ada");
    AxumTestRequest::post("/api/dashboard/calculator")
        .bearer(&token)
        .json(&male_80kg("lose", true))
        .send(app.router())
        .await
        .assert_status(200);

    let body: Value = AxumTestRequest::get("/api/nutrition-plans/recommended")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(200)
        .json();

    assert_eq!(body["target_calories"], 2259);
    assert_eq!(body["goal"], "lose");
    assert_eq!(body["plan"]["name"], "Cut Steady");
}

#[tokio::test]
async fn test_select_plan_replaces_active_plan() {
    let app = TestApp::new().await;
    let first = create_plan(&app, "Lean Week", "lose", 1800).await;
    let second = create_plan(&app, "Balanced", "maintain", 2200).await;
    let token = app.user_token("ada");

    AxumTestRequest::get("/api/me/nutrition-plan")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(404);

    for plan in [&first, &second] {
        AxumTestRequest::post(&format!("/api/nutrition-plans/{plan}/select"))
            .bearer(&token)
            .send(app.router())
            .await
            .assert_status(200);
    }

    let active: Value = AxumTestRequest::get("/api/me/nutrition-plan")
        .bearer(&token)
        .send(app.router())
        .await
        .assert_status(200)
        .json();
    assert_eq!(active["plan"]["id"], json!(second));
    assert!(active["selected_at"].is_string());
}

#[tokio::test]
async fn test_plan_filters_by_goal() {
    let app = TestApp::new().await;
    create_plan(&app, "Lean Week", "lose", 1800).await;
    create_plan(&app, "Bulk", "gain", 3200).await;

    let body: Value = AxumTestRequest::get("/api/nutrition-plans?goal=gain")
        .bearer(&app.user_token("ada"))
        .send(app.router())
        .await
        .assert_status(200)
        .json();

    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["name"], "Bulk");
}
