// ABOUTME: Dashboard calorie calculator, recipe browsing and nutrition plan selection
// ABOUTME: Recipe details scale to a requested serving count; plans are recommended from the saved target
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;
use crate::database::nutrition_plans::{
    ActiveNutritionPlan, NutritionPlan, NutritionPlanDetail, NutritionPlanFilter,
};
use crate::database::recipes::{Recipe, RecipeFilter};
use crate::enums::{PlanGoal, RecipeCategory};
use crate::errors::AppError;
use crate::nutrition::scaling::{scale_recipe, ScaledRecipe};
use crate::nutrition::{calculate, CalculatorInput, CalorieResult};
use crate::pagination::{Page, PageParams};
use crate::server::ServerResources;

/// Calculator form submission
#[derive(Debug, Deserialize)]
pub struct CalculatorRequest {
    /// Measurements and choices
    #[serde(flatten)]
    pub input: CalculatorInput,
    /// Store the profile and target on the account
    #[serde(default)]
    pub save: bool,
}

/// Calculator result
#[derive(Debug, Serialize, Deserialize)]
pub struct CalculatorResponse {
    /// Computed numbers
    #[serde(flatten)]
    pub result: CalorieResult,
    /// Whether the profile is stored on the account
    pub saved: bool,
}

/// Query parameters for the recipe catalog
#[derive(Debug, Deserialize, Default)]
pub struct RecipeQuery {
    /// Category
    pub category: Option<String>,
    /// Upper bound on calories per serving
    pub max_calories: Option<f64>,
    /// Lower bound on protein per serving (g)
    pub min_protein: Option<f64>,
    /// Tag
    pub tag: Option<String>,
    /// Search term
    pub q: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub offset: Option<u32>,
}

/// Query parameters for a recipe detail
#[derive(Debug, Deserialize, Default)]
pub struct ServingsQuery {
    /// Servings to scale to
    pub servings: Option<u32>,
}

/// Query parameters for the plan catalog
#[derive(Debug, Deserialize, Default)]
pub struct PlanQuery {
    /// Goal family
    pub goal: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Page offset
    pub offset: Option<u32>,
}

/// Recommended plan and what it was matched against
#[derive(Debug, Serialize)]
pub struct RecommendedPlanResponse {
    /// The caller's saved daily target
    pub target_calories: u32,
    /// Goal family of the saved calculator profile
    pub goal: Option<PlanGoal>,
    /// Closest published plan
    pub plan: NutritionPlan,
}

pub(super) fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route(
            "/api/dashboard/calculator",
            get(handle_get_calculator).post(handle_calculate),
        )
        .route("/api/recipes", get(handle_list_recipes))
        .route("/api/recipes/:slug", get(handle_get_recipe))
        .route("/api/nutrition-plans", get(handle_list_plans))
        .route("/api/nutrition-plans/recommended", get(handle_recommended_plan))
        .route("/api/nutrition-plans/:id", get(handle_get_plan))
        .route("/api/nutrition-plans/:id/select", post(handle_select_plan))
        .route("/api/me/nutrition-plan", get(handle_active_plan))
}

/// Handle POST /api/dashboard/calculator
async fn handle_calculate(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    Json(body): Json<CalculatorRequest>,
) -> Result<Json<CalculatorResponse>, AppError> {
    let profile = body.input.to_profile()?;
    let result = calculate(&profile);
    if body.save {
        resources
            .database
            .users()
            .save_calculator_profile(&user.user_id, &result.profile, result.target_calories)
            .await?;
    }
    Ok(Json(CalculatorResponse {
        result,
        saved: body.save,
    }))
}

/// Handle GET /api/dashboard/calculator
async fn handle_get_calculator(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<CalculatorResponse>, AppError> {
    let profile = resources
        .database
        .users()
        .get_calculator_profile(&user.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("Calculator profile"))?;
    Ok(Json(CalculatorResponse {
        result: calculate(&profile),
        saved: true,
    }))
}

/// Handle GET /api/recipes
async fn handle_list_recipes(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<RecipeQuery>,
) -> Result<Json<Page<Recipe>>, AppError> {
    let filter = RecipeFilter {
        published_only: true,
        category: RecipeCategory::parse_filter("category", query.category.as_deref())?,
        max_calories: query.max_calories,
        min_protein: query.min_protein,
        tag: query.tag,
        q: query.q,
    };
    let page = PageParams {
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(resources.database.recipes().list(&filter, &page).await?))
}

/// Handle GET /api/recipes/:slug
async fn handle_get_recipe(
    State(resources): State<Arc<ServerResources>>,
    Path(slug): Path<String>,
    Query(query): Query<ServingsQuery>,
) -> Result<Json<ScaledRecipe>, AppError> {
    let recipe = resources.database.recipes().get_published_by_slug(&slug).await?;
    Ok(Json(scale_recipe(recipe, query.servings)?))
}

/// Handle GET /api/nutrition-plans
async fn handle_list_plans(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<PlanQuery>,
) -> Result<Json<Page<NutritionPlan>>, AppError> {
    let filter = NutritionPlanFilter {
        published_only: true,
        goal: PlanGoal::parse_filter("goal", query.goal.as_deref())?,
    };
    let page = PageParams {
        limit: query.limit,
        offset: query.offset,
    };
    Ok(Json(
        resources.database.nutrition_plans().list(&filter, &page).await?,
    ))
}

/// Handle GET /api/nutrition-plans/recommended
async fn handle_recommended_plan(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<RecommendedPlanResponse>, AppError> {
    let users = resources.database.users();
    let target_calories = users
        .get(&user.user_id)
        .await?
        .and_then(|u| u.daily_calorie_target)
        .ok_or_else(|| {
            AppError::not_found("Saved calorie target")
                .with_details(serde_json::json!({ "hint": "Save a calculator result first" }))
        })?;
    let goal = users
        .get_calculator_profile(&user.user_id)
        .await?
        .map(|p| p.goal.family());
    let plan = resources
        .database
        .nutrition_plans()
        .recommended(target_calories, goal)
        .await?;

    Ok(Json(RecommendedPlanResponse {
        target_calories,
        goal,
        plan,
    }))
}

/// Handle GET /api/nutrition-plans/:id
async fn handle_get_plan(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<Json<NutritionPlanDetail>, AppError> {
    Ok(Json(resources.database.nutrition_plans().detail(&id, true).await?))
}

/// Handle POST /api/nutrition-plans/:id/select
async fn handle_select_plan(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> Result<Json<ActiveNutritionPlan>, AppError> {
    Ok(Json(
        resources
            .database
            .nutrition_plans()
            .select(&user.user_id, &id)
            .await?,
    ))
}

/// Handle GET /api/me/nutrition-plan
async fn handle_active_plan(
    State(resources): State<Arc<ServerResources>>,
    Extension(user): Extension<AuthenticatedUser>,
) -> Result<Json<ActiveNutritionPlan>, AppError> {
    resources
        .database
        .nutrition_plans()
        .active(&user.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("Active nutrition plan"))
}
