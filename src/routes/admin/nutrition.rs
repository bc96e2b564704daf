// ABOUTME: Admin CRUD for recipes, nutrition plans and plan meals
// ABOUTME: Recipes referenced by a plan meal cannot be deleted
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};

use super::AdminListQuery;
use crate::database::nutrition_plans::{
    NewPlanMeal, NutritionPlan, NutritionPlanDetail, NutritionPlanFilter, NutritionPlanInput,
    PlanMeal,
};
use crate::database::recipes::{Recipe, RecipeFilter, RecipeInput};
use crate::enums::{PlanGoal, RecipeCategory};
use crate::errors::AppError;
use crate::pagination::Page;
use crate::server::ServerResources;

pub(super) fn routes() -> Router<Arc<ServerResources>> {
    Router::new()
        .route(
            "/api/admin/recipes",
            get(handle_list_recipes).post(handle_create_recipe),
        )
        .route(
            "/api/admin/recipes/:id",
            get(handle_get_recipe)
                .put(handle_update_recipe)
                .delete(handle_delete_recipe),
        )
        .route(
            "/api/admin/nutrition-plans",
            get(handle_list_plans).post(handle_create_plan),
        )
        .route(
            "/api/admin/nutrition-plans/:id",
            get(handle_get_plan)
                .put(handle_update_plan)
                .delete(handle_delete_plan),
        )
        .route("/api/admin/nutrition-plans/:id/meals", post(handle_add_meal))
        .route("/api/admin/nutrition-plan-meals/:id", delete(handle_delete_meal))
}

/// Handle GET /api/admin/recipes
async fn handle_list_recipes(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Page<Recipe>>, AppError> {
    let filter = RecipeFilter {
        category: RecipeCategory::parse_filter("category", query.category.as_deref())?,
        q: query.q.clone(),
        ..RecipeFilter::default()
    };
    Ok(Json(
        resources.database.recipes().list(&filter, &query.page()).await?,
    ))
}

/// Handle POST /api/admin/recipes
async fn handle_create_recipe(
    State(resources): State<Arc<ServerResources>>,
    Json(body): Json<RecipeInput>,
) -> Result<(StatusCode, Json<Recipe>), AppError> {
    let recipe = resources.database.recipes().create(&body).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Handle GET /api/admin/recipes/:id
async fn handle_get_recipe(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<Json<Recipe>, AppError> {
    Ok(Json(resources.database.recipes().get(&id).await?))
}

/// Handle PUT /api/admin/recipes/:id
async fn handle_update_recipe(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Json(body): Json<RecipeInput>,
) -> Result<Json<Recipe>, AppError> {
    Ok(Json(resources.database.recipes().update(&id, &body).await?))
}

/// Handle DELETE /api/admin/recipes/:id
async fn handle_delete_recipe(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources.database.recipes().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle GET /api/admin/nutrition-plans
async fn handle_list_plans(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<Page<NutritionPlan>>, AppError> {
    let filter = NutritionPlanFilter {
        published_only: false,
        goal: PlanGoal::parse_filter("goal", query.goal.as_deref())?,
    };
    Ok(Json(
        resources
            .database
            .nutrition_plans()
            .list(&filter, &query.page())
            .await?,
    ))
}

/// Handle POST /api/admin/nutrition-plans
async fn handle_create_plan(
    State(resources): State<Arc<ServerResources>>,
    Json(body): Json<NutritionPlanInput>,
) -> Result<(StatusCode, Json<NutritionPlan>), AppError> {
    let plan = resources.database.nutrition_plans().create(&body).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Handle GET /api/admin/nutrition-plans/:id
async fn handle_get_plan(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<Json<NutritionPlanDetail>, AppError> {
    Ok(Json(
        resources.database.nutrition_plans().detail(&id, false).await?,
    ))
}

/// Handle PUT /api/admin/nutrition-plans/:id
async fn handle_update_plan(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
    Json(body): Json<NutritionPlanInput>,
) -> Result<Json<NutritionPlan>, AppError> {
    Ok(Json(
        resources.database.nutrition_plans().update(&id, &body).await?,
    ))
}

/// Handle DELETE /api/admin/nutrition-plans/:id
async fn handle_delete_plan(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources.database.nutrition_plans().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle POST /api/admin/nutrition-plans/:id/meals
async fn handle_add_meal(
    State(resources): State<Arc<ServerResources>>,
    Path(plan_id): Path<String>,
    Json(body): Json<NewPlanMeal>,
) -> Result<(StatusCode, Json<PlanMeal>), AppError> {
    let meal = resources
        .database
        .nutrition_plans()
        .add_meal(&plan_id, &body)
        .await?;
    Ok((StatusCode::CREATED, Json(meal)))
}

/// Handle DELETE /api/admin/nutrition-plan-meals/:id
async fn handle_delete_meal(
    State(resources): State<Arc<ServerResources>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    resources.database.nutrition_plans().delete_meal(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
