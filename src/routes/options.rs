// ABOUTME: Dropdown and filter panel option endpoints derived from the closed value sets
// ABOUTME: Recipe options also list the tags used by published recipes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::enums::{
    AchievementCriteria, Difficulty, Equipment, MealType, MuscleGroup, PlanGoal, Pose,
    ProgramGoal, RecipeCategory, SelectOption,
};
use crate::errors::AppError;
use crate::nutrition::{ActivityLevel, CalorieGoal, Sex};
use crate::server::ServerResources;

/// Calculator form dropdowns
#[derive(Debug, Serialize)]
pub struct CalculatorOptions {
    /// Sex choices
    pub sexes: Vec<SelectOption>,
    /// Activity levels with their descriptions
    pub activity_levels: Vec<SelectOption>,
    /// Weight goals
    pub goals: Vec<SelectOption>,
}

/// Recipe filter panel
#[derive(Debug, Serialize)]
pub struct RecipeOptions {
    /// Categories
    pub categories: Vec<SelectOption>,
    /// Tags in use, alphabetical
    pub tags: Vec<String>,
}

/// Exercise filter panel
#[derive(Debug, Serialize)]
pub struct ExerciseOptions {
    /// Muscle groups
    pub muscle_groups: Vec<SelectOption>,
    /// Equipment
    pub equipment: Vec<SelectOption>,
    /// Difficulty levels
    pub difficulties: Vec<SelectOption>,
}

/// Program filter panel
#[derive(Debug, Serialize)]
pub struct ProgramOptions {
    /// Program goals
    pub goals: Vec<SelectOption>,
    /// Difficulty levels
    pub difficulties: Vec<SelectOption>,
}

/// Nutrition plan forms
#[derive(Debug, Serialize)]
pub struct NutritionPlanOptions {
    /// Plan goals
    pub goals: Vec<SelectOption>,
    /// Meal slots
    pub meal_types: Vec<SelectOption>,
}

/// Option routes
pub struct OptionsRoutes;

impl OptionsRoutes {
    /// Create the option routes; they are public
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/options/calculator", get(Self::handle_calculator))
            .route("/api/options/recipes", get(Self::handle_recipes))
            .route("/api/options/exercises", get(Self::handle_exercises))
            .route("/api/options/programs", get(Self::handle_programs))
            .route("/api/options/nutrition-plans", get(Self::handle_nutrition_plans))
            .route("/api/options/achievements", get(Self::handle_achievements))
            .route("/api/options/progress-photos", get(Self::handle_progress_photos))
            .with_state(resources)
    }

    async fn handle_calculator() -> Json<CalculatorOptions> {
        Json(CalculatorOptions {
            sexes: Sex::options(),
            activity_levels: ActivityLevel::options(),
            goals: CalorieGoal::options(),
        })
    }

    async fn handle_recipes(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<RecipeOptions>, AppError> {
        Ok(Json(RecipeOptions {
            categories: RecipeCategory::options(),
            tags: resources.database.recipes().distinct_tags().await?,
        }))
    }

    async fn handle_exercises() -> Json<ExerciseOptions> {
        Json(ExerciseOptions {
            muscle_groups: MuscleGroup::options(),
            equipment: Equipment::options(),
            difficulties: Difficulty::options(),
        })
    }

    async fn handle_programs() -> Json<ProgramOptions> {
        Json(ProgramOptions {
            goals: ProgramGoal::options(),
            difficulties: Difficulty::options(),
        })
    }

    async fn handle_nutrition_plans() -> Json<NutritionPlanOptions> {
        Json(NutritionPlanOptions {
            goals: PlanGoal::options(),
            meal_types: MealType::options(),
        })
    }

    async fn handle_achievements() -> Json<serde_json::Value> {
        Json(serde_json::json!({ "criteria": AchievementCriteria::options() }))
    }

    async fn handle_progress_photos() -> Json<serde_json::Value> {
        Json(serde_json::json!({ "poses": Pose::options() }))
    }
}
