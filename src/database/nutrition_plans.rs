// ABOUTME: Nutrition plans made of recipe meals per day, plan recommendation and user plan selection
// ABOUTME: Plan detail groups meals by day with totals scaled by each meal's servings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use chrono::{DateTime, Utc};
use fithub_core::pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::filters::Filters;
use super::{new_id, now_timestamp, parse_db_timestamp, to_i64, to_u32, to_u64, Database};
use crate::enums::{MealType, PlanGoal, RecipeCategory};
use crate::errors::{AppError, AppResult};
use crate::nutrition::scaling::{round2, NutritionTotals};
use crate::utils::validation::{in_range, require_title, text};

/// Most servings a single plan meal may use
pub const MAX_MEAL_SERVINGS: f64 = 20.0;

/// A nutrition plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NutritionPlan {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Weight goal family
    pub goal: PlanGoal,
    /// Intended daily intake
    pub daily_calories: u32,
    /// Number of days the plan covers
    pub days: u32,
    /// Visible on the dashboard
    pub is_published: bool,
    /// Number of planned meals
    pub meal_count: u32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Admin form for a plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionPlanInput {
    /// Display name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Weight goal family
    pub goal: PlanGoal,
    /// Intended daily intake
    pub daily_calories: u32,
    /// Number of days the plan covers
    pub days: u32,
    /// Visible on the dashboard
    #[serde(default)]
    pub is_published: bool,
}

/// Plan list filter
#[derive(Debug, Clone, Default)]
pub struct NutritionPlanFilter {
    /// Only published plans
    pub published_only: bool,
    /// Goal family
    pub goal: Option<PlanGoal>,
}

/// Per-serving recipe facts shown inside a plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecipeSummary {
    /// Recipe id
    pub id: String,
    /// Title
    pub title: String,
    /// Slug
    pub slug: String,
    /// Category
    pub category: RecipeCategory,
    /// Photo
    pub image_url: Option<String>,
    /// Calories per serving
    pub calories: f64,
    /// Protein per serving (g)
    pub protein_g: f64,
    /// Carbohydrates per serving (g)
    pub carbs_g: f64,
    /// Fat per serving (g)
    pub fat_g: f64,
}

/// A recipe placed on a plan day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanMeal {
    /// Unique identifier
    pub id: String,
    /// Owning plan
    pub plan_id: String,
    /// Day, 1-based
    pub day: u32,
    /// Meal slot
    pub meal_type: MealType,
    /// Servings eaten
    pub servings: f64,
    /// The recipe
    pub recipe: RecipeSummary,
}

impl PlanMeal {
    fn totals(&self) -> NutritionTotals {
        NutritionTotals {
            calories: self.recipe.calories * self.servings,
            protein_g: self.recipe.protein_g * self.servings,
            carbs_g: self.recipe.carbs_g * self.servings,
            fat_g: self.recipe.fat_g * self.servings,
        }
    }
}

/// Add a recipe to a plan day
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPlanMeal {
    /// Day, 1-based
    pub day: u32,
    /// Meal slot
    pub meal_type: MealType,
    /// Recipe to eat
    pub recipe_id: String,
    /// Servings eaten
    #[serde(default = "default_servings")]
    pub servings: f64,
}

const fn default_servings() -> f64 {
    1.0
}

/// One plan day
#[derive(Debug, Clone, Serialize)]
pub struct PlanDay {
    /// Day, 1-based
    pub day: u32,
    /// Meals by slot
    pub meals: Vec<PlanMeal>,
    /// Day totals
    pub totals: NutritionTotals,
}

/// Plan with every day laid out
#[derive(Debug, Clone, Serialize)]
pub struct NutritionPlanDetail {
    /// The plan row
    #[serde(flatten)]
    pub plan: NutritionPlan,
    /// Days 1..=days
    pub days: Vec<PlanDay>,
}

/// A user's selected plan
#[derive(Debug, Clone, Serialize)]
pub struct ActiveNutritionPlan {
    /// When it was selected
    pub selected_at: DateTime<Utc>,
    /// The plan
    pub plan: NutritionPlanDetail,
}

struct ValidPlan {
    name: String,
    description: String,
    goal: PlanGoal,
    daily_calories: u32,
    days: u32,
    is_published: bool,
}

impl NutritionPlanInput {
    fn validate(&self) -> AppResult<ValidPlan> {
        Ok(ValidPlan {
            name: require_title("name", &self.name)?,
            description: text("description", self.description.as_deref())?,
            goal: self.goal,
            daily_calories: in_range("daily_calories", self.daily_calories, 800, 6000)?,
            days: in_range("days", self.days, 1, 28)?,
            is_published: self.is_published,
        })
    }
}

impl Database {
    pub(super) async fn migrate_nutrition_plans(&self) -> AppResult<()> {
        self.execute_all(&[
            r"
            CREATE TABLE IF NOT EXISTS nutrition_plans (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                goal TEXT NOT NULL,
                daily_calories INTEGER NOT NULL,
                days INTEGER NOT NULL CHECK (days >= 1),
                is_published INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            r"
            CREATE TABLE IF NOT EXISTS nutrition_plan_meals (
                id TEXT PRIMARY KEY,
                plan_id TEXT NOT NULL REFERENCES nutrition_plans(id) ON DELETE CASCADE,
                day INTEGER NOT NULL CHECK (day >= 1),
                meal_type TEXT NOT NULL,
                recipe_id TEXT NOT NULL REFERENCES recipes(id) ON DELETE RESTRICT,
                servings REAL NOT NULL CHECK (servings > 0),
                created_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_plan_meals_plan ON nutrition_plan_meals(plan_id, day)",
            "CREATE INDEX IF NOT EXISTS idx_plan_meals_recipe ON nutrition_plan_meals(recipe_id)",
            r"
            CREATE TABLE IF NOT EXISTS user_nutrition_plans (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                plan_id TEXT NOT NULL REFERENCES nutrition_plans(id) ON DELETE CASCADE,
                selected_at TEXT NOT NULL
            )
            ",
        ])
        .await
    }
}

const PLAN_COLUMNS: &str = r"
    np.id, np.name, np.description, np.goal, np.daily_calories, np.days, np.is_published,
    np.created_at, np.updated_at,
    (SELECT COUNT(*) FROM nutrition_plan_meals m WHERE m.plan_id = np.id) AS meal_count
";

/// Nutrition plan database operations
pub struct NutritionPlansManager {
    pool: SqlitePool,
}

impl NutritionPlansManager {
    /// Create a new nutrition plans manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create an empty plan
    ///
    /// # Errors
    ///
    /// Returns invalid input for bad fields
    pub async fn create(&self, input: &NutritionPlanInput) -> AppResult<NutritionPlan> {
        let plan = input.validate()?;
        let id = new_id();
        sqlx::query(
            r"
            INSERT INTO nutrition_plans (id, name, description, goal, daily_calories, days,
                                         is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            ",
        )
        .bind(&id)
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.goal.as_str())
        .bind(to_i64(plan.daily_calories))
        .bind(to_i64(plan.days))
        .bind(plan.is_published)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        self.get(&id).await
    }

    /// Get a plan row
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn get(&self, id: &str) -> AppResult<NutritionPlan> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM nutrition_plans np WHERE np.id = $1");
        sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_plan)
            .transpose()?
            .ok_or_else(|| AppError::not_found("Nutrition plan"))
    }

    /// List plans by daily calories
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(
        &self,
        filter: &NutritionPlanFilter,
        page: &PageParams,
    ) -> AppResult<Page<NutritionPlan>> {
        let mut filters = Filters::new();
        if filter.published_only {
            filters.push("np.is_published = 1");
        }
        if let Some(goal) = filter.goal {
            filters.push_text("np.goal = ?", goal.as_str());
        }
        let where_clause = filters.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM nutrition_plans np {where_clause}");
        let (total,): (i64,) = filters
            .bind_as(sqlx::query_as(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "SELECT {PLAN_COLUMNS} FROM nutrition_plans np {where_clause} ORDER BY np.daily_calories, np.name, np.id LIMIT ? OFFSET ?"
        );
        let rows = filters
            .bind(sqlx::query(&list_sql))
            .bind(i64::from(page.limit()))
            .bind(i64::from(page.offset()))
            .fetch_all(&self.pool)
            .await?;
        let items = rows.iter().map(row_to_plan).collect::<AppResult<Vec<_>>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }

    /// Replace a plan's fields
    ///
    /// # Errors
    ///
    /// Returns not found, or invalid input including shrinking below a planned day
    pub async fn update(&self, id: &str, input: &NutritionPlanInput) -> AppResult<NutritionPlan> {
        let plan = input.validate()?;
        let last_day: Option<i64> =
            sqlx::query_scalar("SELECT MAX(day) FROM nutrition_plan_meals WHERE plan_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if let Some(last_day) = last_day.filter(|d| *d > to_i64(plan.days)) {
            return Err(AppError::invalid_input(format!(
                "days cannot be below planned day {last_day}"
            )));
        }

        let result = sqlx::query(
            r"
            UPDATE nutrition_plans SET name = $1, description = $2, goal = $3,
                daily_calories = $4, days = $5, is_published = $6, updated_at = $7
            WHERE id = $8
            ",
        )
        .bind(&plan.name)
        .bind(&plan.description)
        .bind(plan.goal.as_str())
        .bind(to_i64(plan.daily_calories))
        .bind(to_i64(plan.days))
        .bind(plan.is_published)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Nutrition plan"));
        }
        self.get(id).await
    }

    /// Delete a plan, its meals and any user selections of it
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM nutrition_plans WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Nutrition plan"));
        }
        Ok(())
    }

    /// Place a recipe on a plan day
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown plan, invalid input for a day
    /// outside the plan, bad servings or an unknown recipe
    pub async fn add_meal(&self, plan_id: &str, meal: &NewPlanMeal) -> AppResult<PlanMeal> {
        let plan = self.get(plan_id).await?;
        in_range("day", meal.day, 1, plan.days)?;
        if !(meal.servings > 0.0 && meal.servings <= MAX_MEAL_SERVINGS) {
            return Err(AppError::invalid_input(format!(
                "servings must be greater than 0 and at most {MAX_MEAL_SERVINGS}"
            )));
        }
        let recipe: Option<String> = sqlx::query_scalar("SELECT id FROM recipes WHERE id = $1")
            .bind(&meal.recipe_id)
            .fetch_optional(&self.pool)
            .await?;
        if recipe.is_none() {
            return Err(AppError::invalid_input(format!(
                "Unknown recipe_id {}",
                meal.recipe_id
            )));
        }

        let id = new_id();
        let now = now_timestamp();
        sqlx::query(
            r"
            INSERT INTO nutrition_plan_meals (id, plan_id, day, meal_type, recipe_id, servings, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(&id)
        .bind(plan_id)
        .bind(to_i64(meal.day))
        .bind(meal.meal_type.as_str())
        .bind(&meal.recipe_id)
        .bind(meal.servings)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        sqlx::query("UPDATE nutrition_plans SET updated_at = $1 WHERE id = $2")
            .bind(&now)
            .bind(plan_id)
            .execute(&self.pool)
            .await?;

        let sql = format!("{MEAL_SELECT} WHERE m.id = $1");
        let row = sqlx::query(&sql).bind(&id).fetch_one(&self.pool).await?;
        row_to_meal(&row)
    }

    /// Remove a meal from its plan
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn delete_meal(&self, id: &str) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM nutrition_plan_meals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Nutrition plan meal"));
        }
        Ok(())
    }

    /// Plan with meals grouped by day and per-day totals
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown plan, or an unpublished one when
    /// `published_only` is set
    pub async fn detail(&self, id: &str, published_only: bool) -> AppResult<NutritionPlanDetail> {
        let plan = self.get(id).await?;
        if published_only && !plan.is_published {
            return Err(AppError::not_found("Nutrition plan"));
        }

        let sql = format!("{MEAL_SELECT} WHERE m.plan_id = $1 ORDER BY m.day, m.created_at, m.id");
        let rows = sqlx::query(&sql).bind(id).fetch_all(&self.pool).await?;
        let mut meals = rows.iter().map(row_to_meal).collect::<AppResult<Vec<_>>>()?;
        meals.sort_by_key(|m| (m.day, m.meal_type.rank()));

        let days = (1..=plan.days)
            .map(|day| {
                let meals: Vec<PlanMeal> = meals.iter().filter(|m| m.day == day).cloned().collect();
                let totals = day_totals(&meals);
                PlanDay { day, meals, totals }
            })
            .collect();
        Ok(NutritionPlanDetail { plan, days })
    }

    /// Published plan closest to a calorie target, preferring the matching goal family
    ///
    /// # Errors
    ///
    /// Returns not found when no plan is published
    pub async fn recommended(
        &self,
        target_calories: u32,
        goal: Option<PlanGoal>,
    ) -> AppResult<NutritionPlan> {
        let sql = format!("SELECT {PLAN_COLUMNS} FROM nutrition_plans np WHERE np.is_published = 1");
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        let plans = rows.iter().map(row_to_plan).collect::<AppResult<Vec<_>>>()?;
        plans
            .into_iter()
            .min_by_key(|plan| {
                (
                    goal.is_some_and(|g| g != plan.goal),
                    plan.daily_calories.abs_diff(target_calories),
                    plan.name.to_lowercase(),
                    plan.id.clone(),
                )
            })
            .ok_or_else(|| AppError::not_found("Nutrition plan"))
    }

    /// Make a published plan the user's active plan
    ///
    /// # Errors
    ///
    /// Returns not found for an unknown or unpublished plan
    pub async fn select(&self, user_id: &str, plan_id: &str) -> AppResult<ActiveNutritionPlan> {
        let plan = self.get(plan_id).await?;
        if !plan.is_published {
            return Err(AppError::not_found("Nutrition plan"));
        }
        sqlx::query(
            r"
            INSERT INTO user_nutrition_plans (user_id, plan_id, selected_at)
            VALUES ($1, $2, $3)
            ON CONFLICT(user_id) DO UPDATE SET plan_id = excluded.plan_id,
                                               selected_at = excluded.selected_at
            ",
        )
        .bind(user_id)
        .bind(plan_id)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        self.active(user_id)
            .await?
            .ok_or_else(|| AppError::internal("Selected plan vanished"))
    }

    /// The user's active plan, if any
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails
    pub async fn active(&self, user_id: &str) -> AppResult<Option<ActiveNutritionPlan>> {
        let row = sqlx::query("SELECT plan_id, selected_at FROM user_nutrition_plans WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let plan_id: String = row.get("plan_id");
        let selected_at: String = row.get("selected_at");
        Ok(Some(ActiveNutritionPlan {
            selected_at: parse_db_timestamp(&selected_at)?,
            plan: self.detail(&plan_id, false).await?,
        }))
    }
}

const MEAL_SELECT: &str = r"
    SELECT m.id, m.plan_id, m.day, m.meal_type, m.servings,
           r.id AS recipe_id, r.title, r.slug, r.category, r.image_url,
           r.calories, r.protein_g, r.carbs_g, r.fat_g
    FROM nutrition_plan_meals m
    JOIN recipes r ON r.id = m.recipe_id
";

fn day_totals(meals: &[PlanMeal]) -> NutritionTotals {
    let sum = meals.iter().map(PlanMeal::totals).fold(
        NutritionTotals {
            calories: 0.0,
            protein_g: 0.0,
            carbs_g: 0.0,
            fat_g: 0.0,
        },
        |acc, t| NutritionTotals {
            calories: acc.calories + t.calories,
            protein_g: acc.protein_g + t.protein_g,
            carbs_g: acc.carbs_g + t.carbs_g,
            fat_g: acc.fat_g + t.fat_g,
        },
    );
    NutritionTotals {
        calories: round2(sum.calories),
        protein_g: round2(sum.protein_g),
        carbs_g: round2(sum.carbs_g),
        fat_g: round2(sum.fat_g),
    }
}

fn row_to_plan(row: &SqliteRow) -> AppResult<NutritionPlan> {
    let goal: String = row.get("goal");
    let daily_calories: i64 = row.get("daily_calories");
    let days: i64 = row.get("days");
    let meal_count: i64 = row.get("meal_count");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    Ok(NutritionPlan {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        goal: PlanGoal::from_db(&goal)?,
        daily_calories: to_u32(daily_calories),
        days: to_u32(days),
        is_published: row.get("is_published"),
        meal_count: to_u32(meal_count),
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}

fn row_to_meal(row: &SqliteRow) -> AppResult<PlanMeal> {
    let day: i64 = row.get("day");
    let meal_type: String = row.get("meal_type");
    let category: String = row.get("category");
    Ok(PlanMeal {
        id: row.get("id"),
        plan_id: row.get("plan_id"),
        day: to_u32(day),
        meal_type: MealType::from_db(&meal_type)?,
        servings: row.get("servings"),
        recipe: RecipeSummary {
            id: row.get("recipe_id"),
            title: row.get("title"),
            slug: row.get("slug"),
            category: RecipeCategory::from_db(&category)?,
            image_url: row.get("image_url"),
            calories: row.get("calories"),
            protein_g: row.get("protein_g"),
            carbs_g: row.get("carbs_g"),
            fat_g: row.get("fat_g"),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::recipes::RecipeInput;

    fn plan_input(name: &str, goal: PlanGoal, calories: u32) -> NutritionPlanInput {
        NutritionPlanInput {
            name: name.to_owned(),
            description: None,
            goal,
            daily_calories: calories,
            days: 2,
            is_published: true,
        }
    }

    #[tokio::test]
    async fn test_detail_totals_scale_by_servings() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let recipe = db
            .recipes()
            .create(&RecipeInput {
                title: "Chicken Bowl".to_owned(),
                slug: None,
                description: None,
                category: RecipeCategory::Lunch,
                prep_minutes: 10,
                cook_minutes: 15,
                servings: 1,
                calories: 500.0,
                protein_g: 40.0,
                carbs_g: 50.0,
                fat_g: 12.0,
                ingredients: vec![],
                steps: vec![],
                tags: vec![],
                image_url: None,
                is_published: true,
            })
            .await
            .unwrap();
        let plans = db.nutrition_plans();
        let plan = plans.create(&plan_input("Lean", PlanGoal::Lose, 1800)).await.unwrap();
        for (meal_type, servings) in [(MealType::Dinner, 1.5), (MealType::Lunch, 1.0)] {
            plans
                .add_meal(
                    &plan.id,
                    &NewPlanMeal {
                        day: 1,
                        meal_type,
                        recipe_id: recipe.id.clone(),
                        servings,
                    },
                )
                .await
                .unwrap();
        }

        let detail = plans.detail(&plan.id, true).await.unwrap();
        assert_eq!(detail.days.len(), 2);
        assert_eq!(detail.days[0].meals[0].meal_type, MealType::Lunch);
        assert!((detail.days[0].totals.calories - 1250.0).abs() < f64::EPSILON);
        assert!((detail.days[0].totals.protein_g - 100.0).abs() < f64::EPSILON);
        assert!(detail.days[1].meals.is_empty());

        let outside = plans
            .add_meal(
                &plan.id,
                &NewPlanMeal {
                    day: 3,
                    meal_type: MealType::Snack,
                    recipe_id: recipe.id.clone(),
                    servings: 1.0,
                },
            )
            .await;
        assert!(outside.is_err());
        assert!(db.recipes().delete(&recipe.id).await.is_err());
    }

    #[tokio::test]
    async fn test_recommended_prefers_goal_then_distance() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let plans = db.nutrition_plans();
        plans.create(&plan_input("Cut", PlanGoal::Lose, 1800)).await.unwrap();
        plans.create(&plan_input("Steady", PlanGoal::Maintain, 2200)).await.unwrap();
        plans.create(&plan_input("Bulk", PlanGoal::Gain, 2900)).await.unwrap();

        let closest = plans.recommended(2150, None).await.unwrap();
        assert_eq!(closest.name, "Steady");
        let family = plans.recommended(2150, Some(PlanGoal::Lose)).await.unwrap();
        assert_eq!(family.name, "Cut");
    }
}
