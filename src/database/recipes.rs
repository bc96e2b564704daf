// ABOUTME: Recipe catalog operations with per-serving macros, ingredients, steps and tags
// ABOUTME: JSON array columns hold ingredients, steps and tags; deletes are blocked while plans use a recipe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use chrono::{DateTime, Utc};
use fithub_core::pagination::{Page, PageParams};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use super::filters::Filters;
use super::{json_column, new_id, now_timestamp, parse_db_timestamp, to_u32, to_u64, Database};
use crate::enums::RecipeCategory;
use crate::errors::{AppError, AppResult};
use crate::utils::slug::{is_valid_slug, slugify};
use crate::utils::validation::{clean_list, in_range, optional_url, require_title, text};

/// One ingredient line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    /// Ingredient name
    pub name: String,
    /// Amount for the recipe's base servings
    pub quantity: f64,
    /// Unit such as `g`, `ml` or `tbsp`
    #[serde(default)]
    pub unit: String,
}

/// A recipe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recipe {
    /// Unique identifier
    pub id: String,
    /// Title
    pub title: String,
    /// Unique URL slug
    pub slug: String,
    /// Description
    pub description: String,
    /// Category
    pub category: RecipeCategory,
    /// Preparation time
    pub prep_minutes: u32,
    /// Cooking time
    pub cook_minutes: u32,
    /// Servings the ingredient quantities make
    pub servings: u32,
    /// Calories per serving
    pub calories: f64,
    /// Protein per serving (g)
    pub protein_g: f64,
    /// Carbohydrates per serving (g)
    pub carbs_g: f64,
    /// Fat per serving (g)
    pub fat_g: f64,
    /// Ingredients for `servings`
    pub ingredients: Vec<Ingredient>,
    /// Method steps
    pub steps: Vec<String>,
    /// Lowercase tags
    pub tags: Vec<String>,
    /// Photo
    pub image_url: Option<String>,
    /// Visible on the dashboard
    pub is_published: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Admin form for a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeInput {
    /// Title
    pub title: String,
    /// Slug; derived from the title when absent
    #[serde(default)]
    pub slug: Option<String>,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Category
    pub category: RecipeCategory,
    /// Preparation time
    #[serde(default)]
    pub prep_minutes: u32,
    /// Cooking time
    #[serde(default)]
    pub cook_minutes: u32,
    /// Servings (at least 1)
    pub servings: u32,
    /// Calories per serving
    pub calories: f64,
    /// Protein per serving (g)
    #[serde(default)]
    pub protein_g: f64,
    /// Carbohydrates per serving (g)
    #[serde(default)]
    pub carbs_g: f64,
    /// Fat per serving (g)
    #[serde(default)]
    pub fat_g: f64,
    /// Ingredients
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    /// Method steps
    #[serde(default)]
    pub steps: Vec<String>,
    /// Tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Photo
    #[serde(default)]
    pub image_url: Option<String>,
    /// Visible on the dashboard
    #[serde(default)]
    pub is_published: bool,
}

/// Recipe list filter
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Only published recipes
    pub published_only: bool,
    /// Category
    pub category: Option<RecipeCategory>,
    /// Upper bound on calories per serving
    pub max_calories: Option<f64>,
    /// Lower bound on protein per serving
    pub min_protein: Option<f64>,
    /// Tag (case-insensitive)
    pub tag: Option<String>,
    /// Title or description search
    pub q: Option<String>,
}

struct ValidRecipe {
    title: String,
    slug: String,
    description: String,
    ingredients: String,
    steps: String,
    tags: String,
    image_url: Option<String>,
}

impl RecipeInput {
    fn validate(&self) -> AppResult<ValidRecipe> {
        let title = require_title("title", &self.title)?;
        let slug = match self.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(slug) if is_valid_slug(slug) => slug.to_owned(),
            Some(slug) => return Err(AppError::invalid_input(format!("Invalid slug: {slug}"))),
            None => slugify(&title),
        };
        if slug.is_empty() {
            return Err(AppError::invalid_input("title must contain letters or digits"));
        }
        in_range("servings", self.servings, 1, 100)?;
        in_range("prep_minutes", self.prep_minutes, 0, 1440)?;
        in_range("cook_minutes", self.cook_minutes, 0, 1440)?;
        for (field, value) in [
            ("calories", self.calories),
            ("protein_g", self.protein_g),
            ("carbs_g", self.carbs_g),
            ("fat_g", self.fat_g),
        ] {
            if !value.is_finite() {
                return Err(AppError::invalid_input(format!("{field} must be a number")));
            }
            in_range(field, value, 0.0, 10_000.0)?;
        }

        let mut ingredients = Vec::with_capacity(self.ingredients.len());
        for ingredient in &self.ingredients {
            let name = require_title("ingredient name", &ingredient.name)?;
            if !ingredient.quantity.is_finite() || ingredient.quantity < 0.0 {
                return Err(AppError::invalid_input(format!(
                    "Quantity of {name} must be zero or more"
                )));
            }
            ingredients.push(Ingredient {
                name,
                quantity: ingredient.quantity,
                unit: ingredient.unit.trim().to_owned(),
            });
        }

        let mut tags: Vec<String> = clean_list(self.tags.clone())
            .into_iter()
            .map(|t| t.to_lowercase())
            .collect();
        tags.sort();
        tags.dedup();

        Ok(ValidRecipe {
            title,
            slug,
            description: text("description", self.description.as_deref())?,
            ingredients: serde_json::to_string(&ingredients)?,
            steps: serde_json::to_string(&clean_list(self.steps.clone()))?,
            tags: serde_json::to_string(&tags)?,
            image_url: optional_url("image_url", self.image_url.as_deref())?,
        })
    }
}

impl Database {
    pub(super) async fn migrate_recipes(&self) -> AppResult<()> {
        self.execute_all(&[
            r"
            CREATE TABLE IF NOT EXISTS recipes (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                category TEXT NOT NULL,
                prep_minutes INTEGER NOT NULL DEFAULT 0,
                cook_minutes INTEGER NOT NULL DEFAULT 0,
                servings INTEGER NOT NULL CHECK (servings >= 1),
                calories REAL NOT NULL,
                protein_g REAL NOT NULL DEFAULT 0,
                carbs_g REAL NOT NULL DEFAULT 0,
                fat_g REAL NOT NULL DEFAULT 0,
                ingredients TEXT NOT NULL DEFAULT '[]',
                steps TEXT NOT NULL DEFAULT '[]',
                tags TEXT NOT NULL DEFAULT '[]',
                image_url TEXT,
                is_published INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_recipes_category ON recipes(category)",
        ])
        .await
    }
}

/// Recipe database operations
pub struct RecipesManager {
    pool: SqlitePool,
}

impl RecipesManager {
    /// Create a new recipes manager
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a recipe
    ///
    /// # Errors
    ///
    /// Returns invalid input for bad fields and a conflict for a taken slug
    pub async fn create(&self, input: &RecipeInput) -> AppResult<Recipe> {
        let recipe = input.validate()?;
        let id = new_id();
        sqlx::query(
            r"
            INSERT INTO recipes (id, title, slug, description, category, prep_minutes,
                cook_minutes, servings, calories, protein_g, carbs_g, fat_g, ingredients,
                steps, tags, image_url, is_published, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                    $17, $18, $18)
            ",
        )
        .bind(&id)
        .bind(&recipe.title)
        .bind(&recipe.slug)
        .bind(&recipe.description)
        .bind(input.category.as_str())
        .bind(i64::from(input.prep_minutes))
        .bind(i64::from(input.cook_minutes))
        .bind(i64::from(input.servings))
        .bind(input.calories)
        .bind(input.protein_g)
        .bind(input.carbs_g)
        .bind(input.fat_g)
        .bind(&recipe.ingredients)
        .bind(&recipe.steps)
        .bind(&recipe.tags)
        .bind(&recipe.image_url)
        .bind(input.is_published)
        .bind(now_timestamp())
        .execute(&self.pool)
        .await?;
        self.get(&id).await
    }

    /// Get a recipe by id
    ///
    /// # Errors
    ///
    /// Returns not found when it does not exist
    pub async fn get(&self, id: &str) -> AppResult<Recipe> {
        sqlx::query("SELECT * FROM recipes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_recipe)
            .transpose()?
            .ok_or_else(|| AppError::not_found("Recipe"))
    }

    /// Get a published recipe by slug
    ///
    /// # Errors
    ///
    /// Returns not found when no published recipe has the slug
    pub async fn get_published_by_slug(&self, slug: &str) -> AppResult<Recipe> {
        sqlx::query("SELECT * FROM recipes WHERE slug = $1 AND is_published = 1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(row_to_recipe)
            .transpose()?
            .ok_or_else(|| AppError::not_found("Recipe"))
    }

    /// List recipes alphabetically
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn list(&self, filter: &RecipeFilter, page: &PageParams) -> AppResult<Page<Recipe>> {
        let mut filters = Filters::new();
        if filter.published_only {
            filters.push("is_published = 1");
        }
        if let Some(category) = filter.category {
            filters.push_text("category = ?", category.as_str());
        }
        if let Some(max_calories) = filter.max_calories {
            filters.push_real("calories <= ?", max_calories);
        }
        if let Some(min_protein) = filter.min_protein {
            filters.push_real("protein_g >= ?", min_protein);
        }
        if let Some(tag) = filter.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            filters.push_text(
                "EXISTS (SELECT 1 FROM json_each(recipes.tags) WHERE json_each.value = ?)",
                tag.to_lowercase(),
            );
        }
        filters.push_search(&["title", "description"], filter.q.as_deref());
        let where_clause = filters.where_clause();

        let count_sql = format!("SELECT COUNT(*) FROM recipes {where_clause}");
        let (total,): (i64,) = filters
            .bind_as(sqlx::query_as(&count_sql))
            .fetch_one(&self.pool)
            .await?;

        let list_sql = format!(
            "SELECT * FROM recipes {where_clause} ORDER BY title COLLATE NOCASE, id LIMIT ? OFFSET ?"
        );
        let rows = filters
            .bind(sqlx::query(&list_sql))
            .bind(i64::from(page.limit()))
            .bind(i64::from(page.offset()))
            .fetch_all(&self.pool)
            .await?;
        let items = rows.iter().map(row_to_recipe).collect::<AppResult<Vec<_>>>()?;
        Ok(Page::new(items, to_u64(total), page))
    }

    /// Replace a recipe's fields
    ///
    /// # Errors
    ///
    /// Returns not found, invalid input or a slug conflict
    pub async fn update(&self, id: &str, input: &RecipeInput) -> AppResult<Recipe> {
        let recipe = input.validate()?;
        let result = sqlx::query(
            r"
            UPDATE recipes SET title = $1, slug = $2, description = $3, category = $4,
                prep_minutes = $5, cook_minutes = $6, servings = $7, calories = $8,
                protein_g = $9, carbs_g = $10, fat_g = $11, ingredients = $12, steps = $13,
                tags = $14, image_url = $15, is_published = $16, updated_at = $17
            WHERE id = $18
            ",
        )
        .bind(&recipe.title)
        .bind(&recipe.slug)
        .bind(&recipe.description)
        .bind(input.category.as_str())
        .bind(i64::from(input.prep_minutes))
        .bind(i64::from(input.cook_minutes))
        .bind(i64::from(input.servings))
        .bind(input.calories)
        .bind(input.protein_g)
        .bind(input.carbs_g)
        .bind(input.fat_g)
        .bind(&recipe.ingredients)
        .bind(&recipe.steps)
        .bind(&recipe.tags)
        .bind(&recipe.image_url)
        .bind(input.is_published)
        .bind(now_timestamp())
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Recipe"));
        }
        self.get(id).await
    }

    /// Delete a recipe unless a nutrition plan uses it
    ///
    /// # Errors
    ///
    /// Returns not found, or resource in use while plan meals reference it
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let (uses,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM nutrition_plan_meals WHERE recipe_id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        if uses > 0 {
            return Err(AppError::resource_in_use(format!(
                "Recipe is used by {uses} nutrition plan meal(s)"
            ))
            .with_details(serde_json::json!({ "plan_meals": uses })));
        }
        let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::not_found("Recipe"));
        }
        Ok(())
    }

    /// Distinct tags across published recipes
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn distinct_tags(&self) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            r"
            SELECT DISTINCT json_each.value AS tag
            FROM recipes, json_each(recipes.tags)
            WHERE recipes.is_published = 1
            ORDER BY tag
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(|r| r.get("tag")).collect())
    }
}

fn row_to_recipe(row: &SqliteRow) -> AppResult<Recipe> {
    let category: String = row.get("category");
    let ingredients: String = row.get("ingredients");
    let steps: String = row.get("steps");
    let tags: String = row.get("tags");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");
    let prep_minutes: i64 = row.get("prep_minutes");
    let cook_minutes: i64 = row.get("cook_minutes");
    let servings: i64 = row.get("servings");

    Ok(Recipe {
        id: row.get("id"),
        title: row.get("title"),
        slug: row.get("slug"),
        description: row.get("description"),
        category: RecipeCategory::from_db(&category)?,
        prep_minutes: to_u32(prep_minutes),
        cook_minutes: to_u32(cook_minutes),
        servings: to_u32(servings).max(1),
        calories: row.get("calories"),
        protein_g: row.get("protein_g"),
        carbs_g: row.get("carbs_g"),
        fat_g: row.get("fat_g"),
        ingredients: json_column(&ingredients)?,
        steps: json_column(&steps)?,
        tags: json_column(&tags)?,
        image_url: row.get("image_url"),
        is_published: row.get("is_published"),
        created_at: parse_db_timestamp(&created_at)?,
        updated_at: parse_db_timestamp(&updated_at)?,
    })
}
