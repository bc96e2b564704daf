// ABOUTME: Scales a recipe's ingredients and nutrition totals to a requested number of servings
// ABOUTME: Also derives total time and per-serving macro energy percentages for the detail view

use serde::Serialize;

use crate::database::recipes::{Ingredient, Recipe};
use crate::errors::{AppError, AppResult};

/// Most servings a detail view can be scaled to
pub const MAX_SERVINGS: u32 = 100;

/// Nutrition for the scaled number of servings
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NutritionTotals {
    /// Calories
    pub calories: f64,
    /// Protein (g)
    pub protein_g: f64,
    /// Carbohydrates (g)
    pub carbs_g: f64,
    /// Fat (g)
    pub fat_g: f64,
}

/// Share of per-serving energy from each macro
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacroPercentages {
    /// Protein (%)
    pub protein_percent: u32,
    /// Carbohydrates (%)
    pub carbs_percent: u32,
    /// Fat (%)
    pub fat_percent: u32,
}

/// Recipe detail scaled to a number of servings
#[derive(Debug, Clone, Serialize)]
pub struct ScaledRecipe {
    /// The stored recipe
    #[serde(flatten)]
    pub recipe: Recipe,
    /// Servings the view was scaled to
    pub requested_servings: u32,
    /// Ingredients for `requested_servings`
    pub scaled_ingredients: Vec<Ingredient>,
    /// Nutrition for `requested_servings`
    pub totals: NutritionTotals,
    /// Preparation plus cooking time
    pub total_minutes: u32,
    /// Per-serving macro energy split
    pub macro_percentages: MacroPercentages,
}

/// Round to two decimals
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Scale a recipe to `servings` (defaults to the recipe's own servings)
///
/// # Errors
///
/// Returns invalid input when `servings` is outside `1..=MAX_SERVINGS`
pub fn scale_recipe(recipe: Recipe, servings: Option<u32>) -> AppResult<ScaledRecipe> {
    let requested = servings.unwrap_or(recipe.servings);
    if !(1..=MAX_SERVINGS).contains(&requested) {
        return Err(AppError::invalid_input(format!(
            "servings must be between 1 and {MAX_SERVINGS}"
        )));
    }
    let factor = f64::from(requested) / f64::from(recipe.servings.max(1));

    let scaled_ingredients = recipe
        .ingredients
        .iter()
        .map(|i| Ingredient {
            name: i.name.clone(),
            quantity: round2(i.quantity * factor),
            unit: i.unit.clone(),
        })
        .collect();

    let count = f64::from(requested);
    let totals = NutritionTotals {
        calories: round2(recipe.calories * count),
        protein_g: round2(recipe.protein_g * count),
        carbs_g: round2(recipe.carbs_g * count),
        fat_g: round2(recipe.fat_g * count),
    };

    Ok(ScaledRecipe {
        requested_servings: requested,
        scaled_ingredients,
        totals,
        total_minutes: recipe.prep_minutes + recipe.cook_minutes,
        macro_percentages: macro_percentages(recipe.protein_g, recipe.carbs_g, recipe.fat_g),
        recipe,
    })
}

/// Energy split of protein, carbohydrates and fat (4/4/9 kcal per gram)
#[must_use]
pub fn macro_percentages(protein_g: f64, carbs_g: f64, fat_g: f64) -> MacroPercentages {
    let protein_kcal = protein_g * 4.0;
    let carbs_kcal = carbs_g * 4.0;
    let fat_kcal = fat_g * 9.0;
    let total = protein_kcal + carbs_kcal + fat_kcal;
    if total <= 0.0 {
        return MacroPercentages {
            protein_percent: 0,
            carbs_percent: 0,
            fat_percent: 0,
        };
    }
    MacroPercentages {
        protein_percent: percent(protein_kcal, total),
        carbs_percent: percent(carbs_kcal, total),
        fat_percent: percent(fat_kcal, total),
    }
}

// Safe: ratio of non-negative parts to their sum lies in 0..=100
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(part: f64, total: f64) -> u32 {
    (part / total * 100.0).round() as u32
}
