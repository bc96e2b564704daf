// ABOUTME: Daily calorie calculator using the Mifflin-St Jeor equation with activity and goal adjustments
// ABOUTME: Validates metric or imperial body measurements and derives macro and water targets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! Calorie Calculator Module
//!
//! # Scientific References
//!
//! - Mifflin, M.D., et al. (1990). A new predictive equation for resting energy expenditure.
//!   *American Journal of Clinical Nutrition*, 51(2), 241-247.
//!   <https://doi.org/10.1093/ajcn/51.2.241>
//!
//! - `McArdle` et al. (2010) - Exercise Physiology (activity factors)

use serde::{Deserialize, Serialize};

use crate::enums::{string_enum, PlanGoal};
use crate::errors::{AppError, AppResult};
use crate::utils::validation::in_range;

/// Kilograms per pound
pub const KG_PER_LB: f64 = 0.453_592_37;
/// Centimeters per inch
pub const CM_PER_INCH: f64 = 2.54;
/// Accepted body weight range (kg)
pub const WEIGHT_RANGE_KG: (f64, f64) = (20.0, 350.0);
/// Accepted height range (cm)
pub const HEIGHT_RANGE_CM: (f64, f64) = (100.0, 250.0);
/// Accepted age range (years)
pub const AGE_RANGE: (u32, u32) = (13, 100);
/// Minimum daily target for men (kcal)
pub const MALE_FLOOR_KCAL: f64 = 1500.0;
/// Minimum daily target for women (kcal)
pub const FEMALE_FLOOR_KCAL: f64 = 1200.0;
/// Daily water recommendation per kilogram of body weight (ml)
pub const WATER_ML_PER_KG: f64 = 35.0;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARBS: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

string_enum! {
    /// Sex used for the BMR constant
    Sex {
        /// +5 kcal constant
        Male => ("male", "Male"),
        /// -161 kcal constant
        Female => ("female", "Female"),
    }
}

string_enum! {
    /// Activity level for TDEE calculation
    ActivityLevel {
        /// Little or no exercise
        Sedentary => ("sedentary", "Sedentary (little or no exercise)"),
        /// 1-3 sessions per week
        Light => ("light", "Lightly active (1-3 days/week)"),
        /// 3-5 sessions per week
        Moderate => ("moderate", "Moderately active (3-5 days/week)"),
        /// 6-7 sessions per week
        Active => ("active", "Very active (6-7 days/week)"),
        /// Physical job or twice-daily training
        VeryActive => ("very_active", "Extra active (physical job or 2x/day training)"),
    }
}

string_enum! {
    /// Weight goal selecting the calorie adjustment
    CalorieGoal {
        /// About 1 kg per week
        LoseFast => ("lose_fast", "Lose weight fast (-1000 kcal)"),
        /// About 0.5 kg per week
        Lose => ("lose", "Lose weight (-500 kcal)"),
        /// Energy balance
        Maintain => ("maintain", "Maintain weight"),
        /// Lean gain
        Gain => ("gain", "Gain weight (+300 kcal)"),
        /// Faster gain
        GainFast => ("gain_fast", "Gain weight fast (+500 kcal)"),
    }
}

impl Sex {
    /// Mifflin-St Jeor sex constant
    #[must_use]
    pub const fn bmr_constant(self) -> f64 {
        match self {
            Self::Male => 5.0,
            Self::Female => -161.0,
        }
    }

    /// Lowest daily target the calculator will recommend
    #[must_use]
    pub const fn calorie_floor(self) -> f64 {
        match self {
            Self::Male => MALE_FLOOR_KCAL,
            Self::Female => FEMALE_FLOOR_KCAL,
        }
    }
}

impl ActivityLevel {
    /// TDEE multiplier
    #[must_use]
    pub const fn multiplier(self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::Active => 1.725,
            Self::VeryActive => 1.9,
        }
    }
}

impl CalorieGoal {
    /// Daily adjustment applied to TDEE (kcal)
    #[must_use]
    pub const fn adjustment_kcal(self) -> f64 {
        match self {
            Self::LoseFast => -1000.0,
            Self::Lose => -500.0,
            Self::Maintain => 0.0,
            Self::Gain => 300.0,
            Self::GainFast => 500.0,
        }
    }

    /// Goal family shared with nutrition plans
    #[must_use]
    pub const fn family(self) -> PlanGoal {
        match self {
            Self::LoseFast | Self::Lose => PlanGoal::Lose,
            Self::Maintain => PlanGoal::Maintain,
            Self::Gain | Self::GainFast => PlanGoal::Gain,
        }
    }

    /// Protein grams per kilogram of body weight
    #[must_use]
    pub const fn protein_g_per_kg(self) -> f64 {
        match self.family() {
            PlanGoal::Lose => 2.0,
            PlanGoal::Maintain => 1.6,
            PlanGoal::Gain => 1.8,
        }
    }

    /// Share of the calorie target coming from fat
    #[must_use]
    pub const fn fat_share(self) -> f64 {
        match self.family() {
            PlanGoal::Lose | PlanGoal::Gain => 0.25,
            PlanGoal::Maintain => 0.30,
        }
    }
}

/// Calculator form input; metric fields win when both unit systems are sent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CalculatorInput {
    /// Sex
    pub sex: Option<Sex>,
    /// Age in years
    pub age: Option<u32>,
    /// Weight in kilograms
    pub weight_kg: Option<f64>,
    /// Height in centimeters
    pub height_cm: Option<f64>,
    /// Weight in pounds
    pub weight_lb: Option<f64>,
    /// Feet component of height
    pub height_ft: Option<f64>,
    /// Inches component of height (or the whole height when feet are absent)
    pub height_in: Option<f64>,
    /// Activity level
    pub activity_level: Option<ActivityLevel>,
    /// Weight goal
    pub goal: Option<CalorieGoal>,
}

/// Validated metric body profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BodyProfile {
    /// Sex
    pub sex: Sex,
    /// Age in years
    pub age: u32,
    /// Weight in kilograms
    pub weight_kg: f64,
    /// Height in centimeters
    pub height_cm: f64,
    /// Activity level
    pub activity_level: ActivityLevel,
    /// Weight goal
    pub goal: CalorieGoal,
}

/// Daily macronutrient targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacroTargets {
    /// Protein (g)
    pub protein_g: u32,
    /// Carbohydrates (g)
    pub carbs_g: u32,
    /// Fat (g)
    pub fat_g: u32,
    /// Protein share of the target (%)
    pub protein_percent: u32,
    /// Carbohydrate share of the target (%)
    pub carbs_percent: u32,
    /// Fat share of the target (%)
    pub fat_percent: u32,
}

/// Calculator output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalorieResult {
    /// Basal metabolic rate (kcal/day)
    pub bmr: u32,
    /// Total daily energy expenditure (kcal/day)
    pub tdee: u32,
    /// Recommended daily intake (kcal/day)
    pub target_calories: u32,
    /// Whether the safety floor raised the target
    pub floor_applied: bool,
    /// Macro split of the target
    pub macros: MacroTargets,
    /// Daily water (ml)
    pub water_ml: u32,
    /// Profile the numbers were computed from
    pub profile: BodyProfile,
}

impl CalculatorInput {
    /// Resolve units and validate ranges
    ///
    /// # Errors
    ///
    /// Returns a missing field or out of range error naming the first bad field
    pub fn to_profile(&self) -> AppResult<BodyProfile> {
        let sex = self.sex.ok_or_else(|| AppError::missing_field("sex"))?;
        let age = self.age.ok_or_else(|| AppError::missing_field("age"))?;
        let activity_level = self
            .activity_level
            .ok_or_else(|| AppError::missing_field("activity_level"))?;
        let goal = self.goal.ok_or_else(|| AppError::missing_field("goal"))?;

        let weight_kg = match (self.weight_kg, self.weight_lb) {
            (Some(kg), _) => kg,
            (None, Some(lb)) => lb * KG_PER_LB,
            (None, None) => return Err(AppError::missing_field("weight_kg")),
        };
        let height_cm = match (self.height_cm, self.height_ft, self.height_in) {
            (Some(cm), _, _) => cm,
            (None, None, None) => return Err(AppError::missing_field("height_cm")),
            (None, feet, inches) => {
                feet.unwrap_or(0.0).mul_add(12.0, inches.unwrap_or(0.0)) * CM_PER_INCH
            }
        };

        BodyProfile {
            sex,
            age,
            weight_kg,
            height_cm,
            activity_level,
            goal,
        }
        .validated()
    }
}

impl BodyProfile {
    /// Check measurement ranges
    ///
    /// # Errors
    ///
    /// Returns an invalid input error for non-finite or out of range measurements
    pub fn validated(self) -> AppResult<Self> {
        if !self.weight_kg.is_finite() || !self.height_cm.is_finite() {
            return Err(AppError::invalid_input("Measurements must be numbers"));
        }
        in_range("weight_kg", self.weight_kg, WEIGHT_RANGE_KG.0, WEIGHT_RANGE_KG.1)?;
        in_range("height_cm", self.height_cm, HEIGHT_RANGE_CM.0, HEIGHT_RANGE_CM.1)?;
        in_range("age", self.age, AGE_RANGE.0, AGE_RANGE.1)?;
        Ok(self)
    }
}

/// Basal Metabolic Rate using Mifflin-St Jeor (1990)
///
/// Formula: BMR = (10 x `weight_kg`) + (6.25 x `height_cm`) - (5 x age) + s,
/// with s = +5 for men and -161 for women.
#[must_use]
pub fn mifflin_st_jeor(weight_kg: f64, height_cm: f64, age: u32, sex: Sex) -> f64 {
    5.0f64.mul_add(
        -f64::from(age),
        10.0f64.mul_add(weight_kg, 6.25 * height_cm),
    ) + sex.bmr_constant()
}

/// Macro split for a calorie target; carbohydrates take the remainder and never go negative
#[must_use]
pub fn macro_targets(weight_kg: f64, target_kcal: f64, goal: CalorieGoal) -> MacroTargets {
    let protein_g = weight_kg * goal.protein_g_per_kg();
    let fat_kcal = target_kcal * goal.fat_share();
    let fat_g = fat_kcal / KCAL_PER_G_FAT;
    let carbs_g = (protein_g.mul_add(-KCAL_PER_G_PROTEIN, target_kcal) - fat_kcal).max(0.0)
        / KCAL_PER_G_CARBS;

    let percent = |kcal: f64| {
        if target_kcal > 0.0 {
            round_u32(kcal / target_kcal * 100.0)
        } else {
            0
        }
    };

    MacroTargets {
        protein_g: round_u32(protein_g),
        carbs_g: round_u32(carbs_g),
        fat_g: round_u32(fat_g),
        protein_percent: percent(protein_g * KCAL_PER_G_PROTEIN),
        carbs_percent: percent(carbs_g * KCAL_PER_G_CARBS),
        fat_percent: percent(fat_kcal),
    }
}

/// Run the full calculation for a validated profile
#[must_use]
pub fn calculate(profile: &BodyProfile) -> CalorieResult {
    let bmr = mifflin_st_jeor(profile.weight_kg, profile.height_cm, profile.age, profile.sex);
    let tdee = bmr * profile.activity_level.multiplier();
    let adjusted = tdee + profile.goal.adjustment_kcal();
    let floor = profile.sex.calorie_floor();
    let floor_applied = adjusted < floor;
    let target = f64::from(round_u32(adjusted.max(floor)));

    CalorieResult {
        bmr: round_u32(bmr),
        tdee: round_u32(tdee),
        target_calories: round_u32(target),
        floor_applied,
        macros: macro_targets(profile.weight_kg, target, profile.goal),
        water_ml: round_u32(profile.weight_kg * WATER_ML_PER_KG),
        profile: *profile,
    }
}

// Safe: inputs are range-checked, results are small positive numbers
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn round_u32(value: f64) -> u32 {
    value.round().max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(sex: Sex, age: u32, weight_kg: f64, height_cm: f64) -> BodyProfile {
        BodyProfile {
            sex,
            age,
            weight_kg,
            height_cm,
            activity_level: ActivityLevel::Moderate,
            goal: CalorieGoal::Maintain,
        }
    }

    #[test]
    fn test_mifflin_st_jeor_reference_values() {
        assert!((mifflin_st_jeor(80.0, 180.0, 30, Sex::Male) - 1780.0).abs() < 1e-9);
        assert!((mifflin_st_jeor(60.0, 165.0, 25, Sex::Female) - 1345.25).abs() < 1e-9);
    }

    #[test]
    fn test_maintain_result() {
        let result = calculate(&profile(Sex::Male, 30, 80.0, 180.0));
        assert_eq!(result.bmr, 1780);
        assert_eq!(result.tdee, 2759);
        assert_eq!(result.target_calories, 2759);
        assert!(!result.floor_applied);
        assert_eq!(result.macros.protein_g, 128);
        assert_eq!(result.macros.fat_g, 92);
        assert_eq!(result.macros.carbs_g, 355);
        assert_eq!(result.water_ml, 2800);
    }

    #[test]
    fn test_floor_applied_for_aggressive_deficit() {
        let mut p = profile(Sex::Female, 60, 50.0, 160.0);
        p.activity_level = ActivityLevel::Sedentary;
        p.goal = CalorieGoal::LoseFast;
        let result = calculate(&p);
        assert_eq!(result.bmr, 1039);
        assert_eq!(result.target_calories, 1200);
        assert!(result.floor_applied);
        assert_eq!(result.macros.protein_g, 100);
        assert_eq!(result.macros.carbs_g, 125);
    }

    #[test]
    fn test_carbs_never_negative() {
        let macros = macro_targets(150.0, 1500.0, CalorieGoal::Lose);
        assert_eq!(macros.protein_g, 300);
        assert_eq!(macros.carbs_g, 0);
    }

    #[test]
    fn test_imperial_conversion() {
        let input = CalculatorInput {
            sex: Some(Sex::Male),
            age: Some(40),
            weight_lb: Some(176.0),
            height_ft: Some(5.0),
            height_in: Some(11.0),
            activity_level: Some(ActivityLevel::Light),
            goal: Some(CalorieGoal::Gain),
            ..CalculatorInput::default()
        };
        let p = input.to_profile().unwrap();
        assert!((p.weight_kg - 79.832_257_12).abs() < 1e-6);
        assert!((p.height_cm - 180.34).abs() < 1e-9);
    }

    #[test]
    fn test_validation_ranges() {
        let mut input = CalculatorInput {
            sex: Some(Sex::Female),
            age: Some(12),
            weight_kg: Some(60.0),
            height_cm: Some(165.0),
            activity_level: Some(ActivityLevel::Active),
            goal: Some(CalorieGoal::Lose),
            ..CalculatorInput::default()
        };
        assert!(input.to_profile().is_err());
        input.age = Some(13);
        assert!(input.to_profile().is_ok());
        input.weight_kg = Some(351.0);
        assert!(input.to_profile().is_err());
        input.weight_kg = None;
        let err = input.to_profile().unwrap_err();
        assert_eq!(err.message, "weight_kg is required");
    }

    #[test]
    fn test_goal_families() {
        assert_eq!(CalorieGoal::LoseFast.family(), PlanGoal::Lose);
        assert_eq!(CalorieGoal::GainFast.family(), PlanGoal::Gain);
        assert!((CalorieGoal::Maintain.fat_share() - 0.30).abs() < f64::EPSILON);
    }
}
