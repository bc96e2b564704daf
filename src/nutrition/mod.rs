// ABOUTME: Nutrition domain logic independent of storage and HTTP
// ABOUTME: Hosts the calorie calculator and recipe serving scaling
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

/// Mifflin-St Jeor calorie calculator
pub mod calculator;
/// Scaling recipes to a requested number of servings
pub mod scaling;

pub use calculator::{
    calculate, ActivityLevel, BodyProfile, CalculatorInput, CalorieGoal, CalorieResult,
    MacroTargets, Sex,
};
