// ABOUTME: Catalog seeding utility for local development and demos
// ABOUTME: Creates exercises, workouts, a program, recipes, a nutrition plan, a course and achievements
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

//! Catalog seeder for the FitHub server.
//!
//! Everything is created through the database managers, so the seeded
//! rows pass the same validation as admin edits. The course is seeded
//! last and doubles as the completion marker: a catalog with rows but no
//! marker course is left alone unless `--force` is given.
//!
//! Usage:
//! ```bash
//! # Seed the catalog (uses DATABASE_URL from environment)
//! cargo run --bin seed-catalog
//!
//! # Override database URL
//! cargo run --bin seed-catalog -- --database-url sqlite:./data/fithub.db
//!
//! # Wipe catalog tables and seed again
//! cargo run --bin seed-catalog -- --force
//! ```

use std::env;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;

use fithub_server::{
    constants::{defaults, env_config},
    database::{
        achievements::AchievementInput,
        courses::{CourseInput, LessonInput},
        exercises::ExerciseInput,
        nutrition_plans::{NewPlanMeal, NutritionPlanInput},
        programs::{AddProgramWorkout, ProgramInput},
        recipes::{Ingredient, RecipeInput},
        workouts::{NewWorkoutExercise, WorkoutExerciseFields, WorkoutInput},
        Database,
    },
    enums::{
        AchievementCriteria, Difficulty, Equipment, MealType, MuscleGroup, PlanGoal, ProgramGoal,
        RecipeCategory,
    },
    logging::LoggingConfig,
};

#[derive(Parser)]
#[command(
    name = "seed-catalog",
    about = "FitHub catalog seeder",
    long_about = "Create a starter catalog of exercises, workouts, programs, recipes, plans, courses and achievements"
)]
struct SeedArgs {
    /// Database URL override
    #[arg(long)]
    database_url: Option<String>,

    /// Clear catalog tables and seed even if exercises already exist
    #[arg(long)]
    force: bool,

    /// Enable verbose logging
    #[arg(long, short = 'v')]
    verbose: bool,
}

/// Catalog tables, children first
const CATALOG_TABLES: &[&str] = &[
    "nutrition_plan_meals",
    "user_nutrition_plans",
    "nutrition_plans",
    "lesson_progress",
    "lessons",
    "courses",
    "user_achievements",
    "achievements",
    "workout_logs",
    "program_workouts",
    "programs",
    "workout_exercises",
    "workouts",
    "exercises",
    "recipes",
];

/// Slug of the course seeded last; its presence marks a finished seed
const SEED_MARKER_SLUG: &str = "strength-training-basics";

/// (name, muscle group, equipment, difficulty)
const EXERCISES: &[(&str, MuscleGroup, Equipment, Difficulty)] = &[
    ("Push-up", MuscleGroup::Chest, Equipment::Bodyweight, Difficulty::Beginner),
    ("Goblet Squat", MuscleGroup::Legs, Equipment::Kettlebell, Difficulty::Beginner),
    ("Bent-over Row", MuscleGroup::Back, Equipment::Dumbbell, Difficulty::Intermediate),
    ("Overhead Press", MuscleGroup::Shoulders, Equipment::Barbell, Difficulty::Intermediate),
    ("Glute Bridge", MuscleGroup::Glutes, Equipment::Bodyweight, Difficulty::Beginner),
    ("Plank", MuscleGroup::Core, Equipment::None, Difficulty::Beginner),
    ("Deadlift", MuscleGroup::FullBody, Equipment::Barbell, Difficulty::Advanced),
    ("Jumping Jacks", MuscleGroup::Cardio, Equipment::None, Difficulty::Beginner),
];

#[tokio::main]
async fn main() -> Result<()> {
    let args = SeedArgs::parse();
    LoggingConfig::for_cli(args.verbose).init()?;

    let database_url = args.database_url.unwrap_or_else(|| {
        env::var(env_config::DATABASE_URL).unwrap_or_else(|_| defaults::DATABASE_URL.to_owned())
    });
    info!("Connecting to database: {database_url}");
    let database = Database::new(&database_url)
        .await
        .context("Failed to open database")?;

    let completed = seed_completed(&database).await?;
    if completed || database.exercises().count().await? > 0 {
        if !args.force {
            if completed {
                info!("Catalog already seeded; use --force to replace it");
                return Ok(());
            }
            bail!("Catalog holds rows from an unfinished or manual seed; rerun with --force to replace them");
        }
        clear_catalog(&database).await?;
    }

    let exercise_ids = seed_exercises(&database).await?;
    let workout_ids = seed_workouts(&database, &exercise_ids).await?;
    seed_program(&database, &workout_ids).await?;
    seed_achievements(&database).await?;
    let recipe_ids = seed_recipes(&database).await?;
    seed_nutrition_plan(&database, &recipe_ids).await?;
    // Last, so the marker course only exists after every other step succeeded
    seed_course(&database).await?;

    info!("Catalog seeded");
    Ok(())
}

async fn seed_completed(database: &Database) -> Result<bool> {
    Ok(database
        .courses()
        .get_published_by_slug(SEED_MARKER_SLUG)
        .await?
        .is_some())
}

async fn clear_catalog(database: &Database) -> Result<()> {
    let mut tx = database.pool().begin().await?;
    for table in CATALOG_TABLES {
        sqlx::query(&format!("DELETE FROM {table}"))
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to clear {table}"))?;
    }
    tx.commit().await?;
    info!("Cleared {} catalog tables", CATALOG_TABLES.len());
    Ok(())
}

async fn seed_exercises(database: &Database) -> Result<Vec<String>> {
    let mut ids = Vec::with_capacity(EXERCISES.len());
    for (name, muscle_group, equipment, difficulty) in EXERCISES {
        let exercise = database
            .exercises()
            .create(&ExerciseInput {
                name: (*name).to_owned(),
                description: None,
                muscle_group: *muscle_group,
                equipment: *equipment,
                difficulty: *difficulty,
                video_url: None,
                image_url: None,
                instructions: vec![format!("Perform {name} with controlled form")],
            })
            .await?;
        ids.push(exercise.id);
    }
    info!("Seeded {} exercises", ids.len());
    Ok(ids)
}

async fn seed_workouts(database: &Database, exercise_ids: &[String]) -> Result<Vec<String>> {
    let plans: [(&str, Difficulty, &[usize]); 2] = [
        ("Full Body A", Difficulty::Beginner, &[0, 1, 5]),
        ("Full Body B", Difficulty::Intermediate, &[2, 3, 4, 7]),
    ];
    let mut ids = Vec::new();
    for (name, difficulty, picks) in plans {
        let detail = database
            .workouts()
            .create(&WorkoutInput {
                name: name.to_owned(),
                description: Some(format!("{name} circuit")),
                difficulty,
                estimated_minutes: 40,
            })
            .await?;
        for &index in picks {
            let Some(exercise_id) = exercise_ids.get(index) else {
                continue;
            };
            database
                .workouts()
                .add_exercise(&NewWorkoutExercise {
                    workout_id: detail.workout.id.clone(),
                    fields: WorkoutExerciseFields {
                        exercise_id: exercise_id.clone(),
                        sets: 3,
                        reps: Some(10),
                        duration_seconds: None,
                        rest_seconds: Some(60),
                        notes: None,
                        position: None,
                    },
                    program_workout_id: None,
                })
                .await?;
        }
        ids.push(detail.workout.id);
    }
    info!("Seeded {} workouts", ids.len());
    Ok(ids)
}

async fn seed_program(database: &Database, workout_ids: &[String]) -> Result<()> {
    let programs = database.programs();
    let program = programs
        .create(&ProgramInput {
            name: "Foundations".to_owned(),
            slug: None,
            description: Some("Four weeks of alternating full body sessions".to_owned()),
            goal: ProgramGoal::General,
            difficulty: Difficulty::Beginner,
            duration_weeks: 4,
            days_per_week: 3,
            cover_image_url: None,
            is_published: true,
        })
        .await?;

    let mut slots = 0;
    for week in 1..=4 {
        for (slot, day) in [1_u32, 3, 5].into_iter().enumerate() {
            let Some(workout_id) = workout_ids.get(slot % workout_ids.len().max(1)) else {
                continue;
            };
            programs
                .add_workout(
                    &program.id,
                    &AddProgramWorkout {
                        workout_id: Some(workout_id.clone()),
                        new_workout: None,
                        week,
                        day,
                    },
                )
                .await?;
            slots += 1;
        }
    }
    info!(program = %program.slug, slots, "Seeded program");
    Ok(())
}

async fn seed_achievements(database: &Database) -> Result<()> {
    let achievements = [
        ("First Sweat", AchievementCriteria::WorkoutsCompleted, 1, 10),
        ("Ten Down", AchievementCriteria::WorkoutsCompleted, 10, 50),
        ("Student", AchievementCriteria::LessonsCompleted, 1, 10),
        ("Graduate", AchievementCriteria::CoursesCompleted, 1, 40),
        ("Snapshot", AchievementCriteria::ProgressPhotosUploaded, 1, 10),
    ];
    for (name, criteria, threshold, points) in achievements {
        database
            .achievements()
            .create(&AchievementInput {
                name: name.to_owned(),
                description: None,
                icon_url: None,
                points,
                criteria,
                threshold,
                is_active: true,
            })
            .await?;
    }
    info!("Seeded {} achievements", achievements.len());
    Ok(())
}

fn ingredient(name: &str, quantity: f64, unit: &str) -> Ingredient {
    Ingredient {
        name: name.to_owned(),
        quantity,
        unit: unit.to_owned(),
    }
}

async fn seed_recipes(database: &Database) -> Result<Vec<(MealType, String)>> {
    let recipes = [
        (
            MealType::Breakfast,
            RecipeInput {
                title: "Overnight Oats".to_owned(),
                slug: None,
                description: Some("Oats soaked with yogurt and berries".to_owned()),
                category: RecipeCategory::Breakfast,
                prep_minutes: 10,
                cook_minutes: 0,
                servings: 2,
                calories: 380.0,
                protein_g: 20.0,
                carbs_g: 55.0,
                fat_g: 8.0,
                ingredients: vec![
                    ingredient("rolled oats", 100.0, "g"),
                    ingredient("greek yogurt", 200.0, "g"),
                    ingredient("blueberries", 1.0, "cup"),
                ],
                steps: vec![
                    "Mix oats and yogurt".to_owned(),
                    "Top with berries and chill overnight".to_owned(),
                ],
                tags: vec!["vegetarian".to_owned(), "high-protein".to_owned()],
                image_url: None,
                is_published: true,
            },
        ),
        (
            MealType::Lunch,
            RecipeInput {
                title: "Chicken Rice Bowl".to_owned(),
                slug: None,
                description: None,
                category: RecipeCategory::Lunch,
                prep_minutes: 15,
                cook_minutes: 20,
                servings: 2,
                calories: 560.0,
                protein_g: 42.0,
                carbs_g: 60.0,
                fat_g: 14.0,
                ingredients: vec![
                    ingredient("chicken breast", 300.0, "g"),
                    ingredient("rice", 150.0, "g"),
                    ingredient("broccoli", 200.0, "g"),
                ],
                steps: vec!["Cook rice".to_owned(), "Grill chicken and steam broccoli".to_owned()],
                tags: vec!["high-protein".to_owned()],
                image_url: None,
                is_published: true,
            },
        ),
        (
            MealType::Dinner,
            RecipeInput {
                title: "Salmon Traybake".to_owned(),
                slug: None,
                description: None,
                category: RecipeCategory::Dinner,
                prep_minutes: 10,
                cook_minutes: 25,
                servings: 4,
                calories: 520.0,
                protein_g: 35.0,
                carbs_g: 30.0,
                fat_g: 26.0,
                ingredients: vec![
                    ingredient("salmon fillets", 4.0, ""),
                    ingredient("potatoes", 600.0, "g"),
                ],
                steps: vec!["Roast potatoes".to_owned(), "Add salmon for the last 12 minutes".to_owned()],
                tags: vec!["omega-3".to_owned()],
                image_url: None,
                is_published: true,
            },
        ),
    ];

    let mut ids = Vec::with_capacity(recipes.len());
    for (meal_type, input) in &recipes {
        let recipe = database.recipes().create(input).await?;
        ids.push((*meal_type, recipe.id));
    }
    info!("Seeded {} recipes", ids.len());
    Ok(ids)
}

async fn seed_nutrition_plan(database: &Database, recipes: &[(MealType, String)]) -> Result<()> {
    let plans = database.nutrition_plans();
    let plan = plans
        .create(&NutritionPlanInput {
            name: "Balanced 2000".to_owned(),
            description: Some("A week of simple balanced meals".to_owned()),
            goal: PlanGoal::Maintain,
            daily_calories: 2000,
            days: 7,
            is_published: true,
        })
        .await?;
    for day in 1..=7 {
        for (meal_type, recipe_id) in recipes {
            plans
                .add_meal(
                    &plan.id,
                    &NewPlanMeal {
                        day,
                        meal_type: *meal_type,
                        recipe_id: recipe_id.clone(),
                        servings: 1.0,
                    },
                )
                .await?;
        }
    }
    info!(plan = %plan.name, "Seeded nutrition plan");
    Ok(())
}

async fn seed_course(database: &Database) -> Result<()> {
    let courses = database.courses();
    let course = courses
        .create(&CourseInput {
            title: "Strength Training Basics".to_owned(),
            slug: Some(SEED_MARKER_SLUG.to_owned()),
            description: Some("Learn the movement patterns behind every program".to_owned()),
            level: Difficulty::Beginner,
            cover_image_url: None,
            is_published: true,
        })
        .await?;
    let lessons = [
        ("Why strength matters", 8),
        ("Squat, hinge, push, pull", 15),
        ("Progressive overload", 12),
    ];
    for (title, duration_minutes) in lessons {
        courses
            .add_lesson(
                &course.id,
                &LessonInput {
                    title: title.to_owned(),
                    content: Some(format!("{title}.")),
                    video_url: None,
                    duration_minutes,
                    position: None,
                },
            )
            .await?;
    }
    info!(course = %course.slug, lessons = lessons.len(), "Seeded course");
    Ok(())
}
