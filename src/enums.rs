// ABOUTME: Closed value sets shared by storage, request validation and dropdown option endpoints
// ABOUTME: Each enum round-trips through a snake_case string column and carries a display label
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use serde::Serialize;

/// A `{value, label}` pair as rendered in dropdowns and filter panels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    /// Machine value sent back by clients
    pub value: &'static str,
    /// Human readable label
    pub label: &'static str,
}

/// Declare a string-backed enum with database, label and option helpers
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => ($value:literal, $label:literal)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $value)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Database and wire representation
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            /// Display label for option lists
            #[must_use]
            pub const fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }

            /// Strict parse of the wire representation
            #[must_use]
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            /// Parse a stored column value
            ///
            /// # Errors
            ///
            /// Returns a database error when the column holds an unknown value
            pub fn from_db(value: &str) -> $crate::errors::AppResult<Self> {
                Self::parse(value).ok_or_else(|| {
                    $crate::errors::AppError::database(format!(
                        "Unknown {} value stored: {value}",
                        stringify!($name)
                    ))
                })
            }

            /// Parse an optional query parameter
            ///
            /// # Errors
            ///
            /// Returns an invalid input error naming the field when the value is unknown
            pub fn parse_filter(
                field: &str,
                value: Option<&str>,
            ) -> $crate::errors::AppResult<Option<Self>> {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| {
                        Self::parse(v).ok_or_else(|| {
                            $crate::errors::AppError::invalid_input(format!(
                                "Invalid {field}: {v}"
                            ))
                        })
                    })
                    .transpose()
            }

            /// Options list for dropdowns
            #[must_use]
            pub fn options() -> Vec<$crate::enums::SelectOption> {
                Self::ALL
                    .iter()
                    .map(|v| $crate::enums::SelectOption {
                        value: v.as_str(),
                        label: v.label(),
                    })
                    .collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// Skill level of a course, exercise, workout or program
    Difficulty {
        /// No prior experience
        Beginner => ("beginner", "Beginner"),
        /// Some training history
        Intermediate => ("intermediate", "Intermediate"),
        /// Experienced athletes
        Advanced => ("advanced", "Advanced"),
    }
}

string_enum! {
    /// Metric an achievement threshold is checked against
    AchievementCriteria {
        /// Logged workout completions
        WorkoutsCompleted => ("workouts_completed", "Workouts completed"),
        /// Courses with every lesson completed
        CoursesCompleted => ("courses_completed", "Courses completed"),
        /// Individual lessons completed
        LessonsCompleted => ("lessons_completed", "Lessons completed"),
        /// Progress photos registered
        ProgressPhotosUploaded => ("progress_photos_uploaded", "Progress photos uploaded"),
    }
}

string_enum! {
    /// Recipe category
    RecipeCategory {
        /// Morning meal
        Breakfast => ("breakfast", "Breakfast"),
        /// Midday meal
        Lunch => ("lunch", "Lunch"),
        /// Evening meal
        Dinner => ("dinner", "Dinner"),
        /// Between meals
        Snack => ("snack", "Snack"),
        /// Sweet course
        Dessert => ("dessert", "Dessert"),
        /// Blended drink
        Smoothie => ("smoothie", "Smoothie"),
    }
}

string_enum! {
    /// Primary muscle group an exercise trains
    MuscleGroup {
        /// Pectorals
        Chest => ("chest", "Chest"),
        /// Lats and upper back
        Back => ("back", "Back"),
        /// Deltoids
        Shoulders => ("shoulders", "Shoulders"),
        /// Biceps, triceps and forearms
        Arms => ("arms", "Arms"),
        /// Quads, hamstrings and calves
        Legs => ("legs", "Legs"),
        /// Glutes
        Glutes => ("glutes", "Glutes"),
        /// Abs and lower back
        Core => ("core", "Core"),
        /// Compound whole-body movements
        FullBody => ("full_body", "Full body"),
        /// Conditioning
        Cardio => ("cardio", "Cardio"),
    }
}

string_enum! {
    /// Equipment an exercise needs
    Equipment {
        /// No equipment
        None => ("none", "None"),
        /// Dumbbells
        Dumbbell => ("dumbbell", "Dumbbell"),
        /// Barbell
        Barbell => ("barbell", "Barbell"),
        /// Kettlebell
        Kettlebell => ("kettlebell", "Kettlebell"),
        /// Machine
        Machine => ("machine", "Machine"),
        /// Resistance band
        Band => ("band", "Resistance band"),
        /// Bodyweight only
        Bodyweight => ("bodyweight", "Bodyweight"),
        /// Cable station
        Cable => ("cable", "Cable"),
    }
}

string_enum! {
    /// Goal a training program is built around
    ProgramGoal {
        /// Maximal strength
        Strength => ("strength", "Strength"),
        /// Muscle growth
        Hypertrophy => ("hypertrophy", "Hypertrophy"),
        /// Body fat reduction
        FatLoss => ("fat_loss", "Fat loss"),
        /// Aerobic capacity
        Endurance => ("endurance", "Endurance"),
        /// General fitness
        General => ("general", "General fitness"),
    }
}

string_enum! {
    /// Weight direction a nutrition plan targets
    PlanGoal {
        /// Caloric deficit
        Lose => ("lose", "Lose weight"),
        /// Energy balance
        Maintain => ("maintain", "Maintain weight"),
        /// Caloric surplus
        Gain => ("gain", "Gain weight"),
    }
}

string_enum! {
    /// Slot of a meal within a plan day
    MealType {
        /// Morning
        Breakfast => ("breakfast", "Breakfast"),
        /// Midday
        Lunch => ("lunch", "Lunch"),
        /// Evening
        Dinner => ("dinner", "Dinner"),
        /// Between meals
        Snack => ("snack", "Snack"),
    }
}

impl MealType {
    /// Ordering within a day
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Breakfast => 0,
            Self::Lunch => 1,
            Self::Dinner => 2,
            Self::Snack => 3,
        }
    }
}

string_enum! {
    /// Body pose of a progress photo
    Pose {
        /// Facing the camera
        Front => ("front", "Front"),
        /// Profile
        Side => ("side", "Side"),
        /// Facing away
        Back => ("back", "Back"),
    }
}
