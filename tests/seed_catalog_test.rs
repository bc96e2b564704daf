// ABOUTME: Runs the seed-catalog binary against temporary SQLite files
// ABOUTME: Checks reruns are no-ops and an unfinished catalog is only replaced with --force
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

use std::process::Output;

use assert_cmd::Command;
use fithub_server::{
    database::{exercises::ExerciseInput, Database},
    enums::{Difficulty, Equipment, MuscleGroup},
};
use tempfile::TempDir;

fn seed(database_url: &str, force: bool) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_seed-catalog"));
    cmd.args(["--database-url", database_url]);
    if force {
        cmd.arg("--force");
    }
    cmd.output().expect("run seed-catalog")
}

async fn counts(database_url: &str) -> (u64, bool) {
    let database = Database::new(database_url).await.unwrap();
    let exercises = database.exercises().count().await.unwrap();
    let marker = database
        .courses()
        .get_published_by_slug("strength-training-basics")
        .await
        .unwrap()
        .is_some();
    database.pool().close().await;
    (exercises, marker)
}

#[tokio::test]
async fn test_seed_then_rerun_is_noop() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("fithub.db").display());

    assert!(seed(&url, false).status.success());
    let (exercises, marker) = counts(&url).await;
    assert!(exercises > 0);
    assert!(marker);

    assert!(seed(&url, false).status.success());
    assert_eq!(counts(&url).await, (exercises, true));
}

#[tokio::test]
async fn test_unfinished_catalog_needs_force() {
    let dir = TempDir::new().unwrap();
    let url = format!("sqlite:{}", dir.path().join("fithub.db").display());
    let database = Database::new(&url).await.unwrap();
    database
        .exercises()
        .create(&ExerciseInput {
            name: "Leftover Row".to_owned(),
            description: None,
            muscle_group: MuscleGroup::Back,
            equipment: Equipment::Cable,
            difficulty: Difficulty::Beginner,
            video_url: None,
            image_url: None,
            instructions: Vec::new(),
        })
        .await
        .unwrap();
    database.pool().close().await;

    let refused = seed(&url, false);
    assert!(!refused.status.success());
    assert_eq!(counts(&url).await, (1, false));

    assert!(seed(&url, true).status.success());
    let (exercises, marker) = counts(&url).await;
    assert!(exercises > 1);
    assert!(marker);
}
