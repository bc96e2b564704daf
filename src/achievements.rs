// ABOUTME: Achievement engine awarding active achievements whose activity threshold a user has reached
// ABOUTME: Runs after workouts, lessons and photo uploads; emails each new award without failing the caller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FitHub Contributors

use tracing::warn;

use crate::config::MailConfig;
use crate::database::achievements::Achievement;
use crate::database::Database;
use crate::email::{dispatch, templates, EmailMessage, EmailSender};
use crate::errors::AppResult;
use crate::logging::AppLogger;
use crate::server::ServerResources;

/// Evaluates and awards achievements for one user at a time
pub struct AchievementEngine<'a> {
    database: &'a Database,
    email: &'a dyn EmailSender,
    mail: &'a MailConfig,
}

impl<'a> AchievementEngine<'a> {
    /// Build an engine from its collaborators
    #[must_use]
    pub const fn new(database: &'a Database, email: &'a dyn EmailSender, mail: &'a MailConfig) -> Self {
        Self {
            database,
            email,
            mail,
        }
    }

    /// Engine backed by the shared server resources
    #[must_use]
    pub fn from_resources(resources: &'a ServerResources) -> Self {
        Self::new(&resources.database, resources.email.as_ref(), &resources.config.mail)
    }

    /// Award every active achievement the user now qualifies for
    ///
    /// Already-earned achievements are skipped, so calling this repeatedly
    /// is harmless. Returns the achievements awarded by this call.
    ///
    /// # Errors
    ///
    /// Returns an error if reading activity or recording an award fails.
    /// Email delivery failures are only logged.
    pub async fn evaluate(&self, user_id: &str) -> AppResult<Vec<Achievement>> {
        let achievements = self.database.achievements();
        let active = achievements.list(true).await?;
        let earned = achievements.earned(user_id).await?;
        let metrics = achievements.metrics(user_id).await?;

        let mut awarded = Vec::new();
        for achievement in active {
            if earned.contains_key(&achievement.id)
                || metrics.value(achievement.criteria) < achievement.threshold
            {
                continue;
            }
            if achievements.award(user_id, &achievement.id).await? {
                AppLogger::log_achievement_awarded(user_id, &achievement.name, achievement.points);
                awarded.push(achievement);
            }
        }

        if !awarded.is_empty() {
            self.notify(user_id, &awarded).await;
        }
        Ok(awarded)
    }

    async fn notify(&self, user_id: &str, awarded: &[Achievement]) {
        let user = match self.database.users().get(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => return,
            Err(e) => {
                warn!(user.id = %user_id, error = %e, "Cannot load user for achievement email");
                return;
            }
        };
        for achievement in awarded {
            let message = EmailMessage::new(
                &self.mail.from_address,
                &user.email,
                templates::achievement_unlocked(
                    user.display_name.as_deref(),
                    &achievement.name,
                    &achievement.description,
                    achievement.points,
                    &self.mail.app_base_url,
                ),
            );
            if let Err(e) = dispatch(self.email, &message).await {
                warn!(
                    user.id = %user_id,
                    achievement.id = %achievement.id,
                    error = %e,
                    "Achievement email failed"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthenticatedUser, UserRole};
    use crate::database::achievements::AchievementInput;
    use crate::email::MemoryEmailSender;
    use crate::enums::AchievementCriteria;

    fn mail() -> MailConfig {
        MailConfig {
            from_address: "FitHub <no-reply@fithub.test>".to_owned(),
            app_base_url: "https://app.fithub.test".to_owned(),
        }
    }

    async fn setup() -> Database {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.users()
            .upsert_from_session(&AuthenticatedUser {
                user_id: "user-1".to_owned(),
                email: "ana@example.com".to_owned(),
                name: Some("Ana".to_owned()),
                role: UserRole::User,
            })
            .await
            .unwrap();
        db.achievements()
            .create(&AchievementInput {
                name: "First Lesson".to_owned(),
                description: Some("Complete a lesson".to_owned()),
                icon_url: None,
                points: 10,
                criteria: AchievementCriteria::LessonsCompleted,
                threshold: 1,
                is_active: true,
            })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_no_award_below_threshold() {
        let db = setup().await;
        let sender = MemoryEmailSender::new();
        let mail = mail();
        let engine = AchievementEngine::new(&db, &sender, &mail);
        assert!(engine.evaluate("user-1").await.unwrap().is_empty());
        assert!(sender.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_email_failure_does_not_fail_evaluation() {
        let db = setup().await;
        sqlx::query("UPDATE achievements SET criteria = 'progress_photos_uploaded'")
            .execute(db.pool())
            .await
            .unwrap();
        sqlx::query(
            r"
            INSERT INTO progress_photos (id, user_id, image_url, pose, taken_at, created_at)
            VALUES ('p1', 'user-1', 'https://cdn.test/p1.jpg', 'front',
                    '2025-01-01T00:00:00.000Z', '2025-01-01T00:00:00.000Z')
            ",
        )
        .execute(db.pool())
        .await
        .unwrap();

        let sender = MemoryEmailSender::new();
        sender.set_failing(true).await;
        let mail = mail();
        let engine = AchievementEngine::new(&db, &sender, &mail);
        let awarded = engine.evaluate("user-1").await.unwrap();
        assert_eq!(awarded.len(), 1);
        assert!(engine.evaluate("user-1").await.unwrap().is_empty());
    }
}
