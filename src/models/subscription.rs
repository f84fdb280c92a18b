use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Uuid, FromRow};
use tracing::instrument;

use crate::errors::{map_unique_violation, AppError};

use super::{course::{Course, COURSE_SELECT}, PgStore, StoreResult, SubscriptionStore};

/// One row per (user, course) pair; the pair is the primary key.
#[derive(Debug, Clone, FromRow)]
pub struct Subscription {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub subscribed_at: DateTime<Utc>,
}

#[async_trait]
impl SubscriptionStore for PgStore {
    #[instrument(skip(self))]
    async fn is_subscribed(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM subscriptions WHERE user_id = $1 AND course_id = $2)",
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    #[instrument(skip(self))]
    async fn subscribe(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<Subscription> {
        sqlx::query_as::<_, Subscription>(
            r#"
                INSERT INTO subscriptions (user_id, course_id)
                VALUES ($1, $2)
                RETURNING user_id, course_id, subscribed_at
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::Conflict("User is already subscribed to this course.".into())))
    }

    #[instrument(skip(self))]
    async fn unsubscribe(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND course_id = $2")
            .bind(user_id)
            .bind(course_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn subscribed_courses(&self, user_id: Uuid) -> StoreResult<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "{COURSE_SELECT} JOIN subscriptions s ON s.course_id = c.id WHERE s.user_id = $1 ORDER BY s.subscribed_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }
}
