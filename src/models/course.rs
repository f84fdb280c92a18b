use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Uuid, FromRow, PgConnection};
use thiserror::Error;
use tracing::instrument;

use crate::errors::AppError;

use super::{admin_log::AdminAction, CourseStore, PgStore, StoreResult, UnknownVariant};

/// Moderation state of a course. A deleted course has no state; it is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CourseStatus {
    PendingAddition,
    Approved,
    PendingRemoval,
}

/// What a transition does to the course row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Become(CourseStatus),
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Course is not awaiting a moderation decision (status {0})")]
    NotPending(CourseStatus),
    #[error("This course is already pending removal or cannot be removed.")]
    AlreadyPendingRemoval,
}

impl CourseStatus {
    pub const PENDING: [CourseStatus; 2] = [CourseStatus::PendingAddition, CourseStatus::PendingRemoval];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseStatus::PendingAddition => "PENDING_ADDITION",
            CourseStatus::Approved => "APPROVED",
            CourseStatus::PendingRemoval => "PENDING_REMOVAL",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, CourseStatus::Approved)
    }

    /// Admin decision on a pending course.
    pub fn decide(self, decision: Decision) -> Result<Outcome, TransitionError> {
        match (self, decision) {
            (CourseStatus::PendingAddition, Decision::Approve) => Ok(Outcome::Become(CourseStatus::Approved)),
            (CourseStatus::PendingAddition, Decision::Reject) => Ok(Outcome::Delete),
            (CourseStatus::PendingRemoval, Decision::Approve) => Ok(Outcome::Delete),
            (CourseStatus::PendingRemoval, Decision::Reject) => Ok(Outcome::Become(CourseStatus::Approved)),
            (CourseStatus::Approved, _) => Err(TransitionError::NotPending(self)),
        }
    }

    /// Owner asks to take the course down. Unpublished courses go away at once.
    pub fn request_removal(self) -> Result<Outcome, TransitionError> {
        match self {
            CourseStatus::Approved => Ok(Outcome::Become(CourseStatus::PendingRemoval)),
            CourseStatus::PendingAddition => Ok(Outcome::Delete),
            CourseStatus::PendingRemoval => Err(TransitionError::AlreadyPendingRemoval),
        }
    }
}

impl Decision {
    /// Audit action recorded when this decision is applied to a course in `from`.
    pub fn action(self, from: CourseStatus) -> Option<AdminAction> {
        match (self, from) {
            (Decision::Approve, CourseStatus::PendingAddition) => Some(AdminAction::ApprovedCourse),
            (Decision::Approve, CourseStatus::PendingRemoval) => Some(AdminAction::ApprovedRemoval),
            (Decision::Reject, CourseStatus::PendingAddition) => Some(AdminAction::RejectedAddition),
            (Decision::Reject, CourseStatus::PendingRemoval) => Some(AdminAction::RejectedRemoval),
            (_, CourseStatus::Approved) => None,
        }
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl fmt::Display for CourseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for CourseStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "PENDING_ADDITION" => Ok(CourseStatus::PendingAddition),
            "APPROVED" => Ok(CourseStatus::Approved),
            "PENDING_REMOVAL" => Ok(CourseStatus::PendingRemoval),
            _ => Err(UnknownVariant { kind: "course status", value }),
        }
    }
}

/// A course row joined with its creator's email.
#[derive(Debug, Clone, FromRow)]
pub struct Course {
    pub id: Uuid,
    pub course_name: String,
    pub instructor: String,
    pub category: String,
    pub video_link: String,
    pub thumbnail: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: CourseStatus,
    pub created_by: Uuid,
    pub creator_email: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewCourse {
    pub course_name: String,
    pub instructor: String,
    pub category: String,
    pub video_link: String,
    pub thumbnail: Option<String>,
    pub created_by: Uuid,
}

pub(crate) const COURSE_SELECT: &str = r#"
    SELECT c.id, c.course_name, c.instructor, c.category, c.video_link, c.thumbnail,
           c.status, c.created_by, u.email AS creator_email, c.created_at
    FROM courses c
    JOIN users u ON u.id = c.created_by
"#;

#[async_trait]
impl CourseStore for PgStore {
    #[instrument(skip(self, course), fields(name = %course.course_name))]
    async fn create_course(&self, course: NewCourse) -> StoreResult<Course> {
        let created = sqlx::query_as::<_, Course>(
            r#"
                WITH c AS (
                    INSERT INTO courses (id, course_name, instructor, category, video_link, thumbnail, status, created_by)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    RETURNING *
                )
                SELECT c.id, c.course_name, c.instructor, c.category, c.video_link, c.thumbnail,
                       c.status, c.created_by, u.email AS creator_email, c.created_at
                FROM c
                JOIN users u ON u.id = c.created_by
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&course.course_name)
        .bind(&course.instructor)
        .bind(&course.category)
        .bind(&course.video_link)
        .bind(&course.thumbnail)
        .bind(CourseStatus::PendingAddition.as_str())
        .bind(course.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    #[instrument(skip(self))]
    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        let course = sqlx::query_as::<_, Course>(&format!("{COURSE_SELECT} WHERE c.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(course)
    }

    #[instrument(skip(self))]
    async fn courses_with_status(&self, statuses: &[CourseStatus]) -> StoreResult<Vec<Course>> {
        let statuses: Vec<&str> = statuses.iter().map(CourseStatus::as_str).collect();

        let courses = sqlx::query_as::<_, Course>(&format!(
            "{COURSE_SELECT} WHERE c.status = ANY($1) ORDER BY c.created_at"
        ))
        .bind(statuses)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    #[instrument(skip(self))]
    async fn courses_created_by(&self, user_id: Uuid) -> StoreResult<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(&format!(
            "{COURSE_SELECT} WHERE c.created_by = $1 ORDER BY c.created_at"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(courses)
    }

    #[instrument(skip(self))]
    async fn apply_outcome(&self, id: Uuid, from: CourseStatus, outcome: Outcome) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        apply_outcome_in(&mut tx, id, from, outcome).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Runs `outcome` on the caller's connection, guarded on the course still being in `from`.
pub(crate) async fn apply_outcome_in(conn: &mut PgConnection, id: Uuid, from: CourseStatus, outcome: Outcome) -> StoreResult<()> {
    let affected = match outcome {
        Outcome::Become(status) => sqlx::query("UPDATE courses SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from.as_str())
            .bind(status.as_str())
            .execute(&mut *conn)
            .await?
            .rows_affected(),
        Outcome::Delete => {
            sqlx::query("DELETE FROM subscriptions WHERE course_id = $1")
                .bind(id)
                .execute(&mut *conn)
                .await?;

            sqlx::query("DELETE FROM courses WHERE id = $1 AND status = $2")
                .bind(id)
                .bind(from.as_str())
                .execute(&mut *conn)
                .await?
                .rows_affected()
        }
    };

    if affected == 0 {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM courses WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *conn)
            .await?;

        return Err(if exists { AppError::stale("Course") } else { AppError::not_found("Course", id) });
    }

    Ok(())
}
