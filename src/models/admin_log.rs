use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{types::Uuid, FromRow, PgConnection};
use tracing::instrument;

use crate::{
    errors::AppError,
    schema::{Page, PageRequest},
};

use super::{
    course::{apply_outcome_in, CourseStatus, Outcome},
    user::{Role, User, USER_COLUMNS},
    AdminLogStore, PgStore, StoreResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminAction {
    PromotedUser,
    DemotedUser,
    ApprovedCourse,
    ApprovedRemoval,
    RejectedAddition,
    RejectedRemoval,
}

impl AdminAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdminAction::PromotedUser => "PROMOTED_USER",
            AdminAction::DemotedUser => "DEMOTED_USER",
            AdminAction::ApprovedCourse => "APPROVED_COURSE",
            AdminAction::ApprovedRemoval => "APPROVED_REMOVAL",
            AdminAction::RejectedAddition => "REJECTED_ADDITION",
            AdminAction::RejectedRemoval => "REJECTED_REMOVAL",
        }
    }

    /// Human-readable line stored with the entry; `subject` is a user email or course name.
    pub fn describe(&self, subject: &str) -> String {
        match self {
            AdminAction::PromotedUser => format!("Promoted user {} to INSTRUCTOR", subject),
            AdminAction::DemotedUser => format!("Demoted instructor {} to USER", subject),
            AdminAction::ApprovedCourse => format!("Approved and published new course: {}", subject),
            AdminAction::ApprovedRemoval => format!("Approved removal of course: {}", subject),
            AdminAction::RejectedAddition => format!("Rejected new course submission: {}", subject),
            AdminAction::RejectedRemoval => format!("Rejected removal request for course: {}", subject),
        }
    }

    pub fn target_type(&self) -> TargetType {
        match self {
            AdminAction::PromotedUser | AdminAction::DemotedUser => TargetType::User,
            _ => TargetType::Course,
        }
    }
}

impl fmt::Display for AdminAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    User,
    Course,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::User => "USER",
            TargetType::Course => "COURSE",
        }
    }
}

/// Audit entry joined with the acting admin's email. Entries are never updated.
#[derive(Debug, Clone, FromRow)]
pub struct AdminLog {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub admin_email: String,
    pub action: String,
    pub target_id: Uuid,
    pub target_type: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

pub struct NewAdminLog {
    pub admin_id: Uuid,
    pub action: AdminAction,
    pub target_id: Uuid,
    pub details: String,
}

impl NewAdminLog {
    pub fn new(admin_id: Uuid, action: AdminAction, target_id: Uuid, details: impl Into<String>) -> Self {
        NewAdminLog {
            admin_id,
            action,
            target_id,
            details: details.into(),
        }
    }
}

const LOG_COLUMNS: &str = "l.id, l.admin_id, u.email AS admin_email, l.action, l.target_id, l.target_type, l.details, l.created_at";

/// Writes the audit row on the transaction that carries the change it describes.
async fn insert_log(conn: &mut PgConnection, entry: &NewAdminLog) -> StoreResult<()> {
    sqlx::query(
        r#"
            INSERT INTO admin_logs (id, admin_id, action, target_id, target_type, details)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(entry.admin_id)
    .bind(entry.action.as_str())
    .bind(entry.target_id)
    .bind(entry.action.target_type().as_str())
    .bind(&entry.details)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[async_trait]
impl AdminLogStore for PgStore {
    #[instrument(skip(self, entry), fields(action = %entry.action))]
    async fn record_role_change(&self, entry: NewAdminLog, from: Role, to: Role) -> StoreResult<User> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET role = $3 WHERE id = $1 AND role = $2 RETURNING {USER_COLUMNS}"
        ))
        .bind(entry.target_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = updated else {
            let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(entry.target_id)
                .fetch_one(&mut *tx)
                .await?;

            return Err(if exists { AppError::stale("User") } else { AppError::not_found("User", entry.target_id) });
        };

        insert_log(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(user)
    }

    #[instrument(skip(self, entry), fields(action = %entry.action))]
    async fn record_course_decision(&self, entry: NewAdminLog, from: CourseStatus, outcome: Outcome) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;
        apply_outcome_in(&mut tx, entry.target_id, from, outcome).await?;
        insert_log(&mut tx, &entry).await?;
        tx.commit().await?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn logs_by_admin(&self, admin_id: Uuid, page: PageRequest) -> StoreResult<Page<AdminLog>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM admin_logs WHERE admin_id = $1")
            .bind(admin_id)
            .fetch_one(&self.pool)
            .await?;

        let logs = sqlx::query_as::<_, AdminLog>(&format!(
            r#"
                SELECT {LOG_COLUMNS}
                FROM admin_logs l
                JOIN users u ON u.id = l.admin_id
                WHERE l.admin_id = $1
                ORDER BY l.created_at DESC
                LIMIT $2 OFFSET $3
            "#
        ))
        .bind(admin_id)
        .bind(page.size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        Ok(Page::new(logs, page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_changes_target_users() {
        assert_eq!(AdminAction::PromotedUser.target_type(), TargetType::User);
        assert_eq!(AdminAction::DemotedUser.target_type(), TargetType::User);
        assert_eq!(AdminAction::ApprovedRemoval.target_type(), TargetType::Course);
        assert_eq!(AdminAction::RejectedAddition.target_type().as_str(), "COURSE");
    }

    #[test]
    fn details_name_the_subject() {
        assert_eq!(
            AdminAction::PromotedUser.describe("ada@example.com"),
            "Promoted user ada@example.com to INSTRUCTOR"
        );
        assert_eq!(
            AdminAction::ApprovedRemoval.describe("Rust 101"),
            "Approved removal of course: Rust 101"
        );
    }
}
