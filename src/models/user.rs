use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Uuid, FromRow};
use tracing::instrument;

use crate::errors::{map_unique_violation, AppError};

use super::{PgStore, StoreResult, UnknownVariant, UserStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    User,
    Instructor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Instructor => "INSTRUCTOR",
            Role::Admin => "ADMIN",
        }
    }

    /// Role after a promotion, or `None` when the role cannot be promoted.
    pub fn promoted(self) -> Option<Role> {
        match self {
            Role::User => Some(Role::Instructor),
            Role::Instructor | Role::Admin => None,
        }
    }

    /// Role after a demotion, or `None` when the role cannot be demoted.
    pub fn demoted(self) -> Option<Role> {
        match self {
            Role::Instructor => Some(Role::User),
            Role::User | Role::Admin => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "USER" => Ok(Role::User),
            "INSTRUCTOR" => Ok(Role::Instructor),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(UnknownVariant { kind: "role", value }),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<String>,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

pub struct NewUser {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone_number: Option<String>,
    pub role: Role,
}

pub(crate) const USER_COLUMNS: &str = "id, full_name, email, password_hash, phone_number, role, created_at";

#[async_trait]
impl UserStore for PgStore {
    #[instrument(skip(self))]
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
                INSERT INTO users (id, full_name, email, password_hash, phone_number, role)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone_number)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, || AppError::Conflict("An account with this email already exists.".into())))
    }

    #[instrument(skip(self))]
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at"))
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    #[instrument(skip(self))]
    async fn update_profile(&self, id: Uuid, full_name: &str, phone_number: Option<&str>) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET full_name = $2, phone_number = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(full_name)
        .bind(phone_number)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("User", id))
    }

    #[instrument(skip(self, password_hash))]
    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotion_only_lifts_plain_users() {
        assert_eq!(Role::User.promoted(), Some(Role::Instructor));
        assert_eq!(Role::Instructor.promoted(), None);
        assert_eq!(Role::Admin.promoted(), None);
    }

    #[test]
    fn demotion_only_lowers_instructors() {
        assert_eq!(Role::Instructor.demoted(), Some(Role::User));
        assert_eq!(Role::User.demoted(), None);
        assert_eq!(Role::Admin.demoted(), None);
    }

    #[test]
    fn roles_round_trip_through_their_column_value() {
        for role in [Role::User, Role::Instructor, Role::Admin] {
            assert_eq!(Role::try_from(role.as_str().to_string()).unwrap(), role);
        }
        assert!(Role::try_from("ROOT".to_string()).is_err());
    }
}
