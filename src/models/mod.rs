//! Persisted entities and the store traits handlers talk to.
//!
//! Each model file carries its entity types and the PostgreSQL queries for
//! them, implemented on [`PgStore`].

use async_trait::async_trait;
use sqlx::{types::Uuid, Pool, Postgres};
use thiserror::Error;

use crate::{errors::AppError, schema::{Page, PageRequest}};

pub mod admin_log;
pub mod course;
pub mod subscription;
pub mod user;

use admin_log::{AdminLog, NewAdminLog};
use course::{Course, CourseStatus, NewCourse, Outcome};
use subscription::Subscription;
use user::{NewUser, Role, User};

pub type StoreResult<T> = Result<T, AppError>;

/// A text column held a value no enum variant matches.
#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn email_exists(&self, email: &str) -> StoreResult<bool>;

    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn list_users(&self) -> StoreResult<Vec<User>>;

    async fn update_profile(&self, id: Uuid, full_name: &str, phone_number: Option<&str>) -> StoreResult<User>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;
}

#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn create_course(&self, course: NewCourse) -> StoreResult<Course>;

    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>>;

    async fn courses_with_status(&self, statuses: &[CourseStatus]) -> StoreResult<Vec<Course>>;

    async fn courses_created_by(&self, user_id: Uuid) -> StoreResult<Vec<Course>>;

    /// Applies `outcome` to a course that is still in `from`, atomically.
    /// Deleting also removes every subscription to the course. A course that
    /// left `from` meanwhile is a `Conflict`, a vanished one `NotFound`.
    async fn apply_outcome(&self, id: Uuid, from: CourseStatus, outcome: Outcome) -> StoreResult<()>;
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn is_subscribed(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<bool>;

    /// Fails with `Conflict` when the pair already exists.
    async fn subscribe(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<Subscription>;

    /// Returns whether a subscription was removed.
    async fn unsubscribe(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<bool>;

    async fn subscribed_courses(&self, user_id: Uuid) -> StoreResult<Vec<Course>>;
}

/// Admin transitions commit together with their audit entry or not at all.
#[async_trait]
pub trait AdminLogStore: Send + Sync {
    /// Moves `entry.target_id` from role `from` to `to` and logs it.
    async fn record_role_change(&self, entry: NewAdminLog, from: Role, to: Role) -> StoreResult<User>;

    /// Logs the decision, then applies `outcome` as [`CourseStore::apply_outcome`] does.
    async fn record_course_decision(&self, entry: NewAdminLog, from: CourseStatus, outcome: Outcome) -> StoreResult<()>;

    /// Newest entries first.
    async fn logs_by_admin(&self, admin_id: Uuid, page: PageRequest) -> StoreResult<Page<AdminLog>>;
}

pub trait Store: UserStore + CourseStore + SubscriptionStore + AdminLogStore {}

impl<T> Store for T where T: UserStore + CourseStore + SubscriptionStore + AdminLogStore {}

#[derive(Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgStore { pool }
    }
}
