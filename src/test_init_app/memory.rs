//! In-memory [`Store`](crate::models::Store) so the handler tests run without PostgreSQL.
//! It mirrors the constraints the database enforces: unique emails, one
//! subscription per pair, creator/admin joins and the course delete cascade.
//! Admin transitions and their log rows happen under one lock.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use sqlx::types::Uuid;

use crate::{
    errors::AppError,
    models::{
        admin_log::{AdminLog, NewAdminLog},
        course::{Course, CourseStatus, NewCourse, Outcome},
        subscription::Subscription,
        user::{NewUser, Role, User},
        AdminLogStore, CourseStore, StoreResult, SubscriptionStore, UserStore,
    },
    schema::{Page, PageRequest},
};

#[derive(Default)]
pub struct Tables {
    pub users: Vec<User>,
    pub courses: Vec<Course>,
    pub subscriptions: Vec<Subscription>,
    pub logs: Vec<AdminLog>,
}

#[derive(Default)]
pub struct MemoryStore {
    pub tables: Mutex<Tables>,
}

impl Tables {
    /// Checks before it mutates, so a failure leaves every table as it was.
    fn apply_outcome(&mut self, id: Uuid, from: CourseStatus, outcome: Outcome) -> StoreResult<()> {
        let course = self
            .courses
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::not_found("Course", id))?;
        if course.status != from {
            return Err(AppError::stale("Course"));
        }

        match outcome {
            Outcome::Become(status) => course.status = status,
            Outcome::Delete => {
                self.subscriptions.retain(|s| s.course_id != id);
                self.courses.retain(|c| c.id != id);
            }
        }
        Ok(())
    }

    fn log_row(&self, entry: NewAdminLog) -> StoreResult<AdminLog> {
        let admin_email = self
            .users
            .iter()
            .find(|u| u.id == entry.admin_id)
            .map(|u| u.email.clone())
            .ok_or_else(|| missing_reference("user", entry.admin_id))?;

        Ok(AdminLog {
            id: Uuid::new_v4(),
            admin_id: entry.admin_id,
            admin_email,
            action: entry.action.as_str().to_string(),
            target_id: entry.target_id,
            target_type: entry.action.target_type().as_str().to_string(),
            details: entry.details,
            created_at: Utc::now(),
        })
    }
}

fn missing_reference(what: &str, id: Uuid) -> AppError {
    AppError::internal(anyhow::anyhow!("foreign key violation: no {} {}", what, id))
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.tables.lock().users.iter().find(|u| u.email == email).cloned())
    }

    async fn email_exists(&self, email: &str) -> StoreResult<bool> {
        Ok(self.tables.lock().users.iter().any(|u| u.email == email))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.lock();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict("An account with this email already exists.".into()));
        }

        let user = User {
            id: Uuid::new_v4(),
            full_name: user.full_name,
            email: user.email,
            password_hash: user.password_hash,
            phone_number: user.phone_number,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.lock().users.clone())
    }

    async fn update_profile(&self, id: Uuid, full_name: &str, phone_number: Option<&str>) -> StoreResult<User> {
        let mut tables = self.tables.lock();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("User", id))?;
        user.full_name = full_name.to_string();
        user.phone_number = phone_number.map(String::from);
        Ok(user.clone())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::not_found("User", id))?;
        user.password_hash = password_hash.to_string();
        Ok(())
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    async fn create_course(&self, course: NewCourse) -> StoreResult<Course> {
        let mut tables = self.tables.lock();
        let creator_email = tables
            .users
            .iter()
            .find(|u| u.id == course.created_by)
            .map(|u| u.email.clone())
            .ok_or_else(|| missing_reference("user", course.created_by))?;

        let course = Course {
            id: Uuid::new_v4(),
            course_name: course.course_name,
            instructor: course.instructor,
            category: course.category,
            video_link: course.video_link,
            thumbnail: course.thumbnail,
            status: CourseStatus::PendingAddition,
            created_by: course.created_by,
            creator_email,
            created_at: Utc::now(),
        };
        tables.courses.push(course.clone());
        Ok(course)
    }

    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        Ok(self.tables.lock().courses.iter().find(|c| c.id == id).cloned())
    }

    async fn courses_with_status(&self, statuses: &[CourseStatus]) -> StoreResult<Vec<Course>> {
        Ok(self
            .tables
            .lock()
            .courses
            .iter()
            .filter(|c| statuses.contains(&c.status))
            .cloned()
            .collect())
    }

    async fn courses_created_by(&self, user_id: Uuid) -> StoreResult<Vec<Course>> {
        Ok(self
            .tables
            .lock()
            .courses
            .iter()
            .filter(|c| c.created_by == user_id)
            .cloned()
            .collect())
    }

    async fn apply_outcome(&self, id: Uuid, from: CourseStatus, outcome: Outcome) -> StoreResult<()> {
        self.tables.lock().apply_outcome(id, from, outcome)
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn is_subscribed(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<bool> {
        Ok(self
            .tables
            .lock()
            .subscriptions
            .iter()
            .any(|s| s.user_id == user_id && s.course_id == course_id))
    }

    async fn subscribe(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<Subscription> {
        let mut tables = self.tables.lock();
        if !tables.courses.iter().any(|c| c.id == course_id) {
            return Err(missing_reference("course", course_id));
        }
        if tables.subscriptions.iter().any(|s| s.user_id == user_id && s.course_id == course_id) {
            return Err(AppError::Conflict("User is already subscribed to this course.".into()));
        }

        let subscription = Subscription { user_id, course_id, subscribed_at: Utc::now() };
        tables.subscriptions.push(subscription.clone());
        Ok(subscription)
    }

    async fn unsubscribe(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.lock();
        let before = tables.subscriptions.len();
        tables.subscriptions.retain(|s| !(s.user_id == user_id && s.course_id == course_id));
        Ok(tables.subscriptions.len() < before)
    }

    async fn subscribed_courses(&self, user_id: Uuid) -> StoreResult<Vec<Course>> {
        let tables = self.tables.lock();
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .filter_map(|s| tables.courses.iter().find(|c| c.id == s.course_id).cloned())
            .collect())
    }

}

#[async_trait]
impl AdminLogStore for MemoryStore {
    async fn record_role_change(&self, entry: NewAdminLog, from: Role, to: Role) -> StoreResult<User> {
        let mut tables = self.tables.lock();
        let log = tables.log_row(entry)?;
        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == log.target_id)
            .ok_or_else(|| AppError::not_found("User", log.target_id))?;
        if user.role != from {
            return Err(AppError::stale("User"));
        }

        user.role = to;
        let user = user.clone();
        tables.logs.push(log);
        Ok(user)
    }

    async fn record_course_decision(&self, entry: NewAdminLog, from: CourseStatus, outcome: Outcome) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        let log = tables.log_row(entry)?;
        tables.apply_outcome(log.target_id, from, outcome)?;
        tables.logs.push(log);
        Ok(())
    }

    async fn logs_by_admin(&self, admin_id: Uuid, page: PageRequest) -> StoreResult<Page<AdminLog>> {
        let tables = self.tables.lock();
        let own: Vec<&AdminLog> = tables.logs.iter().rev().filter(|l| l.admin_id == admin_id).collect();

        let content = own
            .iter()
            .skip(page.offset() as usize)
            .take(page.size as usize)
            .map(|l| (*l).clone())
            .collect();

        Ok(Page::new(content, page, own.len() as i64))
    }
}
