use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use validator::Validate;

use crate::models::{
    course::Course,
    subscription::Subscription,
    user::{Role, User},
};

use super::not_blank;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub role: Role,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        UserDto {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            phone_number: user.phone_number,
            role: user.role,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[validate(custom(function = "not_blank"))]
    pub full_name: String,
    pub phone_number: Option<String>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile {
            full_name: user.full_name,
            phone_number: user.phone_number,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, message = "Current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub new_password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub user_id: Uuid,
    pub user_full_name: String,
    pub user_email: String,
    pub course_id: Uuid,
    pub course_name: String,
    pub subscribed_at: DateTime<Utc>,
}

impl SubscriptionResponse {
    pub fn new(subscription: Subscription, user: &User, course: &Course) -> Self {
        SubscriptionResponse {
            user_id: subscription.user_id,
            user_full_name: user.full_name.clone(),
            user_email: user.email.clone(),
            course_id: subscription.course_id,
            course_name: course.course_name.clone(),
            subscribed_at: subscription.subscribed_at,
        }
    }
}
