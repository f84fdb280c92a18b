use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use validator::Validate;

use crate::models::user::{Role, User};

use super::not_blank;

#[derive(Deserialize, Serialize, Debug)]
pub struct JWTClaims{
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest{
    #[validate(custom(function = "not_blank"))]
    pub full_name: String,
    #[validate(email(message = "Email should be valid"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct LoginRequest{
    #[validate(email(message = "Email should be valid"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse{
    pub token: String,
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

impl AuthenticationResponse {
    pub fn new(token: String, user: &User) -> Self {
        AuthenticationResponse {
            token,
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
        }
    }
}
