use actix_web::{post, web::{self, Json}, HttpRequest};
use tracing::{debug, info};
use validator::Validate;

use crate::{
    errors::AppError,
    models::{user::{NewUser, Role}, UserStore},
    schema::{auth::{AuthenticationResponse, LoginRequest, RegisterRequest}, ApiResponse},
    utils::{hash_password, verify_password},
    GlobalState,
};

#[post("/register")]
pub async fn register(data:web::Data<GlobalState>, body:Json<RegisterRequest>, req:HttpRequest) -> Result<ApiResponse<AuthenticationResponse>, AppError>{
    let body = body.into_inner();
    body.validate()?;

    if data.store.email_exists(&body.email).await? {
        return Err(AppError::Conflict("An account with this email already exists.".into()));
    }

    let password_hash = hash_password(&body.password)
        .map_err(|e| AppError::internal(anyhow::anyhow!("password hashing failed: {e}")))?;

    let user = data.store.create_user(NewUser{
        full_name: body.full_name.trim().to_string(),
        email: body.email,
        password_hash,
        phone_number: body.phone_number,
        role: Role::User,
    }).await?;

    let token = data.jwt.issue(&user)?;
    info!(user = %user.id, email = %user.email, "registered new user");

    Ok(ApiResponse::created(AuthenticationResponse::new(token, &user), "User registered successfully", &req))
}

#[post("/login")]
pub async fn login(data:web::Data<GlobalState>, body:Json<LoginRequest>, req:HttpRequest) -> Result<ApiResponse<AuthenticationResponse>, AppError> {
    body.validate()?;

    let invalid = || AppError::Unauthorized("Invalid email or password".into());

    let Some(user) = data.store.find_user_by_email(&body.email).await? else {
        debug!(email = %body.email, "login for unknown email");
        return Err(invalid());
    };

    if verify_password(&body.password, &user.password_hash).is_err() {
        debug!(user = %user.id, "login with wrong password");
        return Err(invalid());
    }

    let token = data.jwt.issue(&user)?;

    Ok(ApiResponse::success(
        Some(AuthenticationResponse::new(token, &user)),
        "Signed in successfully",
        req.path(),
        actix_web::http::StatusCode::OK,
    ))
}
