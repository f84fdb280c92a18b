use actix_web::{delete, get, post, put, web::{self, Json}, HttpRequest};
use sqlx::types::Uuid;
use tracing::info;
use validator::Validate;

use crate::{
    errors::AppError,
    middlewares::AuthUser,
    models::{course::CourseStatus, CourseStore, SubscriptionStore, UserStore},
    schema::{
        course::CourseResponse,
        user::{ChangePasswordRequest, SubscriptionResponse, UserProfile},
        ApiResponse,
    },
    utils::{hash_password, verify_password},
    GlobalState,
};

use super::base_url;

#[get("/courses")]
pub async fn list_courses(data:web::Data<GlobalState>, req:HttpRequest) -> Result<ApiResponse<Vec<CourseResponse>>, AppError>{
    let base = base_url(&req);

    let courses = data
        .store
        .courses_with_status(&[CourseStatus::Approved])
        .await?
        .into_iter()
        .map(|course| CourseResponse::from_course(course, &base))
        .collect();

    Ok(ApiResponse::ok(courses, &req))
}

#[get("/courses/my-subscriptions")]
pub async fn my_subscriptions(data:web::Data<GlobalState>, AuthUser(user):AuthUser, req:HttpRequest) -> Result<ApiResponse<Vec<CourseResponse>>, AppError>{
    let base = base_url(&req);

    let courses = data
        .store
        .subscribed_courses(user.id)
        .await?
        .into_iter()
        .map(|course| CourseResponse::from_course(course, &base))
        .collect();

    Ok(ApiResponse::ok(courses, &req))
}

#[post("/courses/subscribe/{course_id}")]
pub async fn subscribe(data:web::Data<GlobalState>, AuthUser(user):AuthUser, path:web::Path<Uuid>, req:HttpRequest) -> Result<ApiResponse<SubscriptionResponse>, AppError>{
    let course_id = path.into_inner();

    let course = data
        .store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course", course_id))?;

    if !course.status.is_live() {
        return Err(AppError::BadRequest("Cannot subscribe to a non-approved course.".into()));
    }

    if data.store.is_subscribed(user.id, course.id).await? {
        return Err(AppError::Conflict("User is already subscribed to this course.".into()));
    }

    // the primary key still decides a race between two concurrent subscribes
    let subscription = data.store.subscribe(user.id, course.id).await?;
    info!(user = %user.id, course = %course.id, "subscribed");

    Ok(ApiResponse::created(
        SubscriptionResponse::new(subscription, &user, &course),
        "Successfully subscribed to the course.",
        &req,
    ))
}

#[delete("/courses/unsubscribe/{course_id}")]
pub async fn unsubscribe(data:web::Data<GlobalState>, AuthUser(user):AuthUser, path:web::Path<Uuid>, req:HttpRequest) -> Result<ApiResponse<()>, AppError>{
    let course_id = path.into_inner();

    if !data.store.unsubscribe(user.id, course_id).await? {
        return Err(AppError::NotFound(format!("Subscription not found for user {} and course {}", user.id, course_id)));
    }

    info!(user = %user.id, course = %course_id, "unsubscribed");
    Ok(ApiResponse::done("Successfully unsubscribed from the course.", &req))
}

#[get("/profile/me")]
pub async fn get_profile(AuthUser(user):AuthUser, req:HttpRequest) -> Result<ApiResponse<UserProfile>, AppError>{
    Ok(ApiResponse::ok(UserProfile::from(user), &req))
}

#[put("/profile/me")]
pub async fn update_profile(data:web::Data<GlobalState>, AuthUser(user):AuthUser, body:Json<UserProfile>, req:HttpRequest) -> Result<ApiResponse<UserProfile>, AppError>{
    body.validate()?;

    let phone_number = body
        .phone_number
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty());

    let updated = data
        .store
        .update_profile(user.id, body.full_name.trim(), phone_number)
        .await?;

    Ok(ApiResponse::success(
        Some(UserProfile::from(updated)),
        "Profile updated successfully",
        req.path(),
        actix_web::http::StatusCode::OK,
    ))
}

#[put("/profile/password")]
pub async fn change_password(data:web::Data<GlobalState>, AuthUser(user):AuthUser, body:Json<ChangePasswordRequest>, req:HttpRequest) -> Result<ApiResponse<()>, AppError>{
    body.validate()?;

    if verify_password(&body.current_password, &user.password_hash).is_err() {
        return Err(AppError::BadRequest("Current password is incorrect".into()));
    }

    if body.current_password == body.new_password {
        return Err(AppError::BadRequest("New password must be different from the current password".into()));
    }

    let password_hash = hash_password(&body.new_password)
        .map_err(|e| AppError::internal(anyhow::anyhow!("password hashing failed: {e}")))?;

    data.store.update_password(user.id, &password_hash).await?;
    info!(user = %user.id, "password changed");

    Ok(ApiResponse::done("Password changed successfully", &req))
}
