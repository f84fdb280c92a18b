use actix_web::{get, http::StatusCode, post, put, web, HttpRequest};
use sqlx::types::Uuid;
use tracing::info;

use crate::{
    errors::AppError,
    middlewares::AuthUser,
    models::{
        admin_log::{AdminAction, NewAdminLog},
        course::{CourseStatus, Decision, Outcome},
        user::{Role, User},
        AdminLogStore, CourseStore, UserStore,
    },
    schema::{
        admin::AdminLogResponse,
        course::PendingCourseResponse,
        user::UserDto,
        ApiResponse, Page, PageParams, PageRequest,
    },
    GlobalState,
};

#[get("/users")]
pub async fn list_users(data:web::Data<GlobalState>, req:HttpRequest) -> Result<ApiResponse<Vec<UserDto>>, AppError>{
    let users = data.store.list_users().await?.into_iter().map(UserDto::from).collect();
    Ok(ApiResponse::ok(users, &req))
}

#[put("/users/promote/{user_id}")]
pub async fn promote_user(data:web::Data<GlobalState>, AuthUser(admin):AuthUser, path:web::Path<Uuid>, req:HttpRequest) -> Result<ApiResponse<UserDto>, AppError>{
    let user = change_role(&data, &admin, path.into_inner(), Role::promoted, AdminAction::PromotedUser).await?;
    Ok(ApiResponse::success(Some(UserDto::from(user)), "User promoted successfully", req.path(), StatusCode::OK))
}

#[put("/users/demote/{user_id}")]
pub async fn demote_user(data:web::Data<GlobalState>, AuthUser(admin):AuthUser, path:web::Path<Uuid>, req:HttpRequest) -> Result<ApiResponse<UserDto>, AppError>{
    let user = change_role(&data, &admin, path.into_inner(), Role::demoted, AdminAction::DemotedUser).await?;
    Ok(ApiResponse::success(Some(UserDto::from(user)), "User demoted successfully", req.path(), StatusCode::OK))
}

/// Applies a role step and logs it in one commit. Users the step does not apply to come back unchanged.
async fn change_role(
    data: &GlobalState,
    admin: &User,
    user_id: Uuid,
    step: fn(Role) -> Option<Role>,
    action: AdminAction,
) -> Result<User, AppError> {
    let user = data
        .store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User", user_id))?;

    let Some(role) = step(user.role) else {
        return Ok(user);
    };

    let entry = NewAdminLog::new(admin.id, action, user.id, action.describe(&user.email));
    let updated = data.store.record_role_change(entry, user.role, role).await?;

    info!(admin = %admin.id, user = %updated.id, %action, "changed user role");
    Ok(updated)
}

#[get("/courses/pending")]
pub async fn pending_courses(data:web::Data<GlobalState>, req:HttpRequest) -> Result<ApiResponse<Vec<PendingCourseResponse>>, AppError>{
    let courses = data
        .store
        .courses_with_status(&CourseStatus::PENDING)
        .await?
        .into_iter()
        .map(PendingCourseResponse::from)
        .collect();

    Ok(ApiResponse::ok(courses, &req))
}

#[post("/courses/approve/{course_id}")]
pub async fn approve_course(data:web::Data<GlobalState>, AuthUser(admin):AuthUser, path:web::Path<Uuid>, req:HttpRequest) -> Result<ApiResponse<()>, AppError>{
    moderate(&data, &admin, path.into_inner(), Decision::Approve).await?;
    Ok(ApiResponse::done("Course approved successfully", &req))
}

#[post("/courses/reject/{course_id}")]
pub async fn reject_course(data:web::Data<GlobalState>, AuthUser(admin):AuthUser, path:web::Path<Uuid>, req:HttpRequest) -> Result<ApiResponse<()>, AppError>{
    moderate(&data, &admin, path.into_inner(), Decision::Reject).await?;
    Ok(ApiResponse::done("Course rejected successfully", &req))
}

/// Runs an admin decision through the course state machine. The change and its
/// log entry commit together; a course moved by someone else in between is a conflict.
async fn moderate(data: &GlobalState, admin: &User, course_id: Uuid, decision: Decision) -> Result<(), AppError> {
    let course = data
        .store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course", course_id))?;

    let outcome = course.status.decide(decision)?;
    let action = decision
        .action(course.status)
        .ok_or_else(|| AppError::internal(anyhow::anyhow!("no audit action for {:?} on {}", decision, course.status)))?;

    let entry = NewAdminLog::new(admin.id, action, course.id, action.describe(&course.course_name));
    data.store.record_course_decision(entry, course.status, outcome).await?;

    if let (Outcome::Delete, Some(thumbnail)) = (outcome, &course.thumbnail) {
        data.storage.remove(thumbnail).await;
    }

    info!(admin = %admin.id, course = %course.id, %action, "moderated course");
    Ok(())
}

#[get("/logs/me")]
pub async fn my_logs(data:web::Data<GlobalState>, AuthUser(admin):AuthUser, query:web::Query<PageParams>, req:HttpRequest) -> Result<ApiResponse<Page<AdminLogResponse>>, AppError>{
    let page = PageRequest::from(query.into_inner());

    let logs = data
        .store
        .logs_by_admin(admin.id, page)
        .await?
        .map(AdminLogResponse::from);

    Ok(ApiResponse::ok(logs, &req))
}
