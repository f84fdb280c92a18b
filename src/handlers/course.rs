use actix_web::{get, web, HttpRequest};
use sqlx::types::Uuid;

use crate::{
    errors::AppError,
    models::{course::CourseStatus, CourseStore},
    schema::{course::CourseResponse, ApiResponse},
    GlobalState,
};

use super::base_url;

#[get("")]
pub async fn list_live_courses(data:web::Data<GlobalState>, req:HttpRequest) -> Result<ApiResponse<Vec<CourseResponse>>, AppError>{
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

#[get("/{course_id}")]
pub async fn get_live_course(data:web::Data<GlobalState>, path:web::Path<Uuid>, req:HttpRequest) -> Result<ApiResponse<CourseResponse>, AppError>{
    let course_id = path.into_inner();

    let course = data
        .store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course", course_id))?;

    if !course.status.is_live() {
        return Err(AppError::BadRequest("This course is not currently available.".into()));
    }

    Ok(ApiResponse::ok(CourseResponse::from_course(course, &base_url(&req)), &req))
}
