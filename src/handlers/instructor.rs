use actix_web::{delete, get, post, web::{self, Json}, HttpRequest};
use sqlx::types::Uuid;
use tracing::info;
use validator::Validate;

use crate::{
    errors::AppError,
    middlewares::AuthUser,
    models::{course::{NewCourse, Outcome}, CourseStore},
    schema::{course::{CourseResponse, CreateCourseRequest}, ApiResponse},
    GlobalState,
};

use super::base_url;

#[get("/courses/my-courses")]
pub async fn my_courses(data:web::Data<GlobalState>, AuthUser(user):AuthUser, req:HttpRequest) -> Result<ApiResponse<Vec<CourseResponse>>, AppError>{
    let base = base_url(&req);

    let courses = data
        .store
        .courses_created_by(user.id)
        .await?
        .into_iter()
        .map(|course| CourseResponse::from_course(course, &base))
        .collect();

    Ok(ApiResponse::ok(courses, &req))
}

#[post("/courses")]
pub async fn create_course(data:web::Data<GlobalState>, AuthUser(user):AuthUser, body:Json<CreateCourseRequest>, req:HttpRequest) -> Result<ApiResponse<CourseResponse>, AppError>{
    let body = body.into_inner();
    body.validate()?;

    let thumbnail = data
        .storage
        .store_base64(&body.thumbnail.filename, &body.thumbnail.data)
        .await?;

    let created = data.store.create_course(NewCourse{
        course_name: body.course_name.trim().to_string(),
        instructor: body.instructor.trim().to_string(),
        category: body.category.trim().to_string(),
        video_link: body.video_link.trim().to_string(),
        thumbnail: Some(thumbnail.clone()),
        created_by: user.id,
    }).await;

    let course = match created {
        Ok(course) => course,
        Err(e) => {
            data.storage.remove(&thumbnail).await;
            return Err(e);
        }
    };

    info!(course = %course.id, instructor = %user.id, "course submitted for approval");

    Ok(ApiResponse::created(
        CourseResponse::from_course(course, &base_url(&req)),
        "Course created successfully and is pending approval.",
        &req,
    ))
}

/// Drafts are deleted at once; published courses go to the admins as a removal request.
#[delete("/courses/{course_id}")]
pub async fn remove_course(data:web::Data<GlobalState>, AuthUser(user):AuthUser, path:web::Path<Uuid>, req:HttpRequest) -> Result<ApiResponse<()>, AppError>{
    let course_id = path.into_inner();

    let course = data
        .store
        .find_course(course_id)
        .await?
        .ok_or_else(|| AppError::not_found("Course", course_id))?;

    if course.created_by != user.id {
        return Err(AppError::Forbidden);
    }

    let outcome = course.status.request_removal()?;
    data.store.apply_outcome(course.id, course.status, outcome).await?;

    let message = match outcome {
        Outcome::Delete => {
            if let Some(thumbnail) = &course.thumbnail {
                data.storage.remove(thumbnail).await;
            }
            info!(course = %course.id, "unpublished course deleted by its instructor");
            "Course deleted successfully."
        }
        Outcome::Become(_) => {
            info!(course = %course.id, "removal requested");
            "Course removal request submitted for admin approval."
        }
    };

    Ok(ApiResponse::done(message, &req))
}
