use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use validator::Validate;

use crate::models::course::{Course, CourseStatus};

use super::not_blank;

/// Image sent along with a new course; `data` is base64.
#[derive(Debug, Deserialize, Serialize)]
pub struct ThumbnailUpload {
    pub filename: String,
    pub data: String,
}

#[derive(Debug, Deserialize, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[validate(custom(function = "not_blank"))]
    pub course_name: String,
    #[validate(custom(function = "not_blank"))]
    pub instructor: String,
    #[validate(custom(function = "not_blank"))]
    pub category: String,
    #[validate(custom(function = "not_blank"))]
    pub video_link: String,
    pub thumbnail: ThumbnailUpload,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: Uuid,
    pub course_name: String,
    pub instructor: String,
    pub category: String,
    pub video_link: String,
    pub thumbnail_url: Option<String>,
    pub status: CourseStatus,
    pub created_by_id: Uuid,
    pub creator_email: String,
}

impl CourseResponse {
    /// `base_url` is scheme and host of the current request.
    pub fn from_course(course: Course, base_url: &str) -> Self {
        let thumbnail_url = course
            .thumbnail
            .filter(|name| !name.is_empty())
            .map(|name| format!("{}/api/images/{}", base_url, name));

        CourseResponse {
            id: course.id,
            course_name: course.course_name,
            instructor: course.instructor,
            category: course.category,
            video_link: course.video_link,
            thumbnail_url,
            status: course.status,
            created_by_id: course.created_by,
            creator_email: course.creator_email,
        }
    }
}

/// Row of the admin moderation queue.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingCourseResponse {
    pub id: Uuid,
    pub course_name: String,
    pub instructor_name: String,
    pub creator_email: String,
    pub creator_id: Uuid,
    pub status: CourseStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Course> for PendingCourseResponse {
    fn from(course: Course) -> Self {
        PendingCourseResponse {
            id: course.id,
            course_name: course.course_name,
            instructor_name: course.instructor,
            creator_email: course.creator_email,
            creator_id: course.created_by,
            status: course.status,
            created_at: course.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(thumbnail: Option<&str>) -> Course {
        Course {
            id: Uuid::new_v4(),
            course_name: "Rust 101".into(),
            instructor: "Ferris".into(),
            category: "Programming".into(),
            video_link: "https://video.example/rust".into(),
            thumbnail: thumbnail.map(String::from),
            status: CourseStatus::Approved,
            created_by: Uuid::new_v4(),
            creator_email: "ferris@example.com".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn thumbnail_url_points_at_image_route() {
        let res = CourseResponse::from_course(course(Some("abc.png")), "http://localhost:8080");
        assert_eq!(res.thumbnail_url.as_deref(), Some("http://localhost:8080/api/images/abc.png"));

        let res = CourseResponse::from_course(course(Some("")), "http://localhost:8080");
        assert!(res.thumbnail_url.is_none());

        let res = CourseResponse::from_course(course(None), "http://localhost:8080");
        assert!(res.thumbnail_url.is_none());
    }
}
