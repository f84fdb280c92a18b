use actix_web::{body::BoxBody, http::StatusCode, HttpRequest, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::ValidationError;

pub mod admin;
pub mod auth;
pub mod course;
pub mod user;

/// Envelope wrapped around every JSON response, successful or not.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status: u16,
    pub timestamp: DateTime<Utc>,
    pub path: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: impl Into<String>, path: &str, status: StatusCode) -> Self {
        ApiResponse {
            success: true,
            status: status.as_u16(),
            timestamp: Utc::now(),
            path: path.to_string(),
            message: message.into(),
            data,
        }
    }

    pub fn error(data: Option<T>, message: impl Into<String>, status: StatusCode, path: &str) -> Self {
        ApiResponse {
            success: false,
            status: status.as_u16(),
            timestamp: Utc::now(),
            path: path.to_string(),
            message: message.into(),
            data,
        }
    }

    pub fn ok(data: T, req: &HttpRequest) -> Self {
        Self::success(Some(data), "Request successful", req.path(), StatusCode::OK)
    }

    pub fn created(data: T, message: impl Into<String>, req: &HttpRequest) -> Self {
        Self::success(Some(data), message, req.path(), StatusCode::CREATED)
    }
}

impl ApiResponse<()> {
    pub fn done(message: impl Into<String>, req: &HttpRequest) -> Self {
        Self::success(None, message, req.path(), StatusCode::OK)
    }
}

impl<T: Serialize> Responder for ApiResponse<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        HttpResponse::build(status).json(self)
    }
}

/// Query parameters for paged listings.
#[derive(Debug, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: PageRequest, total_elements: i64) -> Self {
        let total_pages = if total_elements == 0 {
            0
        } else {
            (total_elements + request.size - 1) / request.size
        };

        Page {
            content,
            page: request.page,
            size: request.size,
            total_elements,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Clamped page coordinates; page numbers start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
}

impl PageRequest {
    /// Rows to skip. Pages past the end saturate instead of overflowing.
    pub fn offset(&self) -> i64 {
        self.page.saturating_mul(self.size)
    }
}

impl From<PageParams> for PageRequest {
    fn from(params: PageParams) -> Self {
        PageRequest {
            page: params.page.unwrap_or(0).max(0),
            size: params.size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// Rejects strings that are empty once surrounding whitespace is removed.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("must not be blank".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_params_are_clamped() {
        let req = PageRequest::from(PageParams { page: Some(-3), size: Some(500) });
        assert_eq!(req, PageRequest { page: 0, size: MAX_PAGE_SIZE });

        let req = PageRequest::from(PageParams { page: None, size: None });
        assert_eq!(req, PageRequest { page: 0, size: DEFAULT_PAGE_SIZE });

        let req = PageRequest::from(PageParams { page: Some(2), size: Some(0) });
        assert_eq!(req.size, 1);
        assert_eq!(req.offset(), 2);
    }

    #[test]
    fn huge_pages_do_not_overflow() {
        let req = PageRequest::from(PageParams { page: Some(i64::MAX), size: Some(MAX_PAGE_SIZE) });
        assert_eq!(req.offset(), i64::MAX);
    }

    #[test]
    fn total_pages_rounds_up() {
        let request = PageRequest { page: 0, size: 10 };
        assert_eq!(Page::new(vec![0; 10], request, 21).total_pages, 3);
        assert_eq!(Page::<u8>::new(vec![], request, 0).total_pages, 0);
        assert_eq!(Page::new(vec![0; 10], request, 10).total_pages, 1);
    }

    #[test]
    fn blank_strings_fail_validation() {
        assert!(not_blank("  \t").is_err());
        assert!(not_blank("").is_err());
        assert!(not_blank(" Rust ").is_ok());
    }

    #[test]
    fn null_data_is_omitted() {
        let body = ApiResponse::<()>::success(None, "Operation successful", "/api/x", StatusCode::OK);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("data").is_none());
        assert_eq!(json["status"], 200);
        assert_eq!(json["path"], "/api/x");
    }
}
