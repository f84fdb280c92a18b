use std::collections::BTreeMap;

use actix_web::{body::BoxBody, http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::schema::ApiResponse;

/// Failures that abort startup before the server accepts requests.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
    #[error("Cant connect to the DB")]
    DbConnect(#[source] sqlx::Error),
    #[error("Cant prepare the upload directory")]
    Storage(#[source] std::io::Error),
    #[error("Cant bind to the Socket")]
    SocketBind(#[source] std::io::Error),
    #[error("Cant start the server")]
    ServerStart(#[source] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),
    #[error("Access Denied: You do not have permission to access this resource.")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(#[from] ValidationErrors),
    #[error("An unexpected internal server error occurred.")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        AppError::Internal(err.into())
    }

    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        AppError::NotFound(format!("{} not found with id: {}", what, id))
    }

    /// The row left the state a transition was checked against before it committed.
    pub fn stale(what: &str) -> Self {
        AppError::Conflict(format!("{} was changed by another request. Reload and try again.", what))
    }

    /// Per-field messages for validation failures, keyed by the field's JSON name.
    fn details(&self) -> Option<BTreeMap<String, String>> {
        let AppError::Validation(errors) = self else {
            return None;
        };

        let fields = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => e.code.to_string(),
                    })
                    .unwrap_or_default();
                (camel_case(&field), message)
            })
            .collect();

        Some(fields)
    }

    /// Renders the error in the response envelope for the given request path.
    pub fn envelope(&self, path: &str) -> HttpResponse {
        let status = self.status_code();

        if let AppError::Internal(source) = self {
            error!(error = ?source, path, "internal error while handling request");
        }

        let body = ApiResponse::error(self.details(), self.to_string(), status, path);
        HttpResponse::build(status).json(body)
    }
}

/// `full_name` -> `fullName`, matching the serde renames on request bodies.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // The path is filled in by the envelope middleware, which sees the request.
    fn error_response(&self) -> HttpResponse<BoxBody> {
        self.envelope("")
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::internal(err)
    }
}

/// Maps a unique-constraint violation to the given error, anything else to an internal error.
pub fn map_unique_violation(err: sqlx::Error, conflict: impl FnOnce() -> AppError) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => conflict(),
        _ => AppError::internal(err),
    }
}
