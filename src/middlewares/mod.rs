use actix_web::{dev::{Payload, ServiceRequest}, FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{errors::AppError, models::user::{Role, User}};

pub mod admin;
pub mod envelope;
pub mod instructor;
pub mod user;

/// The caller resolved by [`user::user_middleware`], stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .extensions()
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".into()));

        ready(user)
    }
}

/// Fails unless the authenticated caller holds `role`.
pub(crate) fn require_role(req: &ServiceRequest, role: Role) -> Result<(), AppError> {
    let extensions = req.extensions();
    let Some(AuthUser(user)) = extensions.get::<AuthUser>() else {
        return Err(AppError::Unauthorized("Authentication required".into()));
    };

    if user.role != role {
        tracing::debug!(user = %user.id, role = %user.role, required = %role, "role check failed");
        return Err(AppError::Forbidden);
    }

    Ok(())
}
