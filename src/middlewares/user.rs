use actix_web::{body::{EitherBody, MessageBody}, dev::{ServiceRequest, ServiceResponse}, http::header, middleware::Next, web, Error, HttpMessage};
use tracing::debug;

use crate::{errors::AppError, models::{user::User, UserStore}, GlobalState};

use super::AuthUser;

/// Resolves the bearer token to a stored user; every protected scope runs this first.
/// Failures are answered here, in the response, so the request is never cloned for them.
pub async fn user_middleware<B: MessageBody>(
    req:ServiceRequest,
    next: Next<B>) -> Result<ServiceResponse<EitherBody<B>>, Error>
{
    match authenticate(&req).await {
        Ok(user) => {
            debug!(user = %user.id, role = %user.role, path = req.path(), "authenticated request");
            req.extensions_mut().insert(AuthUser(user));
            next.call(req).await.map(ServiceResponse::map_into_left_body)
        }
        Err(err) => Ok(req.error_response(err).map_into_right_body()),
    }
}

async fn authenticate(req: &ServiceRequest) -> Result<User, AppError> {
    let data = req
        .app_data::<web::Data<GlobalState>>()
        .ok_or_else(|| AppError::internal(anyhow::anyhow!("application state is not registered")))?;

    let token = bearer_token(req)?;

    let claims = data.jwt.verify(&token)?;
    let user_id = claims.user_id()?;

    data.store
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".into()))
}

fn bearer_token(req: &ServiceRequest) -> Result<String, AppError> {
    let header = req
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Token Not found".into()))?;

    let value = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid token".into()))?;

    value
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Invalid token".into()))
}
