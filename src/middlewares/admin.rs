use actix_web::{body::{EitherBody, MessageBody}, dev::{ServiceRequest, ServiceResponse}, middleware::Next, Error};

use crate::models::user::Role;

use super::require_role;

/// Lets only admins through. Wrap it inside [`super::user::user_middleware`].
pub async fn admin_middleware<B: MessageBody>(
    req:ServiceRequest,
    next: Next<B>
) -> Result<ServiceResponse<EitherBody<B>>, Error>{

    if let Err(err) = require_role(&req, Role::Admin) {
        return Ok(req.error_response(err).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
