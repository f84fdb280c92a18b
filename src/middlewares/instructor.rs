use actix_web::{body::{EitherBody, MessageBody}, dev::{ServiceRequest, ServiceResponse}, middleware::Next, Error};

use crate::models::user::Role;

use super::require_role;

pub async fn instructor_middleware<B: MessageBody>(
    req:ServiceRequest,
    next: Next<B>
) -> Result<ServiceResponse<EitherBody<B>>, Error>{

    if let Err(err) = require_role(&req, Role::Instructor) {
        return Ok(req.error_response(err).map_into_right_body());
    }

    next.call(req).await.map(ServiceResponse::map_into_left_body)
}
