use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    Error, HttpResponse,
};

use crate::{errors::AppError, schema::ApiResponse};

/// Renders every error response (handler, middleware or framework) in the
/// response envelope with the request path filled in.
///
/// The request must not be cloned before `next.call`: routing needs sole
/// ownership of it. Inner middlewares therefore answer failures with
/// `ServiceRequest::error_response` instead of returning `Err`.
pub async fn envelope_middleware<B: MessageBody + 'static>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<EitherBody<B>>, Error> {
    let res = next.call(req).await?;

    let Some(body) = res.response().error().map(|err| render(err, res.request().path())) else {
        return Ok(res.map_into_left_body());
    };

    let (req, _) = res.into_parts();
    Ok(ServiceResponse::new(req, body).map_into_right_body())
}

fn render(err: &Error, path: &str) -> HttpResponse {
    if let Some(app_err) = err.as_error::<AppError>() {
        return app_err.envelope(path);
    }

    let status = err.as_response_error().status_code();
    let message = if status.is_server_error() {
        tracing::error!(error = %err, path, "unhandled error");
        "An unexpected internal server error occurred.".to_string()
    } else {
        err.to_string()
    };

    HttpResponse::build(status).json(ApiResponse::<()>::error(None, message, status, path))
}
