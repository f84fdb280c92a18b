pub mod admin;
pub mod auth;
pub mod course;
pub mod images;
pub mod instructor;
pub mod user;

use actix_web::{middleware::from_fn, web, HttpRequest};

use crate::{
    errors::AppError,
    middlewares::{admin::admin_middleware, instructor::instructor_middleware, user::user_middleware},
    GlobalState,
};

/// Registers state, extractor settings and every route under `/api`.
pub fn configure(cfg: &mut web::ServiceConfig, state: web::Data<GlobalState>, json_limit: usize) {
    cfg.app_data(state)
        .app_data(
            web::JsonConfig::default()
                .limit(json_limit)
                .error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()),
        )
        .app_data(web::PathConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()))
        .app_data(web::QueryConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into()))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                    .service(auth::register)
                    .service(auth::login)
                )
                .service(
                    web::scope("/public/courses")
                    .service(course::list_live_courses)
                    .service(course::get_live_course)
                )
                .service(
                    web::scope("/images")
                    .service(images::serve_image)
                )
                .service(
                    web::scope("/user")
                    .wrap(from_fn(user_middleware))
                    .service(user::list_courses)
                    .service(user::my_subscriptions)
                    .service(user::subscribe)
                    .service(user::unsubscribe)
                    .service(user::get_profile)
                    .service(user::update_profile)
                    .service(user::change_password)
                )
                .service(
                    // wraps run last-registered first, so authentication precedes the role gate
                    web::scope("/instructor")
                    .wrap(from_fn(instructor_middleware))
                    .wrap(from_fn(user_middleware))
                    .service(instructor::my_courses)
                    .service(instructor::create_course)
                    .service(instructor::remove_course)
                )
                .service(
                    web::scope("/admin")
                    .wrap(from_fn(admin_middleware))
                    .wrap(from_fn(user_middleware))
                    .service(admin::list_users)
                    .service(admin::promote_user)
                    .service(admin::demote_user)
                    .service(admin::pending_courses)
                    .service(admin::approve_course)
                    .service(admin::reject_course)
                    .service(admin::my_logs)
                )
        )
        .default_service(web::to(not_found));
}

async fn not_found(req: HttpRequest) -> Result<actix_web::HttpResponse, AppError> {
    Err(AppError::NotFound(format!("No route for {} {}", req.method(), req.path())))
}

/// Scheme and host the client used, for links back to this server.
pub(crate) fn base_url(req: &HttpRequest) -> String {
    let info = req.connection_info();
    format!("{}://{}", info.scheme(), info.host())
}
