pub mod auth;
pub mod csrf;
pub mod health;
pub mod todos;

use actix_web::{error::JsonPayloadError, web, HttpRequest};

use crate::error::AppError;

/// Malformed or incomplete JSON bodies answer `400 {"error": ...}`.
fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

/// Ids that do not parse as integers cannot match a todo.
fn path_error(_err: actix_web::error::PathError, _req: &HttpRequest) -> actix_web::Error {
    AppError::NotFound("Not found.".into()).into()
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error))
        .app_data(web::PathConfig::default().error_handler(path_error))
        .service(health::health)
        .service(csrf::get_csrf_token)
        .service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(
            web::scope("/todo")
                .service(todos::list_todos)
                .service(todos::create_todo)
                .service(todos::get_todo)
                .service(todos::update_todo)
                .service(todos::partial_update_todo)
                .service(todos::delete_todo),
        );
}
