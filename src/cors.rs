use actix_cors::Cors;
use actix_web::http::header;

use crate::config::Config;
use crate::csrf::CSRF_HEADER;

/// CORS policy for the API.
///
/// Without `cors_allowed_origin` no cross-origin request is allowed. With it, that one
/// origin may send credentialed requests carrying the session and CSRF cookies.
pub fn cors_policy(config: &Config) -> Cors {
    let cors = match &config.cors_allowed_origin {
        Some(origin) => Cors::default().allowed_origin(origin).supports_credentials(),
        None => Cors::default(),
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .allowed_header(CSRF_HEADER)
        .max_age(3600)
}
