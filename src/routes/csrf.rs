use actix_web::{get, web, HttpRequest, HttpResponse};
use serde_json::json;

use crate::config::Config;
use crate::csrf::{csrf_cookie, generate_secret, mask_secret, secret_from, CSRF_COOKIE};

/// Issues a CSRF token for the frontend to send back in `X-CSRFToken`.
///
/// Reuses the secret from an existing `csrftoken` cookie, or starts a new one, and
/// refreshes the cookie either way.
#[get("/api/csrf-token/")]
pub async fn get_csrf_token(req: HttpRequest, config: web::Data<Config>) -> HttpResponse {
    let secret = req
        .cookie(CSRF_COOKIE)
        .and_then(|cookie| secret_from(cookie.value()))
        .unwrap_or_else(generate_secret);

    HttpResponse::Ok()
        .cookie(csrf_cookie(&secret, config.secure_cookies))
        .json(json!({ "csrfToken": mask_secret(&secret) }))
}
