//! CSRF (Cross-Site Request Forgery) protection.
//!
//! The `csrftoken` cookie carries a 32-character alphanumeric secret. Tokens handed to
//! the frontend are a random 32-character mask followed by the secret shifted by that
//! mask, so every issued token differs while all of them unmask to the same secret.
//! `CsrfMiddleware` compares the secret behind the `X-CSRFToken` header with the cookie.

use actix_web::{
    body::EitherBody,
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    web, Error, HttpMessage, ResponseError,
};
use futures::future::{ready, LocalBoxFuture, Ready};
use rand::{distributions::Alphanumeric, Rng};
use subtle::ConstantTimeEq;

use crate::auth::session::SessionUser;
use crate::config::Config;
use crate::error::AppError;

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

pub const CSRF_SECRET_LENGTH: usize = 32;
pub const CSRF_TOKEN_LENGTH: usize = 2 * CSRF_SECRET_LENGTH;

/// One year, in seconds.
pub const CSRF_COOKIE_AGE: i64 = 31_449_600;

const CSRF_ALLOWED_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const REASON_NO_CSRF_COOKIE: &str = "CSRF cookie not set.";
pub const REASON_CSRF_TOKEN_MISSING: &str = "CSRF token missing.";
pub const REASON_CSRF_TOKEN_INCORRECT: &str = "CSRF token incorrect.";

fn random_string(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

fn char_index(c: u8) -> Option<usize> {
    CSRF_ALLOWED_CHARS.iter().position(|&allowed| allowed == c)
}

fn is_well_formed(value: &str, length: usize) -> bool {
    value.len() == length && value.bytes().all(|c| char_index(c).is_some())
}

pub fn generate_secret() -> String {
    random_string(CSRF_SECRET_LENGTH)
}

/// Masks `secret` with a fresh random mask. `secret` must be well formed.
pub fn mask_secret(secret: &str) -> String {
    let mask = random_string(CSRF_SECRET_LENGTH);
    let n = CSRF_ALLOWED_CHARS.len();

    let masked: String = secret
        .bytes()
        .zip(mask.bytes())
        .filter_map(|(s, m)| {
            let (s, m) = (char_index(s)?, char_index(m)?);
            Some(CSRF_ALLOWED_CHARS[(s + m) % n] as char)
        })
        .collect();

    format!("{}{}", mask, masked)
}

/// Recovers the secret from a masked token, or `None` if the token is malformed.
pub fn unmask_token(token: &str) -> Option<String> {
    if !is_well_formed(token, CSRF_TOKEN_LENGTH) {
        return None;
    }
    let n = CSRF_ALLOWED_CHARS.len();
    let (mask, masked) = token.split_at(CSRF_SECRET_LENGTH);

    mask.bytes()
        .zip(masked.bytes())
        .map(|(m, c)| {
            let (m, c) = (char_index(m)?, char_index(c)?);
            Some(CSRF_ALLOWED_CHARS[(c + n - m) % n] as char)
        })
        .collect()
}

/// The secret carried by a cookie or header value: either the bare secret or a masked token.
pub fn secret_from(value: &str) -> Option<String> {
    match value.len() {
        CSRF_SECRET_LENGTH if is_well_formed(value, CSRF_SECRET_LENGTH) => Some(value.to_string()),
        CSRF_TOKEN_LENGTH => unmask_token(value),
        _ => None,
    }
}

pub fn csrf_cookie(secret: &str, secure: bool) -> Cookie<'static> {
    Cookie::build(CSRF_COOKIE, secret.to_string())
        .path("/")
        // The frontend reads this cookie.
        .http_only(false)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::seconds(CSRF_COOKIE_AGE))
        .finish()
}

fn is_unsafe(method: &Method) -> bool {
    !matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Registration is always checked; everything else only once a session exists.
fn requires_check(method: &Method, path: &str, has_session: bool) -> bool {
    is_unsafe(method) && (has_session || path.trim_end_matches('/') == "/register")
}

/// Verifies the header token against the cookie secret.
pub fn verify_token(cookie: Option<&str>, header: Option<&str>) -> Result<(), AppError> {
    let expected = cookie
        .and_then(secret_from)
        .ok_or_else(|| AppError::Forbidden(REASON_NO_CSRF_COOKIE.into()))?;
    let header = header
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Forbidden(REASON_CSRF_TOKEN_MISSING.into()))?;
    let provided = secret_from(header)
        .ok_or_else(|| AppError::Forbidden(REASON_CSRF_TOKEN_INCORRECT.into()))?;

    if bool::from(expected.as_bytes().ct_eq(provided.as_bytes())) {
        Ok(())
    } else {
        Err(AppError::Forbidden(REASON_CSRF_TOKEN_INCORRECT.into()))
    }
}

fn check_request(req: &ServiceRequest) -> Result<(), AppError> {
    let enabled = req
        .app_data::<web::Data<Config>>()
        .map(|config| config.csrf_protection)
        .unwrap_or(true);
    if !enabled {
        return Ok(());
    }

    let has_session = req.extensions().get::<SessionUser>().is_some();
    if !requires_check(req.method(), req.path(), has_session) {
        return Ok(());
    }

    let cookie = req.cookie(CSRF_COOKIE);
    let header = req
        .headers()
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok());
    verify_token(cookie.as_ref().map(|c| c.value()), header)
}

/// Rejects unsafe requests whose `X-CSRFToken` does not match the `csrftoken` cookie.
///
/// Must run inside `SessionMiddleware` (wrapped before it) so sessions are resolved.
pub struct CsrfMiddleware;

impl<S, B> Transform<S, ServiceRequest> for CsrfMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = CsrfMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CsrfMiddlewareService { service }))
    }
}

pub struct CsrfMiddlewareService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for CsrfMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if let Err(app_err) = check_request(&req) {
            log::warn!("CSRF check failed for {} {}: {}", req.method(), req.path(), app_err);
            let response = app_err.error_response();
            return Box::pin(ready(Ok(req.into_response(response).map_into_right_body())));
        }

        let fut = self.service.call(req);
        Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) })
    }
}
