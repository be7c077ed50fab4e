//! Server-side login sessions.
//!
//! A successful login stores a random key in the `sessions` table and hands it to the
//! client in the `sessionid` cookie. `SessionMiddleware` resolves the cookie back to a
//! user on every request.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use chrono::{DateTime, Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::AppError;

pub const SESSION_COOKIE: &str = "sessionid";

/// Lifetime of a session, in days.
pub const SESSION_AGE_DAYS: i64 = 14;

/// How often the background task sweeps expired sessions.
pub const SESSION_CLEANUP_PERIOD: std::time::Duration = std::time::Duration::from_secs(3600);

/// The user behind the current request's session, stored in request extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
}

/// Opens a new session for `user_id` and returns its key.
pub async fn create_session(pool: &SqlitePool, user_id: i64) -> Result<String, AppError> {
    let session_key = Uuid::new_v4().simple().to_string();
    let expires = Utc::now() + Duration::days(SESSION_AGE_DAYS);

    sqlx::query("INSERT INTO sessions (session_key, user_id, expires) VALUES (?, ?, ?)")
        .bind(&session_key)
        .bind(user_id)
        .bind(expires)
        .execute(pool)
        .await?;

    Ok(session_key)
}

/// Looks up a session key. Expired sessions are deleted and treated as absent.
pub async fn load_session(
    pool: &SqlitePool,
    session_key: &str,
) -> Result<Option<SessionUser>, AppError> {
    let row: Option<(i64, DateTime<Utc>)> =
        sqlx::query_as("SELECT user_id, expires FROM sessions WHERE session_key = ?")
            .bind(session_key)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((user_id, expires)) if expires > Utc::now() => Ok(Some(SessionUser { user_id })),
        Some(_) => {
            log::debug!("Discarding expired session");
            delete_session(pool, session_key).await?;
            Ok(None)
        }
        None => Ok(None),
    }
}

pub async fn delete_session(pool: &SqlitePool, session_key: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE session_key = ?")
        .bind(session_key)
        .execute(pool)
        .await?;
    Ok(())
}

/// Deletes every expired session and returns how many went.
pub async fn purge_expired_sessions(pool: &SqlitePool) -> Result<u64, AppError> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires <= ?")
        .bind(Utc::now())
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// Spawns a task that purges expired sessions every `period`.
///
/// `load_session` already ignores expired rows; this only keeps abandoned ones from
/// piling up.
pub fn start_session_cleanup(pool: SqlitePool, period: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match purge_expired_sessions(&pool).await {
                Ok(0) => {}
                Ok(purged) => log::debug!("Purged {} expired sessions", purged),
                Err(e) => log::warn!("Session cleanup failed: {}", e),
            }
        }
    });
}

pub fn session_cookie(session_key: String, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, session_key)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(CookieDuration::days(SESSION_AGE_DAYS))
        .finish()
}

/// A cookie that tells the client to forget its session.
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .finish();
    cookie.make_removal();
    cookie
}
