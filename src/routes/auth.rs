use crate::{
    auth::{
        hash_password,
        session::{create_session, delete_session, removal_cookie, session_cookie},
        verify_password, LoginRequest, MessageResponse, RegisterRequest, SESSION_COOKIE,
    },
    config::Config,
    error::AppError,
    models::User,
};
use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

const USERNAME_TAKEN: &str = "Username already exists";

/// Register a new user
///
/// Stores the user with a bcrypt hash of the password. Responds `201 Created` with an
/// empty body; the client logs in separately.
#[post("/register/")]
pub async fn register(
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    register_data: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let register_data = register_data.into_inner().normalized();
    register_data.validate()?;

    let existing_user: Option<(i64,)> = sqlx::query_as("SELECT id FROM users WHERE username = ?")
        .bind(&register_data.username)
        .fetch_optional(&**pool)
        .await?;

    if existing_user.is_some() {
        return Err(AppError::BadRequest(USERNAME_TAKEN.into()));
    }

    let password = register_data.password;
    let cost = config.bcrypt_cost;
    let password_hash = web::block(move || hash_password(&password, cost)).await??;

    let inserted = sqlx::query(
        "INSERT INTO users (username, email, password_hash, date_joined) VALUES (?, ?, ?, ?)",
    )
    .bind(&register_data.username)
    .bind(register_data.email.unwrap_or_default())
    .bind(password_hash)
    .bind(Utc::now())
    .execute(&**pool)
    .await;

    match inserted {
        Ok(_) => {}
        // Lost a race with a concurrent signup for the same name.
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(AppError::BadRequest(USERNAME_TAKEN.into()));
        }
        Err(e) => return Err(e.into()),
    }

    log::info!("Registered user {}", register_data.username);
    Ok(HttpResponse::Created().finish())
}

/// Login user
///
/// Checks the credentials and opens a session, delivered in the `sessionid` cookie.
/// Unknown usernames, wrong passwords and missing fields all answer
/// `400 {"error": "Invalid credentials"}`.
#[post("/login/")]
pub async fn login(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
    login_data: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { username, password } = login_data.into_inner();

    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, date_joined FROM users WHERE username = ?",
    )
    .bind(&username)
    .fetch_optional(&**pool)
    .await?;

    let authenticated = match user {
        Some(user) => {
            let User { id, password_hash, .. } = user;
            let matches = web::block(move || verify_password(&password, &password_hash)).await??;
            matches.then_some(id)
        }
        None => {
            // Spend the same hashing time as a real check.
            let cost = config.bcrypt_cost;
            web::block(move || hash_password(&password, cost)).await??;
            None
        }
    };

    let user_id = match authenticated {
        Some(user_id) => user_id,
        None => {
            log::warn!("Failed login attempt for username {:?}", username);
            return Err(AppError::InvalidCredentials);
        }
    };

    // A new login never reuses the previous session key.
    if let Some(previous) = req.cookie(SESSION_COOKIE) {
        delete_session(&pool, previous.value()).await?;
    }
    let session_key = create_session(&pool, user_id).await?;

    log::info!("User {} logged in", username);
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(session_key, config.secure_cookies))
        .json(MessageResponse::new("Login successful")))
}

/// Logout user
///
/// Ends the caller's session, if any, and clears the cookie.
#[post("/logout/")]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<SqlitePool>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    if let Some(cookie) = req.cookie(SESSION_COOKIE) {
        delete_session(&pool, cookie.value()).await?;
    }

    Ok(HttpResponse::Ok()
        .cookie(removal_cookie(config.secure_cookies))
        .json(MessageResponse::new("Logout successful")))
}
