pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::Validate;

// Re-export necessary items
pub use extractors::TodoScope;
pub use middleware::SessionMiddleware;
pub use password::{hash_password, verify_password};
pub use session::{SessionUser, SESSION_COOKIE};

lazy_static! {
    // Letters, digits and @/./+/-/_ only.
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[\w.@+-]+$").unwrap();
}

/// Represents the payload for a login request.
///
/// Missing fields deserialize as empty strings so that they fail as invalid
/// credentials rather than as a malformed body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username. 1 to 150 characters: letters, digits and `@.+-_`.
    #[validate(
        length(min = 1, max = 150),
        regex(
            path = "USERNAME_REGEX",
            message = "Username may contain only letters, digits and @/./+/-/_"
        )
    )]
    pub username: String,
    /// Optional email address. Blank values are treated as absent.
    #[validate(email)]
    pub email: Option<String>,
    /// Password for the new account. Any non-empty value is accepted.
    #[validate(length(min = 1))]
    pub password: String,
}

impl RegisterRequest {
    /// Drops a blank email so it is stored as "no email" instead of failing validation.
    pub fn normalized(mut self) -> Self {
        self.email = self.email.filter(|email| !email.trim().is_empty());
        self
    }
}

/// `{"message": ...}` body used by the auth endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}
