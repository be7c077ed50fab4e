use std::env;
use std::io;
use std::str::FromStr;

/// Runtime settings, read from the environment (and `.env` via `dotenv` in `main`).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// Restrict every todo operation to the todos of the logged-in user.
    pub scope_todos_to_user: bool,
    /// Verify `X-CSRFToken` on unsafe requests that need it.
    pub csrf_protection: bool,
    /// Mark the session and CSRF cookies `Secure`.
    pub secure_cookies: bool,
    pub bcrypt_cost: u32,
    /// Single origin allowed to make credentialed cross-origin requests; none when unset.
    pub cors_allowed_origin: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://todo.db".to_string(),
            server_port: 8000,
            server_host: "127.0.0.1".to_string(),
            scope_todos_to_user: false,
            csrf_protection: true,
            secure_cookies: false,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            cors_allowed_origin: None,
        }
    }
}

impl Config {
    pub fn from_env() -> io::Result<Self> {
        let defaults = Self::default();
        let bcrypt_cost = parse_var("BCRYPT_COST", defaults.bcrypt_cost)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(invalid("BCRYPT_COST", "must be between 4 and 31"));
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            server_port: parse_var("SERVER_PORT", defaults.server_port)?,
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            scope_todos_to_user: parse_var("SCOPE_TODOS_TO_USER", defaults.scope_todos_to_user)?,
            csrf_protection: parse_var("CSRF_PROTECTION", defaults.csrf_protection)?,
            secure_cookies: parse_var("SECURE_COOKIES", defaults.secure_cookies)?,
            bcrypt_cost,
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|origin| !origin.is_empty()),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> io::Result<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(name, &format!("cannot parse {:?}", raw))),
        Err(_) => Ok(default),
    }
}

fn invalid(name: &str, reason: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, format!("{}: {}", name, reason))
}
