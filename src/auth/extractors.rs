use actix_web::dev::Payload;
use actix_web::{web, Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::auth::session::SessionUser;
use crate::config::Config;
use crate::error::AppError;

const NOT_AUTHENTICATED: &str = "Authentication credentials were not provided.";

fn session_user(req: &HttpRequest) -> Option<SessionUser> {
    req.extensions().get::<SessionUser>().copied()
}

/// Which todos the current request may see.
///
/// With `scope_todos_to_user` off every caller sees every todo. With it on the
/// caller must be logged in and only sees their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoScope {
    All,
    Owner(i64),
}

impl TodoScope {
    /// The owner to filter and stamp todos with, if any.
    pub fn owner(&self) -> Option<i64> {
        match self {
            TodoScope::All => None,
            TodoScope::Owner(user_id) => Some(*user_id),
        }
    }
}

impl FromRequest for TodoScope {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let scoped = req
            .app_data::<web::Data<Config>>()
            .map(|config| config.scope_todos_to_user)
            .unwrap_or(false);

        if !scoped {
            return ready(Ok(TodoScope::All));
        }

        match session_user(req) {
            Some(user) => ready(Ok(TodoScope::Owner(user.user_id))),
            None => ready(Err(AppError::Unauthorized(NOT_AUTHENTICATED.into()).into())),
        }
    }
}
