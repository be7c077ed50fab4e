#![allow(dead_code)]

use actix_http::Request;
use actix_web::body::MessageBody;
use actix_web::cookie::Cookie;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::middleware::{Logger, NormalizePath, TrailingSlash};
use actix_web::{test, web, App};
use serde_json::json;
use sqlx::SqlitePool;

use todo_backend::auth::{SessionMiddleware, SESSION_COOKIE};
use todo_backend::csrf::{CsrfMiddleware, CSRF_COOKIE, CSRF_HEADER};
use todo_backend::{db, routes, Config};

pub fn test_config() -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        bcrypt_cost: 4,
        ..Config::default()
    }
}

pub fn scoped_config() -> Config {
    Config {
        scope_todos_to_user: true,
        ..test_config()
    }
}

pub async fn test_pool() -> SqlitePool {
    db::init("sqlite::memory:")
        .await
        .expect("Failed to set up in-memory database")
}

/// Builds the app with the same middleware stack as `main`, minus CORS.
pub async fn init_app(
    pool: SqlitePool,
    config: Config,
) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool))
            .app_data(web::Data::new(config))
            .wrap(CsrfMiddleware)
            .wrap(SessionMiddleware)
            .wrap(NormalizePath::new(TrailingSlash::Always))
            .wrap(Logger::default())
            .configure(routes::config),
    )
    .await
}

pub fn response_cookie<B>(resp: &ServiceResponse<B>, name: &str) -> Option<Cookie<'static>> {
    resp.response()
        .cookies()
        .find(|c| c.name() == name)
        .map(|c| c.into_owned())
}

/// A browser-like client state: CSRF cookie and token, plus a session once logged in.
#[derive(Clone)]
pub struct Client {
    pub csrf_cookie: Cookie<'static>,
    pub csrf_token: String,
    pub session: Option<Cookie<'static>>,
}

impl Client {
    /// Fetches a CSRF token the way the frontend does on startup.
    pub async fn new(
        app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
    ) -> Self {
        let req = test::TestRequest::get().uri("/api/csrf-token/").to_request();
        let resp = test::call_service(app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let csrf_cookie = response_cookie(&resp, CSRF_COOKIE).expect("csrftoken cookie not set");
        let body: serde_json::Value = test::read_body_json(resp).await;
        let csrf_token = body["csrfToken"]
            .as_str()
            .expect("csrfToken missing")
            .to_string();

        Self {
            csrf_cookie,
            csrf_token,
            session: None,
        }
    }

    /// Attaches cookies and the `X-CSRFToken` header.
    pub fn apply(&self, req: test::TestRequest) -> test::TestRequest {
        let req = req
            .cookie(self.csrf_cookie.clone())
            .insert_header((CSRF_HEADER, self.csrf_token.clone()));
        match &self.session {
            Some(session) => req.cookie(session.clone()),
            None => req,
        }
    }

    /// Attaches only the session cookie, as a forged cross-site request would.
    pub fn apply_session_only(&self, req: test::TestRequest) -> test::TestRequest {
        match &self.session {
            Some(session) => req.cookie(session.clone()),
            None => req,
        }
    }

    pub async fn register(
        &self,
        app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
        username: &str,
        password: &str,
    ) -> StatusCode {
        let req = self
            .apply(test::TestRequest::post().uri("/register/"))
            .set_json(json!({ "username": username, "password": password }))
            .to_request();
        test::call_service(app, req).await.status()
    }

    /// Logs in and keeps the session cookie. Panics if the login is refused.
    pub async fn login(
        &mut self,
        app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
        username: &str,
        password: &str,
    ) {
        let req = self
            .apply(test::TestRequest::post().uri("/login/"))
            .set_json(json!({ "username": username, "password": password }))
            .to_request();
        let resp = test::call_service(app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "login for {} failed", username);
        self.session = Some(response_cookie(&resp, SESSION_COOKIE).expect("sessionid not set"));
    }

    /// Registers and logs in a fresh user.
    pub async fn signed_up(
        app: &impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = actix_web::Error>,
        username: &str,
        password: &str,
    ) -> Self {
        let mut client = Self::new(app).await;
        assert_eq!(
            client.register(app, username, password).await,
            StatusCode::CREATED
        );
        client.login(app, username, password).await;
        client
    }
}
