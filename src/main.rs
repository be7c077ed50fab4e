use actix_web::middleware::{Logger, NormalizePath, TrailingSlash};
use actix_web::{web, App, HttpServer};
use std::io;

use todo_backend::auth::session::{start_session_cleanup, SESSION_CLEANUP_PERIOD};
use todo_backend::auth::SessionMiddleware;
use todo_backend::cors::cors_policy;
use todo_backend::csrf::CsrfMiddleware;
use todo_backend::{db, routes, Config};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env()?;
    let pool = db::init(&config.database_url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Database setup failed: {}", e)))?;

    log::info!("Starting todo backend at {}", config.server_url());
    if config.scope_todos_to_user {
        log::info!("Todos are scoped to the logged-in user");
    }

    start_session_cleanup(pool.clone(), SESSION_CLEANUP_PERIOD);

    let bind_addr = (config.server_host.clone(), config.server_port);
    let pool = web::Data::new(pool);
    let config = web::Data::new(config);

    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(config.clone())
            // Innermost first: CSRF needs the session resolved before it runs.
            .wrap(CsrfMiddleware)
            .wrap(SessionMiddleware)
            .wrap(NormalizePath::new(TrailingSlash::Always))
            .wrap(Logger::default())
            .wrap(cors_policy(&config))
            .configure(routes::config)
    })
    .bind(bind_addr)?
    .run()
    .await
}
