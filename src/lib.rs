#![doc = "The `todo_backend` library crate."]
#![doc = ""]
#![doc = "Signup, login and server-side sessions, CSRF token issuance and verification,"]
#![doc = "and CRUD over todos stored in SQLite. The binary (`main.rs`) wires these"]
#![doc = "modules into an actix-web server."]

pub mod auth;
pub mod config;
pub mod cors;
pub mod csrf;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;

pub use crate::config::Config;
pub use crate::error::AppError;
