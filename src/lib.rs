//! custodia: authentication and role-based access control backend.
//!
//! Issues JWTs, hashes credentials with bcrypt, and manages the
//! users / roles / permissions graph over a REST API.

pub mod app;
pub mod auth;
pub mod config;
pub mod controllers;
pub mod db;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod migrations;
pub mod models;
pub mod openapi;
pub mod response;
pub mod services;
pub mod testing;

pub use app::App;
pub use config::Config;
pub use error::ApiError;
pub use response::{ApiResponse, Paginated};
pub use testing::{TestApp, TestClient, TestResponse};
