// src/config.rs

use std::env;
use dotenvy::dotenv;

use crate::error::AppError;

/// Shown when a resource has no generated exercises yet.
pub const NO_EXERCISES_MESSAGE: &str =
    "No exercises available for this lesson. Go back and generate the exercises again.";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without one the service keeps everything in memory.
    pub database_url: Option<String>,
    /// Verifies bearer tokens; issuing them is another service's job.
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::InternalServerError("JWT_SECRET must be set".to_string()))?;

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            rust_log,
            bind_addr,
        })
    }
}
