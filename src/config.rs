// src/config.rs

use std::env;
use dotenvy::dotenv;

use crate::error::AppError;

/// Default token lifetime: 7 days.
pub const DEFAULT_JWT_EXPIRATION: u64 = 60 * 60 * 24 * 7;

/// Default passing threshold (percentage) for new quizzes.
pub const DEFAULT_PASSING_SCORE: i32 = 70;

#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection string. `None` runs on the in-memory store.
    pub database_url: Option<String>,
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub admin_name: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.is_empty());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::InternalServerError("JWT_SECRET must be set".to_string()))?;

        let jwt_expiration = parse_var("JWT_EXPIRATION", DEFAULT_JWT_EXPIRATION)?;
        let port = parse_var("PORT", 3000)?;

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            cors_origins,
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            admin_name: env::var("ADMIN_NAME").ok(),
        })
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::InternalServerError(format!("{} has an invalid value", key))),
        Err(_) => Ok(default),
    }
}
