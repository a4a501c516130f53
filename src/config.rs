// src/config.rs

use std::env;
use dotenvy::dotenv;

/// Fallback signing secret for local development only.
pub const DEV_JWT_SECRET: &str = "tenderhub-dev-secret-change-me";

/// Tokens are valid for 7 days.
pub const DEFAULT_JWT_EXPIRATION_SECS: u64 = 7 * 24 * 60 * 60;

/// Maximum decoded size of an uploaded file (5 MB).
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Default and maximum page sizes for list endpoints.
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub port: u16,
    pub upload_dir: String,
    pub cors_origins: Vec<String>,
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://data/tenderhub.db".to_string());

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| DEV_JWT_SECRET.to_string());

        let jwt_expiration = env::var("JWT_EXPIRATION_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_JWT_EXPIRATION_SECS);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);

        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .map(|v| parse_origins(&v))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://127.0.0.1:5173".to_string(),
                ]
            });

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            port,
            upload_dir,
            cors_origins,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
        }
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Reports insecure fallbacks. Must run after the tracing subscriber is installed.
    pub fn log_warnings(&self) {
        if self.uses_dev_secret() {
            tracing::warn!("JWT_SECRET is not set, using the insecure development secret");
        }
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
