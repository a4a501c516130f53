// src/main.rs

use std::net::SocketAddr;

use sqlx::SqlitePool;
use tenderhub::config::Config;
use tenderhub::state::AppState;
use tenderhub::utils::hash::hash_password;
use tenderhub::{db, routes};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (.env included)
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    config.log_warnings();

    let pool = db::connect(&config.database_url).await.map_err(|e| {
        tracing::error!("Failed to open database {}: {}", config.database_url, e);
        e
    })?;
    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    db::migrate(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    // Seed Admin User
    if let Err(e) = seed_admin_user(&pool, &config).await {
        tracing::error!("Failed to seed admin user: {:?}", e);
    }

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = AppState {
        pool: pool.clone(),
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}

async fn seed_admin_user(pool: &SqlitePool, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if let (Some(username), Some(password)) = (&config.admin_username, &config.admin_password) {
        let user_exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        if user_exists.is_none() {
            tracing::info!("Seeding admin user: {}", username);
            let hashed_password = hash_password(password)?;
            let email = config
                .admin_email
                .clone()
                .unwrap_or_else(|| format!("{}@localhost", username));

            sqlx::query(
                "INSERT INTO users (username, email, password, user_type, is_admin, is_verified) \
                 VALUES (?, ?, ?, 'individual', 1, 1)",
            )
            .bind(username)
            .bind(email)
            .bind(hashed_password)
            .execute(pool)
            .await?;
            tracing::info!("Admin user created successfully.");
        }
    }
    Ok(())
}
