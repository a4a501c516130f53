// src/bin/recompute_ratings.rs
//
// Recomputes every user's rating from their reviews. Reviews created through the API already
// keep ratings current; this repairs rows imported or edited by hand.

use tenderhub::{config::Config, db, services::rating};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.rust_log))
        .with(fmt::layer().with_target(false))
        .init();
    config.log_warnings();

    let pool = db::connect(&config.database_url).await?;
    db::migrate(&pool).await?;

    let user_ids: Vec<i64> = sqlx::query_scalar("SELECT id FROM users ORDER BY id")
        .fetch_all(&pool)
        .await?;

    let mut tx = db::begin_write(&pool).await?;
    for user_id in &user_ids {
        rating::update_user_rating(&mut *tx, *user_id).await?;
    }
    tx.commit().await?;

    tracing::info!("Recomputed ratings for {} users", user_ids.len());
    Ok(())
}
