// src/services/rating.rs

use sqlx::SqliteConnection;

/// Integer mean of 1..5 ratings, rounding halves up (4.5 -> 5). Zero for no ratings.
pub fn rounded_mean(ratings: &[i64]) -> i64 {
    if ratings.is_empty() {
        return 0;
    }
    let n = ratings.len() as i64;
    let sum: i64 = ratings.iter().sum();
    (2 * sum + n) / (2 * n)
}

/// Recomputes `users.rating` from every review the user has received.
/// Returns the new rating.
pub async fn update_user_rating(
    conn: &mut SqliteConnection,
    user_id: i64,
) -> Result<i64, sqlx::Error> {
    let ratings: Vec<i64> =
        sqlx::query_scalar("SELECT rating FROM reviews WHERE reviewee_id = ?")
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

    let rating = rounded_mean(&ratings);

    sqlx::query("UPDATE users SET rating = ? WHERE id = ?")
        .bind(rating)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    tracing::debug!(
        "User {} rating recomputed from {} reviews: {}",
        user_id,
        ratings.len(),
        rating
    );

    Ok(rating)
}
