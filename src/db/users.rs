use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::User;

/// Looks up a user by email
pub async fn find_by_email(pool: &PgPool, email: &str) -> AppResult<Option<User>> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Fetches the user for the email, creating a fresh record on first login.
///
/// Returns the user and whether this call created it.
pub async fn find_or_create(
    pool: &PgPool,
    email: &str,
    display_name: Option<&str>,
) -> AppResult<(User, bool)> {
    if let Some(user) = find_by_email(pool, email).await? {
        return Ok((user, false));
    }

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (display_name, email) VALUES ($1, $2) RETURNING *",
    )
    .bind(display_name)
    .bind(email)
    .fetch_one(pool)
    .await?;

    tracing::info!(email = %email, "Created new user");
    Ok((user, true))
}

/// Stores the user's age, collected during onboarding
pub async fn update_age(pool: &PgPool, email: &str, age: i32) -> AppResult<bool> {
    let result = sqlx::query("UPDATE users SET age = $1 WHERE email = $2")
        .bind(age)
        .bind(email)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Marks the user's onboarding as finished
pub async fn complete_onboarding(pool: &PgPool, email: &str) -> AppResult<bool> {
    let result = sqlx::query("UPDATE users SET onboarding_completed = TRUE WHERE email = $1")
        .bind(email)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Deletes the user and all of their ratings in one transaction.
///
/// Returns false when no such user exists; nothing is deleted in that case.
pub async fn delete_with_ratings(pool: &PgPool, email: &str) -> AppResult<bool> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM user_movie_ratings WHERE email = $1")
        .bind(email)
        .execute(&mut *tx)
        .await?;

    sqlx::query("DELETE FROM user_book_ratings WHERE email = $1")
        .bind(email)
        .execute(&mut *tx)
        .await?;

    let result = sqlx::query("DELETE FROM users WHERE email = $1")
        .bind(email)
        .execute(&mut *tx)
        .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    tx.commit().await?;
    tracing::info!(email = %email, "Deleted user and associated ratings");
    Ok(true)
}
