use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::db::is_unique_violation;
use crate::error::{AppError, AppResult};
use crate::models::{Book, BookRating, Movie, MovieRating};

/// Cap on the rating history fed into the recommendation prompt
const HISTORY_LIMIT: i64 = 50;

/// A catalog movie joined with the caller's rating of it
#[derive(Debug, FromRow)]
pub struct RatedMovie {
    #[sqlx(flatten)]
    pub movie: Movie,
    pub rating: i32,
}

/// A catalog book joined with the caller's rating of it
#[derive(Debug, FromRow)]
pub struct RatedBook {
    #[sqlx(flatten)]
    pub book: Book,
    pub rating: i32,
}

fn title_pattern(query: Option<&str>) -> String {
    format!("%{}%", query.unwrap_or(""))
}

pub async fn find_movie_rating(
    pool: &PgPool,
    email: &str,
    movie_id: i64,
) -> AppResult<Option<MovieRating>> {
    let rating = sqlx::query_as::<_, MovieRating>(
        "SELECT * FROM user_movie_ratings WHERE email = $1 AND movie_id = $2",
    )
    .bind(email)
    .bind(movie_id)
    .fetch_optional(pool)
    .await?;

    Ok(rating)
}

pub async fn find_book_rating(
    pool: &PgPool,
    email: &str,
    isbn: i64,
) -> AppResult<Option<BookRating>> {
    let rating = sqlx::query_as::<_, BookRating>(
        "SELECT * FROM user_book_ratings WHERE email = $1 AND isbn = $2",
    )
    .bind(email)
    .bind(isbn)
    .fetch_optional(pool)
    .await?;

    Ok(rating)
}

/// Records a movie rating. A second rating for the same movie by the same
/// user is rejected, whether caught by the pre-check in the handler or by
/// the unique constraint under concurrent inserts.
pub async fn insert_movie_rating(
    pool: &PgPool,
    email: &str,
    movie_id: i64,
    rating: i32,
) -> AppResult<MovieRating> {
    let row = sqlx::query_as::<_, MovieRating>(
        "INSERT INTO user_movie_ratings (id, email, movie_id, rating) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(movie_id)
    .bind(rating)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Duplicate(
                "Movie is already present in the database for this user. Cannot enter again."
                    .to_string(),
            )
        } else {
            e.into()
        }
    })?;

    Ok(row)
}

pub async fn insert_book_rating(
    pool: &PgPool,
    email: &str,
    isbn: i64,
    rating: i32,
) -> AppResult<BookRating> {
    let row = sqlx::query_as::<_, BookRating>(
        "INSERT INTO user_book_ratings (id, email, isbn, rating) \
         VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(isbn)
    .bind(rating)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Duplicate(
                "Book is already present in the database for this user. Cannot enter again."
                    .to_string(),
            )
        } else {
            e.into()
        }
    })?;

    Ok(row)
}

/// Updates an existing movie rating; false when the user never rated it
pub async fn update_movie_rating(
    pool: &PgPool,
    email: &str,
    movie_id: i64,
    rating: i32,
) -> AppResult<bool> {
    let result =
        sqlx::query("UPDATE user_movie_ratings SET rating = $1 WHERE email = $2 AND movie_id = $3")
            .bind(rating)
            .bind(email)
            .bind(movie_id)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn update_book_rating(
    pool: &PgPool,
    email: &str,
    isbn: i64,
    rating: i32,
) -> AppResult<bool> {
    let result =
        sqlx::query("UPDATE user_book_ratings SET rating = $1 WHERE email = $2 AND isbn = $3")
            .bind(rating)
            .bind(email)
            .bind(isbn)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_movie_rating(pool: &PgPool, email: &str, movie_id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM user_movie_ratings WHERE email = $1 AND movie_id = $2")
        .bind(email)
        .bind(movie_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete_book_rating(pool: &PgPool, email: &str, isbn: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM user_book_ratings WHERE email = $1 AND isbn = $2")
        .bind(email)
        .bind(isbn)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn count_rated_movies(
    pool: &PgPool,
    email: &str,
    query: Option<&str>,
) -> AppResult<i64> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM user_movie_ratings r \
         JOIN movies m ON m.id = r.movie_id \
         WHERE r.email = $1 AND m.title ILIKE $2",
    )
    .bind(email)
    .bind(title_pattern(query))
    .fetch_one(pool)
    .await?;

    Ok(count.0)
}

pub async fn list_rated_movies(
    pool: &PgPool,
    email: &str,
    query: Option<&str>,
    page: i64,
    per_page: i64,
) -> AppResult<Vec<RatedMovie>> {
    let rows = sqlx::query_as::<_, RatedMovie>(
        "SELECT m.*, r.rating FROM user_movie_ratings r \
         JOIN movies m ON m.id = r.movie_id \
         WHERE r.email = $1 AND m.title ILIKE $2 \
         ORDER BY m.title LIMIT $3 OFFSET $4",
    )
    .bind(email)
    .bind(title_pattern(query))
    .bind(per_page)
    .bind((page - 1) * per_page)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn count_rated_books(pool: &PgPool, email: &str, query: Option<&str>) -> AppResult<i64> {
    let count: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM user_book_ratings r \
         JOIN books b ON b.isbn = r.isbn \
         WHERE r.email = $1 AND b.title ILIKE $2",
    )
    .bind(email)
    .bind(title_pattern(query))
    .fetch_one(pool)
    .await?;

    Ok(count.0)
}

pub async fn list_rated_books(
    pool: &PgPool,
    email: &str,
    query: Option<&str>,
    page: i64,
    per_page: i64,
) -> AppResult<Vec<RatedBook>> {
    let rows = sqlx::query_as::<_, RatedBook>(
        "SELECT b.*, r.rating FROM user_book_ratings r \
         JOIN books b ON b.isbn = r.isbn \
         WHERE r.email = $1 AND b.title ILIKE $2 \
         ORDER BY b.title LIMIT $3 OFFSET $4",
    )
    .bind(email)
    .bind(title_pattern(query))
    .bind(per_page)
    .bind((page - 1) * per_page)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Number of movie and book ratings for the user, used to gate onboarding
pub async fn rating_counts(pool: &PgPool, email: &str) -> AppResult<(i64, i64)> {
    let movies: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_movie_ratings WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await?;

    let books: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_book_ratings WHERE email = $1")
        .bind(email)
        .fetch_one(pool)
        .await?;

    Ok((movies.0, books.0))
}

/// The user's rated movies, highest-rated first and capped, for prompt assembly
pub async fn rated_movie_history(pool: &PgPool, email: &str) -> AppResult<Vec<RatedMovie>> {
    let rows = sqlx::query_as::<_, RatedMovie>(
        "SELECT m.*, r.rating FROM user_movie_ratings r \
         JOIN movies m ON m.id = r.movie_id \
         WHERE r.email = $1 ORDER BY r.rating DESC LIMIT $2",
    )
    .bind(email)
    .bind(HISTORY_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn rated_book_history(pool: &PgPool, email: &str) -> AppResult<Vec<RatedBook>> {
    let rows = sqlx::query_as::<_, RatedBook>(
        "SELECT b.*, r.rating FROM user_book_ratings r \
         JOIN books b ON b.isbn = r.isbn \
         WHERE r.email = $1 ORDER BY r.rating DESC LIMIT $2",
    )
    .bind(email)
    .bind(HISTORY_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
