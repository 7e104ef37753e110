use sqlx::PgPool;

use crate::db::is_unique_violation;
use crate::error::{AppError, AppResult};
use crate::models::{Book, Movie};

/// ILIKE pattern for an optional title search; no query matches everything
fn title_pattern(query: Option<&str>) -> String {
    format!("%{}%", query.unwrap_or(""))
}

pub async fn count_movies(pool: &PgPool, query: Option<&str>) -> AppResult<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM movies WHERE title ILIKE $1")
        .bind(title_pattern(query))
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}

pub async fn list_movies(
    pool: &PgPool,
    query: Option<&str>,
    page: i64,
    per_page: i64,
) -> AppResult<Vec<Movie>> {
    let movies = sqlx::query_as::<_, Movie>(
        "SELECT * FROM movies WHERE title ILIKE $1 ORDER BY title LIMIT $2 OFFSET $3",
    )
    .bind(title_pattern(query))
    .bind(per_page)
    .bind((page - 1) * per_page)
    .fetch_all(pool)
    .await?;

    Ok(movies)
}

pub async fn count_books(pool: &PgPool, query: Option<&str>) -> AppResult<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books WHERE title ILIKE $1")
        .bind(title_pattern(query))
        .fetch_one(pool)
        .await?;

    Ok(count.0)
}

pub async fn list_books(
    pool: &PgPool,
    query: Option<&str>,
    page: i64,
    per_page: i64,
) -> AppResult<Vec<Book>> {
    let books = sqlx::query_as::<_, Book>(
        "SELECT * FROM books WHERE title ILIKE $1 ORDER BY title LIMIT $2 OFFSET $3",
    )
    .bind(title_pattern(query))
    .bind(per_page)
    .bind((page - 1) * per_page)
    .fetch_all(pool)
    .await?;

    Ok(books)
}

/// Inserts an admin-supplied movie. A duplicate id is a client error.
pub async fn insert_movie(pool: &PgPool, movie: &Movie) -> AppResult<Movie> {
    let inserted = sqlx::query_as::<_, Movie>(
        "INSERT INTO movies \
         (id, title, release_date, original_language, genres, cast_members, director, poster_path) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING *",
    )
    .bind(movie.id)
    .bind(&movie.title)
    .bind(movie.release_date)
    .bind(&movie.original_language)
    .bind(&movie.genres)
    .bind(&movie.cast_members)
    .bind(&movie.director)
    .bind(&movie.poster_path)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Duplicate("Movie already exists".to_string())
        } else {
            e.into()
        }
    })?;

    Ok(inserted)
}

/// Inserts an admin-supplied book. A duplicate ISBN is a client error.
pub async fn insert_book(pool: &PgPool, book: &Book) -> AppResult<Book> {
    let inserted = sqlx::query_as::<_, Book>(
        "INSERT INTO books (isbn, title, author, publication_year, image_url) \
         VALUES ($1, $2, $3, $4, $5) RETURNING *",
    )
    .bind(book.isbn)
    .bind(&book.title)
    .bind(&book.author)
    .bind(book.publication_year)
    .bind(&book.image_url)
    .fetch_one(pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Duplicate("Book already exists".to_string())
        } else {
            e.into()
        }
    })?;

    Ok(inserted)
}
