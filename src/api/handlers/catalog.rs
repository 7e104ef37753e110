use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use chrono::NaiveDate;
use serde_json::{json, Value};

use crate::api::handlers::{caller_email, require_rating};
use crate::api::AppState;
use crate::auth::AuthContext;
use crate::db::{catalog, ratings};
use crate::error::{AppError, AppResult};
use crate::models::{Book, Movie};

const MISSING_RATING_MSG: &str = "No matching entry found for this user and item";

/// Updates the caller's rating of a movie
pub async fn update_movie_rating(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let email = caller_email(&ctx)?;
    let rating = require_rating(body.get("user_rating"))?;

    if !ratings::update_movie_rating(&state.db, email, id, rating).await? {
        return Err(AppError::NotFound(MISSING_RATING_MSG.to_string()));
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Rating updated successfully"
    })))
}

/// Updates the caller's rating of a book
pub async fn update_book_rating(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(isbn): Path<i64>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let email = caller_email(&ctx)?;
    let rating = require_rating(body.get("user_rating"))?;

    if !ratings::update_book_rating(&state.db, email, isbn, rating).await? {
        return Err(AppError::NotFound(MISSING_RATING_MSG.to_string()));
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Rating updated successfully"
    })))
}

/// Removes a movie from the caller's rated list
pub async fn delete_movie_rating(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let email = caller_email(&ctx)?;

    if !ratings::delete_movie_rating(&state.db, email, id).await? {
        return Err(AppError::NotFound(MISSING_RATING_MSG.to_string()));
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Movie removed successfully"
    })))
}

/// Removes a book from the caller's rated list
pub async fn delete_book_rating(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(isbn): Path<i64>,
) -> AppResult<Json<Value>> {
    let email = caller_email(&ctx)?;

    if !ratings::delete_book_rating(&state.db, email, isbn).await? {
        return Err(AppError::NotFound(MISSING_RATING_MSG.to_string()));
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Book removed successfully"
    })))
}

fn required_string(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn missing_fields() -> AppError {
    AppError::InvalidInput("Missing required fields".to_string())
}

/// Adds a movie to the catalog (admin only).
///
/// The id comes from the external movie database, so it is part of the
/// payload rather than generated here. Every descriptive field is required;
/// the catalog never holds partially-described entries.
pub async fn create_movie(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let id = body.get("id").and_then(|v| v.as_i64()).ok_or_else(missing_fields)?;
    let title = required_string(&body, "title").ok_or_else(missing_fields)?;
    let release_date_raw = required_string(&body, "release_date").ok_or_else(missing_fields)?;
    let original_language =
        required_string(&body, "original_language").ok_or_else(missing_fields)?;
    let genres = required_string(&body, "genres").ok_or_else(missing_fields)?;
    let cast_members = required_string(&body, "cast").ok_or_else(missing_fields)?;
    let director = required_string(&body, "director").ok_or_else(missing_fields)?;
    let poster_path = required_string(&body, "poster_path").ok_or_else(missing_fields)?;

    let release_date = NaiveDate::parse_from_str(&release_date_raw, "%Y-%m-%d").map_err(|_| {
        AppError::InvalidInput("Invalid release date format. Expected YYYY-MM-DD".to_string())
    })?;

    let movie = Movie {
        id,
        title,
        release_date: Some(release_date),
        original_language: Some(original_language),
        genres: Some(genres),
        cast_members: Some(cast_members),
        director: Some(director),
        poster_path: Some(poster_path),
    };

    let inserted = catalog::insert_movie(&state.db, &movie).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"status": "success", "data": inserted})),
    ))
}

/// Adds a book to the catalog (admin only). All fields are required.
pub async fn create_book(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let isbn = body.get("isbn").and_then(|v| v.as_i64()).ok_or_else(missing_fields)?;
    let title = required_string(&body, "title").ok_or_else(missing_fields)?;
    let author = required_string(&body, "author").ok_or_else(missing_fields)?;
    let publication_year = body
        .get("publication_year")
        .and_then(|v| v.as_i64())
        .ok_or_else(missing_fields)?;
    let image_url = required_string(&body, "image_url").ok_or_else(missing_fields)?;

    let book = Book {
        isbn,
        title,
        author,
        publication_year: Some(publication_year as i32),
        image_url: Some(image_url),
    };

    let inserted = catalog::insert_book(&state.db, &book).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({"status": "success", "data": inserted})),
    ))
}
