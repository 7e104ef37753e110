use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::api::handlers::caller_email;
use crate::api::AppState;
use crate::auth::AuthContext;
use crate::db::{catalog, ratings};
use crate::error::{AppError, AppResult};
use crate::models::{ItemFilter, Pagination};

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_PER_PAGE: i64 = 20;

#[derive(Debug, Deserialize)]
pub struct ListingsQuery {
    #[serde(rename = "type", default)]
    item_type: Option<String>,
    #[serde(default)]
    search_global: Option<String>,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    page: Option<i64>,
    #[serde(default)]
    per_page: Option<i64>,
}

/// Lists catalog items or the caller's rated items.
///
/// `search_global=true` searches the whole catalog; otherwise only items the
/// caller has rated come back, annotated with their rating. Results are keyed
/// by item kind, with a pagination block per requested kind.
pub async fn list_items(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<ListingsQuery>,
) -> AppResult<Json<Value>> {
    let email = caller_email(&ctx)?;

    let page = params.page.unwrap_or(DEFAULT_PAGE);
    let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE);
    if page < 1 || per_page < 1 {
        return Err(AppError::InvalidInput(
            "Invalid pagination parameters".to_string(),
        ));
    }

    let filter = ItemFilter::parse(params.item_type.as_deref().unwrap_or(""))
        .ok_or_else(|| AppError::InvalidInput("Invalid type filter".to_string()))?;

    let global = params.search_global.as_deref() == Some("true");
    let query = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let mut data = Map::new();
    let mut pagination = Map::new();

    if filter.includes_movies() {
        let (movies, total) = if global {
            let total = catalog::count_movies(&state.db, query).await?;
            let movies = catalog::list_movies(&state.db, query, page, per_page)
                .await?
                .into_iter()
                .map(|m| m.into_listing(None))
                .collect::<Vec<_>>();
            (movies, total)
        } else {
            let total = ratings::count_rated_movies(&state.db, email, query).await?;
            let movies = ratings::list_rated_movies(&state.db, email, query, page, per_page)
                .await?
                .into_iter()
                .map(|r| r.movie.into_listing(Some(r.rating)))
                .collect::<Vec<_>>();
            (movies, total)
        };

        data.insert("movies".to_string(), serde_json::to_value(&movies)?);
        pagination.insert(
            "movies".to_string(),
            serde_json::to_value(Pagination::new(page, per_page, total))?,
        );
    }

    if filter.includes_books() {
        let (books, total) = if global {
            let total = catalog::count_books(&state.db, query).await?;
            let books = catalog::list_books(&state.db, query, page, per_page)
                .await?
                .into_iter()
                .map(|b| b.into_listing(None))
                .collect::<Vec<_>>();
            (books, total)
        } else {
            let total = ratings::count_rated_books(&state.db, email, query).await?;
            let books = ratings::list_rated_books(&state.db, email, query, page, per_page)
                .await?
                .into_iter()
                .map(|r| r.book.into_listing(Some(r.rating)))
                .collect::<Vec<_>>();
            (books, total)
        };

        data.insert("books".to_string(), serde_json::to_value(&books)?);
        pagination.insert(
            "books".to_string(),
            serde_json::to_value(Pagination::new(page, per_page, total))?,
        );
    }

    Ok(Json(json!({
        "status": "success",
        "data": data,
        "pagination": pagination
    })))
}
