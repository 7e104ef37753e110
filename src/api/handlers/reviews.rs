use axum::extract::State;
use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::api::handlers::{caller_email, require_rating};
use crate::api::AppState;
use crate::auth::AuthContext;
use crate::db::ratings;
use crate::error::{AppError, AppResult};
use crate::models::ItemType;

/// Records a new rating for a catalog item.
///
/// Field presence, item type, and rating bounds are checked in that order;
/// bounds are validated before the duplicate check so an out-of-range rating
/// on an already-rated item reports the rating problem.
pub async fn add_review(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let email = caller_email(&ctx)?;

    let item_id = body.get("itemId").and_then(|v| v.as_i64());
    let item_type = body.get("itemType").and_then(|v| v.as_str());
    let rating = body.get("rating");

    let (item_id, item_type) = match (item_id, item_type, rating) {
        (Some(id), Some(kind), Some(_)) => (id, kind),
        _ => {
            return Err(AppError::InvalidInput(
                "Missing required fields".to_string(),
            ))
        }
    };

    let item_type = ItemType::parse(item_type)
        .ok_or_else(|| AppError::InvalidInput("Invalid item type specified".to_string()))?;

    let rating = require_rating(rating)?;

    let label = item_type.label();

    let row = match item_type {
        ItemType::Movie => {
            if ratings::find_movie_rating(&state.db, email, item_id).await?.is_some() {
                return Err(AppError::Duplicate(format!(
                    "{} is already present in the database for this user. Cannot enter again.",
                    label
                )));
            }

            serde_json::to_value(
                ratings::insert_movie_rating(&state.db, email, item_id, rating).await?,
            )?
        }
        ItemType::Book => {
            if ratings::find_book_rating(&state.db, email, item_id).await?.is_some() {
                return Err(AppError::Duplicate(format!(
                    "{} is already present in the database for this user. Cannot enter again.",
                    label
                )));
            }

            serde_json::to_value(
                ratings::insert_book_rating(&state.db, email, item_id, rating).await?,
            )?
        }
    };

    Ok(Json(json!({
        "status": "success",
        "message": format!("{} review added successfully", label),
        "data": row
    })))
}
