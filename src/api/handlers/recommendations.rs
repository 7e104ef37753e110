use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::api::handlers::caller_email;
use crate::api::AppState;
use crate::auth::AuthContext;
use crate::error::{AppError, AppResult};
use crate::models::ItemFilter;
use crate::services::recommendations;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(rename = "type", default)]
    item_type: Option<String>,
}

/// Relays the caller's rating history to the LLM and returns up to ten
/// recommendations. A user with nothing rated gets an empty list without an
/// upstream call.
pub async fn generate(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Json<Value>> {
    let email = caller_email(&ctx)?;

    let filter = ItemFilter::parse(params.item_type.as_deref().unwrap_or(""))
        .ok_or_else(|| AppError::InvalidInput("Invalid type filter".to_string()))?;

    let data =
        recommendations::generate_for_user(&state.db, state.recommender.as_ref(), email, filter)
            .await?;

    Ok(Json(json!({"status": "success", "data": data})))
}
