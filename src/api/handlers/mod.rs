use axum::Json;
use serde_json::{json, Value};

use crate::auth::AuthContext;
use crate::error::{AppError, AppResult};
use crate::models::{rating_in_bounds, RATING_MAX, RATING_MIN};

pub mod auth;
pub mod catalog;
pub mod listings;
pub mod recommendations;
pub mod reviews;

/// Health check endpoint
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// Canonical email of the authenticated caller.
///
/// A validated token without any email claim cannot be mapped to a local
/// user, so it is treated as invalid.
pub(crate) fn caller_email(ctx: &AuthContext) -> AppResult<&str> {
    ctx.claims
        .canonical_email()
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))
}

/// Extracts and bounds-checks a rating value from a JSON field
pub(crate) fn require_rating(value: Option<&Value>) -> AppResult<i32> {
    value
        .and_then(|v| v.as_i64())
        .filter(|r| rating_in_bounds(*r))
        .map(|r| r as i32)
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Rating must be an integer between {} and {}",
                RATING_MIN, RATING_MAX
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_rating_accepts_bounds() {
        assert_eq!(require_rating(Some(&json!(1))).unwrap(), 1);
        assert_eq!(require_rating(Some(&json!(5))).unwrap(), 5);
    }

    #[test]
    fn test_require_rating_rejects_bad_values() {
        assert!(require_rating(None).is_err());
        assert!(require_rating(Some(&json!(0))).is_err());
        assert!(require_rating(Some(&json!(6))).is_err());
        assert!(require_rating(Some(&json!(3.5))).is_err());
        assert!(require_rating(Some(&json!("3"))).is_err());
    }
}
