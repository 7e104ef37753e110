use axum::extract::State;
use axum::{Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};
use time::{Duration, OffsetDateTime};

use crate::api::handlers::caller_email;
use crate::api::AppState;
use crate::auth::{oauth, AuthContext};
use crate::db::{ratings, users};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{authenticate, ACCESS_TOKEN_COOKIE, ID_TOKEN_COOKIE};
use crate::models::UserPayload;

/// Cookie holding the anti-forgery state between login and callback
const OAUTH_STATE_COOKIE: &str = "oauth_state";

/// How long the login state cookie stays valid
const STATE_COOKIE_TTL: Duration = Duration::minutes(10);

/// Ratings of each kind required before onboarding can complete
const REQUIRED_RATINGS: i64 = 3;

/// Inclusive bounds accepted for the user's age
const AGE_MIN: i64 = 1;
const AGE_MAX: i64 = 120;

fn secure_cookie(name: &'static str, value: String) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Starts the OAuth flow: issues the state cookie and the authorize URL
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    let oauth_state = oauth::generate_state();
    let auth_url = oauth::build_authorize_url(&state.config, &oauth_state)?;

    let mut cookie = secure_cookie(OAUTH_STATE_COOKIE, oauth_state);
    cookie.set_max_age(STATE_COOKIE_TTL);

    Ok((jar.add(cookie), Json(json!({"auth_url": auth_url}))))
}

#[derive(Debug, Deserialize)]
pub struct CallbackRequest {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

/// Completes the OAuth flow.
///
/// Verifies the anti-forgery state, exchanges the code, verifies the identity
/// token signature against the provider's published keys, fetches the Graph
/// profile, and upserts the local user. The token cookies expire with the
/// identity token itself.
pub async fn callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<CallbackRequest>,
) -> AppResult<(CookieJar, Json<Value>)> {
    let expected_state = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    match (&expected_state, &payload.state) {
        (Some(expected), Some(received)) if expected == received => {}
        _ => return Err(AppError::InvalidInput("Invalid state parameter".to_string())),
    }

    let code = match payload.code.as_deref() {
        Some(code) if !code.is_empty() => code,
        _ => return Err(AppError::InvalidInput("No code provided".to_string())),
    };

    let tokens = oauth::exchange_code(&state.http_client, &state.config, code).await?;
    let claims = oauth::verify_id_token(&state.signing_keys, &state.config, &tokens.id_token).await?;
    let user_info = oauth::fetch_user_info(&state.http_client, &state.config, &tokens.access_token).await?;

    let email = user_info
        .canonical_email()
        .or_else(|| claims.canonical_email())
        .map(str::to_string)
        .ok_or_else(|| AppError::Upstream("User profile carries no email address".to_string()))?;

    let display_name = user_info
        .display_name
        .as_deref()
        .or(claims.name.as_deref());

    let (user, created) = users::find_or_create(&state.db, &email, display_name).await?;
    let payload = UserPayload::new(&user, claims.is_admin(), created);

    let expiry = OffsetDateTime::from_unix_timestamp(claims.exp)
        .map_err(|e| AppError::Internal(format!("Invalid token expiry: {}", e)))?;

    let mut id_cookie = secure_cookie(ID_TOKEN_COOKIE, tokens.id_token);
    id_cookie.set_expires(expiry);
    let mut access_cookie = secure_cookie(ACCESS_TOKEN_COOKIE, tokens.access_token);
    access_cookie.set_expires(expiry);

    let jar = jar
        .add(id_cookie)
        .add(access_cookie)
        .remove(removal_cookie(OAUTH_STATE_COOKIE));

    Ok((jar, Json(json!({"user": payload}))))
}

/// Clears the session cookies
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar
        .remove(removal_cookie(ID_TOKEN_COOKIE))
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE));

    (jar, Json(json!({"message": "Logged out successfully"})))
}

/// Returns the caller's profile, creating the local user on first access.
///
/// Validates inline instead of going through the user guard so admins can
/// fetch their own profile as well.
pub async fn current_user(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<Json<Value>> {
    let ctx = authenticate(&state, &jar)?;

    let user_info =
        oauth::fetch_user_info(&state.http_client, &state.config, &ctx.access_token).await?;

    let email = user_info
        .canonical_email()
        .or_else(|| ctx.claims.canonical_email())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;

    let display_name = user_info
        .display_name
        .as_deref()
        .or(ctx.claims.name.as_deref());

    let (user, created) = users::find_or_create(&state.db, &email, display_name).await?;
    let payload = UserPayload::new(&user, ctx.claims.is_admin(), created);

    Ok(Json(json!({"user": payload})))
}

/// Stores the caller's age, collected during onboarding
pub async fn set_age(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let email = caller_email(&ctx)?;

    let age = body
        .get("age")
        .and_then(|v| v.as_i64())
        .filter(|a| (AGE_MIN..=AGE_MAX).contains(a))
        .ok_or_else(|| {
            AppError::InvalidInput(format!(
                "Age must be an integer between {} and {}",
                AGE_MIN, AGE_MAX
            ))
        })?;

    if !users::update_age(&state.db, email, age as i32).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Age updated successfully"
    })))
}

/// Reports onboarding progress against the required rating counts
pub async fn onboarding_status(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> AppResult<Json<Value>> {
    let email = caller_email(&ctx)?;

    let user = users::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let (movies, books) = ratings::rating_counts(&state.db, email).await?;

    Ok(Json(json!({
        "onboardingCompleted": user.onboarding_completed,
        "progress": {
            "movies": movies,
            "books": books,
            "required": {
                "movies": REQUIRED_RATINGS,
                "books": REQUIRED_RATINGS
            }
        }
    })))
}

/// Marks onboarding complete once enough ratings exist
pub async fn complete_onboarding(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> AppResult<Json<Value>> {
    let email = caller_email(&ctx)?;

    let (movies, books) = ratings::rating_counts(&state.db, email).await?;
    if movies < REQUIRED_RATINGS || books < REQUIRED_RATINGS {
        return Err(AppError::InvalidInput(format!(
            "At least {} movie and {} book ratings are required to complete onboarding",
            REQUIRED_RATINGS, REQUIRED_RATINGS
        )));
    }

    if !users::complete_onboarding(&state.db, email).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    Ok(Json(json!({
        "status": "success",
        "message": "Onboarding completed"
    })))
}

/// Deletes the caller's account and all of their ratings
pub async fn delete_account(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    let email = caller_email(&ctx)?;

    if !users::delete_with_ratings(&state.db, email).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let jar = jar
        .remove(removal_cookie(ID_TOKEN_COOKIE))
        .remove(removal_cookie(ACCESS_TOKEN_COOKIE));

    Ok((
        jar,
        Json(json!({
            "status": "success",
            "message": "Account deleted successfully"
        })),
    ))
}
