use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::auth::{require_admin, require_user};
use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/auth/login", get(handlers::auth::login))
        .route("/api/auth/callback", post(handlers::auth::callback))
        .route("/api/auth/logout", get(handlers::auth::logout))
        // Validates inline so admins can fetch their own profile too
        .route("/api/auth/user", get(handlers::auth::current_user));

    let user = Router::new()
        .route("/api/user/age", post(handlers::auth::set_age))
        .route(
            "/api/auth/onboarding-status",
            get(handlers::auth::onboarding_status),
        )
        .route(
            "/api/auth/complete-onboarding",
            post(handlers::auth::complete_onboarding),
        )
        .route("/api/auth/account", delete(handlers::auth::delete_account))
        .route("/api/listings", get(handlers::listings::list_items))
        .route("/api/reviews", post(handlers::reviews::add_review))
        .route(
            "/api/movies/:id",
            put(handlers::catalog::update_movie_rating)
                .delete(handlers::catalog::delete_movie_rating),
        )
        .route(
            "/api/books/:id",
            put(handlers::catalog::update_book_rating)
                .delete(handlers::catalog::delete_book_rating),
        )
        .route(
            "/api/generate-recommendation",
            get(handlers::recommendations::generate),
        )
        .route_layer(from_fn_with_state(state.clone(), require_user));

    let admin = Router::new()
        .route("/api/movies", post(handlers::catalog::create_movie))
        .route("/api/books", post(handlers::catalog::create_book))
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    public
        .merge(user)
        .merge(admin)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
