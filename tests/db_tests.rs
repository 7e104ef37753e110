//! Integration tests that exercise the sqlx stores through the full HTTP
//! stack. They run against the database named by `DATABASE_URL` and are
//! skipped when none is configured.

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use reelshelf_api::api::{create_router, AppState};
use reelshelf_api::auth::test_identity;
use reelshelf_api::config::Config;
use reelshelf_api::db::{ratings, run_migrations, users};
use reelshelf_api::error::{AppError, AppResult};
use reelshelf_api::services::providers::RecommendationProvider;

struct SilentProvider;

#[async_trait::async_trait]
impl RecommendationProvider for SilentProvider {
    async fn generate(&self, _prompt: &str) -> AppResult<String> {
        Ok("[]".to_string())
    }

    fn name(&self) -> &'static str {
        "silent"
    }
}

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .ok()?;
    run_migrations(&pool).await.ok()?;
    Some(pool)
}

fn user_server(pool: PgPool, email: &str) -> TestServer {
    let config = envy::from_iter::<_, Config>(std::iter::empty::<(String, String)>())
        .expect("config defaults");
    let state = AppState::new(pool, config, Arc::new(SilentProvider))
        .with_test_identity(test_identity(email, &[]));

    let mut server = TestServer::new(create_router(state)).expect("test server");
    server.save_cookies();
    server
}

/// Each test works on its own user so runs never interfere
fn unique_email(tag: &str) -> String {
    format!("{}-{}@example.com", tag, Uuid::new_v4())
}

#[tokio::test]
async fn test_second_review_for_same_item_rejected() {
    let Some(pool) = test_pool().await else { return };
    let email = unique_email("dup");
    let server = user_server(pool, &email);

    let payload = json!({"itemId": 603, "itemType": "movie", "rating": 4});

    let first = server.post("/api/reviews").json(&payload).await;
    first.assert_status_ok();
    let body: Value = first.json();
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Movie review added successfully");
    assert_eq!(body["data"]["rating"], 4);

    let second = server.post("/api/reviews").json(&payload).await;
    second.assert_status_bad_request();
    second.assert_json(&json!({
        "error": "Movie is already present in the database for this user. Cannot enter again."
    }));
}

#[tokio::test]
async fn test_rating_insert_race_caught_by_constraint() {
    let Some(pool) = test_pool().await else { return };
    let email = unique_email("race");

    // Straight to the store, skipping the handler's pre-check, the way a
    // concurrent second insert would land
    ratings::insert_movie_rating(&pool, &email, 7, 5)
        .await
        .expect("first insert");

    let err = ratings::insert_movie_rating(&pool, &email, 7, 3)
        .await
        .expect_err("duplicate insert");

    assert!(matches!(err, AppError::Duplicate(_)));
    assert_eq!(
        err.to_string(),
        "Movie is already present in the database for this user. Cannot enter again."
    );
}

#[tokio::test]
async fn test_account_deletion_removes_user_and_ratings() {
    let Some(pool) = test_pool().await else { return };
    let email = unique_email("cascade");

    users::find_or_create(&pool, &email, Some("Cascade User"))
        .await
        .expect("create user");
    ratings::insert_movie_rating(&pool, &email, 11, 4)
        .await
        .expect("movie rating");
    ratings::insert_book_rating(&pool, &email, 22, 5)
        .await
        .expect("book rating");

    let server = user_server(pool.clone(), &email);
    let response = server.delete("/api/auth/account").await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "status": "success",
        "message": "Account deleted successfully"
    }));

    assert!(users::find_by_email(&pool, &email)
        .await
        .expect("lookup")
        .is_none());
    assert_eq!(
        ratings::rating_counts(&pool, &email).await.expect("counts"),
        (0, 0)
    );
}

#[tokio::test]
async fn test_onboarding_completes_at_three_of_each() {
    let Some(pool) = test_pool().await else { return };
    let email = unique_email("onboarding");

    users::find_or_create(&pool, &email, None)
        .await
        .expect("create user");
    for movie_id in [1, 2] {
        ratings::insert_movie_rating(&pool, &email, movie_id, 4)
            .await
            .expect("movie rating");
    }
    for isbn in [1, 2, 3] {
        ratings::insert_book_rating(&pool, &email, isbn, 4)
            .await
            .expect("book rating");
    }

    let server = user_server(pool.clone(), &email);

    // Two movies is one short
    let response = server.post("/api/auth/complete-onboarding").await;
    response.assert_status_bad_request();
    response.assert_json(&json!({
        "error": "At least 3 movie and 3 book ratings are required to complete onboarding"
    }));

    ratings::insert_movie_rating(&pool, &email, 3, 5)
        .await
        .expect("third movie rating");

    let response = server.post("/api/auth/complete-onboarding").await;
    response.assert_status_ok();

    let status = server.get("/api/auth/onboarding-status").await;
    status.assert_status_ok();
    let body: Value = status.json();
    assert_eq!(body["onboardingCompleted"], true);
    assert_eq!(body["progress"]["movies"], 3);
    assert_eq!(body["progress"]["books"], 3);
    assert_eq!(body["progress"]["required"], json!({"movies": 3, "books": 3}));
}

#[tokio::test]
async fn test_age_update_persists() {
    let Some(pool) = test_pool().await else { return };
    let email = unique_email("age");

    users::find_or_create(&pool, &email, None)
        .await
        .expect("create user");

    let server = user_server(pool.clone(), &email);
    let response = server.post("/api/user/age").json(&json!({"age": 25})).await;
    response.assert_status_ok();
    response.assert_json(&json!({
        "status": "success",
        "message": "Age updated successfully"
    }));

    let user = users::find_by_email(&pool, &email)
        .await
        .expect("lookup")
        .expect("user exists");
    assert_eq!(user.age, Some(25));
}
