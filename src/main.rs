use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use reelshelf_api::api::{create_router, AppState};
use reelshelf_api::config::Config;
use reelshelf_api::db;
use reelshelf_api::services::providers::gemini::GeminiProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    tracing::info!("Database ready");

    let recommender = Arc::new(GeminiProvider::new(
        reqwest::Client::new(),
        config.llm_api_key.clone(),
        config.llm_api_url.clone(),
        config.llm_model.clone(),
    ));

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(pool, config, recommender);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
