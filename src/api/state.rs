use std::sync::Arc;

use sqlx::PgPool;

#[cfg(feature = "test-support")]
use crate::auth::AuthContext;
use crate::auth::keys::SigningKeyCache;
use crate::config::Config;
use crate::services::providers::RecommendationProvider;

/// Shared application state
///
/// Everything here is cheap to clone: the pool and HTTP client are handles,
/// the rest sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub http_client: reqwest::Client,
    pub config: Arc<Config>,
    pub signing_keys: Arc<SigningKeyCache>,
    pub recommender: Arc<dyn RecommendationProvider>,
    /// Fixed identity that bypasses token validation in integration tests
    #[cfg(feature = "test-support")]
    pub test_identity: Option<AuthContext>,
}

impl AppState {
    pub fn new(db: PgPool, config: Config, recommender: Arc<dyn RecommendationProvider>) -> Self {
        let http_client = reqwest::Client::new();
        let signing_keys = Arc::new(SigningKeyCache::new(
            http_client.clone(),
            config.discovery_url(),
        ));

        Self {
            db,
            http_client,
            config: Arc::new(config),
            signing_keys,
            recommender,
            #[cfg(feature = "test-support")]
            test_identity: None,
        }
    }

    #[cfg(feature = "test-support")]
    pub fn with_test_identity(mut self, identity: AuthContext) -> Self {
        self.test_identity = Some(identity);
        self
    }
}
