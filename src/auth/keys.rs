use std::collections::HashMap;

use jsonwebtoken::DecodingKey;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::{AppError, AppResult};

/// OpenID discovery document, reduced to the field we use
#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    jwks_uri: String,
}

/// A single RSA key from the provider's JWKS endpoint
#[derive(Debug, Clone, Deserialize)]
struct JsonWebKey {
    kid: String,
    #[serde(default)]
    kty: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JsonWebKey>,
}

/// In-process cache of the identity provider's published signing keys.
///
/// Keys rotate, so a lookup miss triggers one refetch through the discovery
/// document before failing. Redundant refreshes across concurrent requests
/// are harmless; the map is simply replaced.
pub struct SigningKeyCache {
    http_client: reqwest::Client,
    discovery_url: String,
    keys: RwLock<HashMap<String, JsonWebKey>>,
}

impl SigningKeyCache {
    pub fn new(http_client: reqwest::Client, discovery_url: String) -> Self {
        Self {
            http_client,
            discovery_url,
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the decoding key for the given key id, refreshing the cache
    /// once on a miss.
    pub async fn decoding_key(&self, kid: &str) -> AppResult<DecodingKey> {
        if let Some(key) = self.lookup(kid).await {
            return Self::to_decoding_key(&key);
        }

        self.refresh().await?;

        match self.lookup(kid).await {
            Some(key) => Self::to_decoding_key(&key),
            None => Err(AppError::KeyFetch(format!(
                "No signing key published for key id {}",
                kid
            ))),
        }
    }

    async fn lookup(&self, kid: &str) -> Option<JsonWebKey> {
        self.keys.read().await.get(kid).cloned()
    }

    fn to_decoding_key(key: &JsonWebKey) -> AppResult<DecodingKey> {
        DecodingKey::from_rsa_components(&key.n, &key.e)
            .map_err(|e| AppError::KeyFetch(format!("Malformed signing key: {}", e)))
    }

    /// Fetches the discovery document, then the JWKS it points at, and
    /// replaces the cached key map.
    async fn refresh(&self) -> AppResult<()> {
        let discovery: DiscoveryDocument = self
            .fetch_json(&self.discovery_url)
            .await
            .map_err(|e| AppError::KeyFetch(format!("discovery document: {}", e)))?;

        let jwks: JwksResponse = self
            .fetch_json(&discovery.jwks_uri)
            .await
            .map_err(|e| AppError::KeyFetch(format!("JWKS endpoint: {}", e)))?;

        let keys: HashMap<String, JsonWebKey> = jwks
            .keys
            .into_iter()
            .filter(|k| k.kty.is_empty() || k.kty == "RSA")
            .map(|k| (k.kid.clone(), k))
            .collect();

        tracing::info!(keys = keys.len(), "Refreshed provider signing keys");

        *self.keys.write().await = keys;
        Ok(())
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, String> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("status {}", response.status()));
        }

        response.json::<T>().await.map_err(|e| e.to_string())
    }

    #[cfg(test)]
    async fn insert(&self, kid: &str, n: &str, e: &str) {
        self.keys.write().await.insert(
            kid.to_string(),
            JsonWebKey {
                kid: kid.to_string(),
                kty: "RSA".to_string(),
                n: n.to_string(),
                e: e.to_string(),
            },
        );
    }
}
