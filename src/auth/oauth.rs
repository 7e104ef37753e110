use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Deserialize;

use crate::auth::keys::SigningKeyCache;
use crate::auth::Claims;
use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Length of the random anti-forgery state value
const STATE_LENGTH: usize = 43;

/// Tokens returned by the provider's token endpoint
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub id_token: String,
    pub access_token: String,
}

/// Profile fields fetched from the Graph user-info endpoint
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
}

impl UserInfo {
    /// Primary mail field, falling back to the principal name
    pub fn canonical_email(&self) -> Option<&str> {
        self.mail.as_deref().or(self.user_principal_name.as_deref())
    }
}

/// Generates a cryptographically random anti-forgery state value
pub fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LENGTH)
        .map(char::from)
        .collect()
}

/// Builds the provider's authorization URL for the login redirect
pub fn build_authorize_url(config: &Config, state: &str) -> AppResult<String> {
    let url = reqwest::Url::parse_with_params(
        &config.authorize_endpoint(),
        &[
            ("client_id", config.microsoft_client_id.as_str()),
            ("response_type", "code"),
            ("redirect_uri", config.microsoft_redirect_uri.as_str()),
            ("scope", config.microsoft_scopes.as_str()),
            ("state", state),
            ("response_mode", "query"),
        ],
    )
    .map_err(|e| AppError::Internal(format!("Failed to build authorization URL: {}", e)))?;

    Ok(url.to_string())
}

/// Exchanges an authorization code for tokens at the provider's token endpoint.
///
/// A provider-reported error (bad code, redirect mismatch, etc.) surfaces as a
/// 400 carrying the provider's error string.
pub async fn exchange_code(
    http_client: &reqwest::Client,
    config: &Config,
    code: &str,
) -> AppResult<TokenResponse> {
    let params = [
        ("client_id", config.microsoft_client_id.as_str()),
        ("client_secret", config.microsoft_client_secret.as_str()),
        ("code", code),
        ("redirect_uri", config.microsoft_redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];

    let response = http_client
        .post(config.token_endpoint())
        .form(&params)
        .send()
        .await?;

    let body: serde_json::Value = response.json().await?;

    if let Some(error) = body.get("error").and_then(|e| e.as_str()) {
        let detail = body
            .get("error_description")
            .and_then(|d| d.as_str())
            .unwrap_or(error);
        tracing::warn!(error = %error, "Token exchange rejected by provider");
        return Err(AppError::InvalidInput(detail.to_string()));
    }

    serde_json::from_value(body)
        .map_err(|e| AppError::Upstream(format!("Unexpected token endpoint response: {}", e)))
}

/// Verifies the identity token's RS256 signature against the provider's
/// published signing keys. Runs once, at callback time.
pub async fn verify_id_token(
    signing_keys: &SigningKeyCache,
    config: &Config,
    id_token: &str,
) -> AppResult<Claims> {
    let header = decode_header(id_token)
        .map_err(|_| AppError::InvalidInput("Invalid token signature".to_string()))?;

    let kid = header
        .kid
        .ok_or_else(|| AppError::InvalidInput("Invalid token signature".to_string()))?;

    let key = signing_keys.decoding_key(&kid).await?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[&config.microsoft_client_id]);

    let data = decode::<Claims>(id_token, &key, &validation).map_err(|e| {
        tracing::warn!(error = %e, "Identity token signature verification failed");
        AppError::InvalidInput("Invalid token signature".to_string())
    })?;

    Ok(data.claims)
}

/// Fetches the caller's profile from the Graph user-info endpoint
pub async fn fetch_user_info(
    http_client: &reqwest::Client,
    config: &Config,
    access_token: &str,
) -> AppResult<UserInfo> {
    let url = format!("{}/v1.0/me", config.graph_api_url);

    let response = http_client
        .get(&url)
        .bearer_auth(access_token)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        return Err(AppError::Upstream(format!(
            "User-info endpoint returned status {}",
            status
        )));
    }

    Ok(response.json::<UserInfo>().await?)
}
