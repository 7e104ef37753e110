use crate::error::AppResult;

pub mod gemini;

/// Trait for LLM recommendation backends
///
/// The relay only needs one operation: send an assembled prompt, get the raw
/// model text back. Parsing and truncation happen on our side so providers
/// stay thin.
#[async_trait::async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Sends the prompt and returns the model's raw text response
    async fn generate(&self, prompt: &str) -> AppResult<String>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
