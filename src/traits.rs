//! Core RequestGateway trait

use async_trait::async_trait;

use crate::{AnswerResult, KeywordResult, RequestOptions, Result, TextResult};

/// The three upstream operations a gateway serves.
///
/// Consumers depend on this trait rather than on [`Gateway`](crate::Gateway)
/// so they can substitute a fake in their own tests.
#[async_trait]
pub trait RequestGateway: Send + Sync {
    /// Extract tiered keywords from `text`.
    ///
    /// Never fails because providers are down: once every provider is
    /// exhausted the result comes from the offline heuristic and is flagged
    /// `degraded`. Cancellation and configuration errors still surface.
    async fn extract(&self, text: &str, options: &RequestOptions) -> Result<KeywordResult>;

    /// Run the named generation template with free-form parameters.
    async fn generate_text(
        &self,
        operation: &str,
        params: &serde_json::Value,
        options: &RequestOptions,
    ) -> Result<TextResult>;

    /// Answer `question` against `context`.
    async fn answer(
        &self,
        question: &str,
        context: &str,
        options: &RequestOptions,
    ) -> Result<AnswerResult>;
}
