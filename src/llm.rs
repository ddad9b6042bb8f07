//! Grounded generation provider abstraction
//!
//! Provides a common interface for the external generation API so the gateway
//! can be driven by a mock in tests.

mod error;
mod factory;
mod gemini;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use factory::{build_client, LlmConfig};
pub use gemini::GeminiService;
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for grounded generation providers
#[async_trait]
pub trait GroundingClient: Send + Sync {
    /// Make a single grounded generation request
    async fn generate(&self, request: &GroundedRequest) -> Result<GroundedResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: GroundingClient + ?Sized> GroundingClient for Arc<T> {
    async fn generate(&self, request: &GroundedRequest) -> Result<GroundedResponse, LlmError> {
        (**self).generate(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper for grounding clients
pub struct LoggingService {
    inner: Arc<dyn GroundingClient>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn GroundingClient>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl GroundingClient for LoggingService {
    async fn generate(&self, request: &GroundedRequest) -> Result<GroundedResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    citations = response.chunks.len(),
                    "Grounded request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = %e.kind,
                    "Grounded request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Stand-in used when no API key is configured; every call fails with an
/// auth error, which the gateway turns into its fallback reply.
pub struct UnconfiguredService {
    model_id: String,
}

impl UnconfiguredService {
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
        }
    }
}

#[async_trait]
impl GroundingClient for UnconfiguredService {
    async fn generate(&self, _request: &GroundedRequest) -> Result<GroundedResponse, LlmError> {
        Err(LlmError::auth("No API key configured"))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
