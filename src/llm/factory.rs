//! Provider client construction from configuration

use super::{GeminiService, GroundingClient, LoggingService, UnconfiguredService};
use crate::persona::DEFAULT_MODEL;
use std::sync::Arc;

/// Configuration for the generation provider
#[derive(Debug, Clone, Default)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    /// Proxy base URL; the proxy handles authentication
    pub gateway: Option<String>,
    pub model: Option<String>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok(),
            gateway: std::env::var("LLM_GATEWAY").ok(),
            model: std::env::var("CONSULTANT_MODEL").ok(),
        }
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Whether requests can reach a provider at all
    pub fn is_configured(&self) -> bool {
        self.gateway.is_some() || self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Build the provider client, wrapped with logging.
///
/// Never fails: a missing key or an unbuildable HTTP client yields a client
/// whose every call errors, so the chat widget still answers with its
/// fallback text.
pub fn build_client(config: &LlmConfig) -> Arc<dyn GroundingClient> {
    let model = config.model();

    // In gateway mode, use "implicit" as the API key
    let api_key = if config.gateway.is_some() {
        Some("implicit".to_string())
    } else {
        config.api_key.clone().filter(|k| !k.is_empty())
    };

    let inner: Arc<dyn GroundingClient> = match api_key {
        Some(key) => match GeminiService::new(key, model, config.gateway.as_deref()) {
            Ok(service) => Arc::new(service),
            Err(e) => {
                tracing::error!(error = %e, "Failed to create provider client");
                Arc::new(UnconfiguredService::new(model))
            }
        },
        None => Arc::new(UnconfiguredService::new(model)),
    };

    Arc::new(LoggingService::new(inner))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_model() {
        let config = LlmConfig::default();
        assert_eq!(config.model(), "gemini-2.5-flash");
        assert!(!config.is_configured());
    }

    #[test]
    fn test_empty_key_is_not_configured() {
        let config = LlmConfig {
            api_key: Some(String::new()),
            ..Default::default()
        };
        assert!(!config.is_configured());
    }

    #[test]
    fn test_gateway_counts_as_configured() {
        let config = LlmConfig {
            gateway: Some("http://gw.local".to_string()),
            model: Some("gemini-2.5-pro".to_string()),
            ..Default::default()
        };
        assert!(config.is_configured());
        assert_eq!(build_client(&config).model_id(), "gemini-2.5-pro");
    }

    #[tokio::test]
    async fn test_unconfigured_client_fails_with_auth() {
        use crate::llm::{GroundedRequest, LlmErrorKind};
        use crate::persona::HOME_LOCATION;

        let client = build_client(&LlmConfig::default());
        let err = client
            .generate(&GroundedRequest {
                system_instruction: String::new(),
                message: "hi".to_string(),
                tools: vec![],
                location: HOME_LOCATION,
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Auth);
    }
}
