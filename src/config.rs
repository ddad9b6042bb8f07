//! Environment-driven configuration, read once at startup

use crate::llm::LlmConfig;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_GEOLOCATION_TIMEOUT_MS: u64 = 5000;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// Server configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub port: u16,
    /// Bounded wait for a device position
    pub geolocation_timeout: Duration,
    /// Sessions untouched this long, with no open stream, are dropped
    pub session_idle_timeout: Duration,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("CONSULTANT_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let timeout_ms = lookup("GEOLOCATION_TIMEOUT_MS")
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_GEOLOCATION_TIMEOUT_MS);

        let idle_secs = lookup("SESSION_IDLE_TIMEOUT_SECS")
            .and_then(|t| t.parse().ok())
            .unwrap_or(DEFAULT_SESSION_IDLE_SECS);

        Self {
            llm: LlmConfig {
                api_key: lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY")),
                gateway: lookup("LLM_GATEWAY"),
                model: lookup("CONSULTANT_MODEL"),
            },
            port,
            geolocation_timeout: Duration::from_millis(timeout_ms),
            session_idle_timeout: Duration::from_secs(idle_secs),
        }
    }
}
