//! Response gateway
//!
//! Turns one chat message into one grounded provider request and normalizes
//! the result into display text plus citation sources. Provider and location
//! failures are both collapsed into the same fallback reply here: callers
//! cannot tell them apart, and nothing above this module ever sees an error.

use crate::llm::{GroundedRequest, GroundingChunk, GroundingClient, LlmError, RetrievalTool};
use crate::location::{resolve_location, Location, LocationError, LocationProvider};
use crate::persona::{EMPTY_RESPONSE_TEXT, FALLBACK_TEXT, SYSTEM_INSTRUCTION};
use serde::{Deserialize, Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// A citation shown under a model message.
///
/// Serialized with a `label` the widget renders as the link text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    pub uri: String,
    #[serde(default)]
    pub title: Option<String>,
}

impl Source {
    /// Link label; untitled sources show as "Source"
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Source")
    }
}

#[derive(Serialize)]
struct SourceWire<'a> {
    uri: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    label: &'a str,
}

impl Serialize for Source {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SourceWire {
            uri: &self.uri,
            title: self.title.as_deref(),
            label: self.display_title(),
        }
        .serialize(serializer)
    }
}

/// Normalized gateway result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayReply {
    pub text: String,
    pub sources: Vec<Source>,
}

impl GatewayReply {
    pub fn fallback() -> Self {
        Self {
            text: FALLBACK_TEXT.to_string(),
            sources: vec![],
        }
    }
}

/// The two failure kinds absorbed at the gateway boundary
#[derive(Debug, Error)]
enum GatewayError {
    #[error("provider error: {0}")]
    Provider(#[from] LlmError),
    #[error("location error: {0}")]
    Location(#[from] LocationError),
}

impl GatewayError {
    fn kind(&self) -> &'static str {
        match self {
            Self::Provider(e) => e.kind.as_str(),
            Self::Location(_) => "location",
        }
    }
}

/// Gateway bound to one provider client and one location source
pub struct ResponseGateway {
    client: Arc<dyn GroundingClient>,
    locator: Arc<dyn LocationProvider>,
    location_wait: Duration,
}

impl ResponseGateway {
    pub fn new(
        client: Arc<dyn GroundingClient>,
        locator: Arc<dyn LocationProvider>,
        location_wait: Duration,
    ) -> Self {
        Self {
            client,
            locator,
            location_wait,
        }
    }

    /// Answer one message. Never fails; see the module docs.
    pub async fn get_response(&self, message: &str, use_location: bool) -> GatewayReply {
        match self.try_respond(message, use_location).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, kind = e.kind(), "Consultant request failed");
                GatewayReply::fallback()
            }
        }
    }

    async fn try_respond(
        &self,
        message: &str,
        use_location: bool,
    ) -> Result<GatewayReply, GatewayError> {
        let location =
            resolve_location(self.locator.as_ref(), use_location, self.location_wait).await?;
        let request = build_request(message, location);
        let response = self.client.generate(&request).await?;

        Ok(GatewayReply {
            text: response
                .text
                .unwrap_or_else(|| EMPTY_RESPONSE_TEXT.to_string()),
            sources: extract_sources(&response.chunks),
        })
    }
}

/// Persona instruction, the single user turn, both retrieval tools
pub fn build_request(message: &str, location: Location) -> GroundedRequest {
    GroundedRequest {
        system_instruction: SYSTEM_INSTRUCTION.to_string(),
        message: message.to_string(),
        tools: vec![RetrievalTool::WebSearch, RetrievalTool::MapSearch],
        location,
    }
}

/// Map provider citations to sources, keeping provider order and duplicates.
/// Chunks that are neither web nor maps results, or carry no URI, are skipped.
pub fn extract_sources(chunks: &[GroundingChunk]) -> Vec<Source> {
    chunks
        .iter()
        .filter_map(|chunk| match chunk {
            GroundingChunk::Web { uri, title } | GroundingChunk::Maps { uri, title } => {
                uri.as_ref().map(|uri| Source {
                    uri: uri.clone(),
                    title: title.clone(),
                })
            }
            GroundingChunk::Unrecognized => None,
        })
        .collect()
}
