//! Google Gemini provider implementation
//!
//! Issues one `generateContent` call per request with the Google Search and
//! Google Maps grounding tools enabled and the caller location passed as the
//! retrieval anchor.

use super::types::{GroundedRequest, GroundedResponse, GroundingChunk, RetrievalTool, Usage};
use super::{GroundingClient, LlmError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Gemini service implementation
pub struct GeminiService {
    client: Client,
    api_key: String,
    base_url: String,
    model_id: String,
}

impl GeminiService {
    pub fn new(api_key: String, model: &str, gateway: Option<&str>) -> Result<Self, LlmError> {
        let base_url = match gateway {
            Some(gw) => format!(
                "{}/gemini/v1beta/models/{model}:generateContent",
                gw.trim_end_matches('/'),
            ),
            None => format!(
                "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent"
            ),
        };

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model_id: model.to_string(),
        })
    }

    fn translate_request(request: &GroundedRequest) -> GeminiRequest {
        let system_instruction = (!request.system_instruction.is_empty()).then(|| GeminiContent {
            role: None,
            parts: vec![GeminiPart::text(&request.system_instruction)],
        });

        let tools: Vec<GeminiTool> = request
            .tools
            .iter()
            .map(|tool| match tool {
                RetrievalTool::WebSearch => GeminiTool::GoogleSearch(EmptyConfig {}),
                RetrievalTool::MapSearch => GeminiTool::GoogleMaps(EmptyConfig {}),
            })
            .collect();

        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart::text(&request.message)],
            }],
            system_instruction,
            tool_config: (!tools.is_empty()).then(|| GeminiToolConfig {
                retrieval_config: GeminiRetrievalConfig {
                    lat_lng: GeminiLatLng {
                        latitude: request.location.latitude,
                        longitude: request.location.longitude,
                    },
                },
            }),
            tools,
        }
    }

    fn normalize_response(resp: GeminiResponse) -> GroundedResponse {
        let usage = resp
            .usage_metadata
            .map(|u| Usage {
                input_tokens: u64::from(u.prompt_token_count),
                output_tokens: u64::from(u.candidates_token_count),
            })
            .unwrap_or_default();

        // Only the first candidate is read
        let Some(candidate) = resp.candidates.into_iter().next() else {
            return GroundedResponse {
                text: None,
                chunks: vec![],
                usage,
            };
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text)
            .collect();

        let chunks = candidate
            .grounding_metadata
            .map(|m| m.grounding_chunks)
            .unwrap_or_default()
            .into_iter()
            .map(GeminiGroundingChunk::into_chunk)
            .collect();

        GroundedResponse {
            text: (!text.is_empty()).then_some(text),
            chunks,
            usage,
        }
    }
}

#[async_trait]
impl GroundingClient for GeminiService {
    async fn generate(&self, request: &GroundedRequest) -> Result<GroundedResponse, LlmError> {
        let gemini_request = Self::translate_request(request);

        let mut builder = self.client.post(&self.base_url).json(&gemini_request);
        if self.api_key != "implicit" {
            // Header rather than query string so the key never shows up in URLs
            builder = builder.header(API_KEY_HEADER, &self.api_key);
        }

        let response = builder.send().await.map_err(|e| {
            let e = e.without_url();
            if e.is_timeout() {
                LlmError::network(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                LlmError::network(format!("Connection failed: {e}"))
            } else {
                LlmError::unknown(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                LlmError::network(format!("Failed to read response: {}", e.without_url()))
            })?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::malformed(format!("Failed to parse response: {e}")))?;

        Ok(Self::normalize_response(gemini_response))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

fn classify_error(status: u16, body: &str) -> LlmError {
    let Ok(error_resp) = serde_json::from_str::<GeminiErrorResponse>(body) else {
        return LlmError::unknown(format!("HTTP {status} error: {body}"));
    };
    let message = error_resp.error.message;
    match status {
        400 => LlmError::invalid_request(format!("Invalid request: {message}")),
        401 | 403 => LlmError::auth(format!("Authentication failed: {message}")),
        429 => LlmError::rate_limit(format!("Rate limit exceeded: {message}")),
        500..=599 => LlmError::server_error(format!("Server error: {message}")),
        _ => LlmError::unknown(format!("HTTP {status}: {message}")),
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<GeminiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<GeminiToolConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing)]
    thought: bool,
}

impl GeminiPart {
    fn text(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            thought: false,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
enum GeminiTool {
    GoogleSearch(EmptyConfig),
    GoogleMaps(EmptyConfig),
}

#[derive(Debug, Serialize)]
struct EmptyConfig {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiToolConfig {
    retrieval_config: GeminiRetrievalConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRetrievalConfig {
    lat_lng: GeminiLatLng,
}

#[derive(Debug, Serialize)]
struct GeminiLatLng {
    latitude: f64,
    longitude: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    grounding_metadata: Option<GeminiGroundingMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GeminiGroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GeminiGroundingChunk {
    #[serde(default)]
    web: Option<GeminiChunkRef>,
    #[serde(default)]
    maps: Option<GeminiChunkRef>,
}

impl GeminiGroundingChunk {
    fn into_chunk(self) -> GroundingChunk {
        match (self.web, self.maps) {
            (Some(web), _) => GroundingChunk::Web {
                uri: web.uri,
                title: web.title,
            },
            (None, Some(maps)) => GroundingChunk::Maps {
                uri: maps.uri,
                title: maps.title,
            },
            (None, None) => GroundingChunk::Unrecognized,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeminiChunkRef {
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LlmErrorKind;
    use crate::location::Location;
    use serde_json::json;

    fn request() -> GroundedRequest {
        GroundedRequest {
            system_instruction: "be helpful".to_string(),
            message: "Where is your office?".to_string(),
            tools: vec![RetrievalTool::WebSearch, RetrievalTool::MapSearch],
            location: Location {
                latitude: 0.5,
                longitude: 32.0,
            },
        }
    }

    #[test]
    fn test_request_wire_shape() {
        let body = serde_json::to_value(GeminiService::translate_request(&request())).unwrap();
        assert_eq!(
            body,
            json!({
                "contents": [{ "role": "user", "parts": [{ "text": "Where is your office?" }] }],
                "systemInstruction": { "parts": [{ "text": "be helpful" }] },
                "tools": [{ "googleSearch": {} }, { "googleMaps": {} }],
                "toolConfig": {
                    "retrievalConfig": { "latLng": { "latitude": 0.5, "longitude": 32.0 } }
                }
            })
        );
    }

    #[test]
    fn test_normalize_text_and_chunks() {
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [
                    { "text": "thinking...", "thought": true },
                    { "text": "We are in " },
                    { "text": "Kampala." }
                ]},
                "groundingMetadata": { "groundingChunks": [
                    { "web": { "uri": "https://a.com", "title": "A" } },
                    { "retrievedContext": { "uri": "gs://x" } },
                    { "maps": { "uri": "https://maps.x", "title": "Office" } }
                ]}
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 7 }
        }))
        .unwrap();

        let normalized = GeminiService::normalize_response(resp);
        assert_eq!(normalized.text.as_deref(), Some("We are in Kampala."));
        assert_eq!(
            normalized.chunks,
            vec![
                GroundingChunk::Web {
                    uri: Some("https://a.com".to_string()),
                    title: Some("A".to_string()),
                },
                GroundingChunk::Unrecognized,
                GroundingChunk::Maps {
                    uri: Some("https://maps.x".to_string()),
                    title: Some("Office".to_string()),
                },
            ]
        );
        assert_eq!(normalized.usage.input_tokens, 12);
        assert_eq!(normalized.usage.output_tokens, 7);
    }

    #[test]
    fn test_normalize_without_candidates() {
        let resp: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        let normalized = GeminiService::normalize_response(resp);
        assert!(normalized.text.is_none());
        assert!(normalized.chunks.is_empty());
    }

    #[test]
    fn test_normalize_blank_text_is_absent() {
        let resp: GeminiResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [] }, "finishReason": "SAFETY" }]
        }))
        .unwrap();
        assert!(GeminiService::normalize_response(resp).text.is_none());
    }

    #[test]
    fn test_error_classification() {
        let body = r#"{"error":{"message":"API key not valid","code":400,"status":"INVALID_ARGUMENT"}}"#;
        assert_eq!(classify_error(400, body).kind, LlmErrorKind::InvalidRequest);
        assert_eq!(classify_error(403, body).kind, LlmErrorKind::Auth);
        assert_eq!(classify_error(429, body).kind, LlmErrorKind::RateLimit);
        assert_eq!(classify_error(503, body).kind, LlmErrorKind::ServerError);
        assert_eq!(classify_error(502, "<html>").kind, LlmErrorKind::Unknown);
    }

    #[test]
    fn test_gateway_url() {
        let svc = GeminiService::new(
            "implicit".to_string(),
            "gemini-2.5-flash",
            Some("http://gw.local/llm/"),
        )
        .unwrap();
        assert_eq!(
            svc.base_url,
            "http://gw.local/llm/gemini/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(svc.model_id(), "gemini-2.5-flash");
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_key() {
        // Nothing listens on port 1
        let svc = GeminiService::new(
            "SECRET_KEY_123".to_string(),
            "gemini-2.5-flash",
            Some("http://127.0.0.1:1"),
        )
        .unwrap();
        assert!(!svc.base_url.contains("SECRET_KEY_123"));

        let err = svc.generate(&request()).await.unwrap_err();
        assert_eq!(err.kind, LlmErrorKind::Network);
        assert!(!err.message.contains("SECRET_KEY_123"), "{}", err.message);
        assert!(!err.message.contains("key="), "{}", err.message);
    }
}
