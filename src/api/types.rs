//! API request and response types

use serde::{Deserialize, Serialize};

/// Response for session creation
#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
}

/// Request to open the widget, optionally about a service
#[derive(Debug, Default, Deserialize)]
pub struct OpenRequest {
    #[serde(default)]
    pub topic: Option<String>,
}

/// Request carrying message or input text
#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// Outcome of the browser's geolocation request
#[derive(Debug, Deserialize)]
pub struct LocationReport {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub denied: bool,
}

/// Response for widget commands; dropped sends are still queued
#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub queued: bool,
}

/// Generic success response
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
