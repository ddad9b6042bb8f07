//! Common types for grounded generation

use crate::location::Location;

/// Retrieval tools the provider may use to ground an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalTool {
    WebSearch,
    MapSearch,
}

/// Single-turn grounded generation request
#[derive(Debug, Clone)]
pub struct GroundedRequest {
    pub system_instruction: String,
    pub message: String,
    pub tools: Vec<RetrievalTool>,
    /// Anchor for map retrieval
    pub location: Location,
}

/// One citation entry as the provider tagged it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroundingChunk {
    Web {
        uri: Option<String>,
        title: Option<String>,
    },
    Maps {
        uri: Option<String>,
        title: Option<String>,
    },
    /// Any other chunk shape (e.g. retrieved context)
    Unrecognized,
}

/// Provider result before normalization
#[derive(Debug, Clone, Default)]
pub struct GroundedResponse {
    /// Primary text output, `None` when the provider produced none
    pub text: Option<String>,
    /// Citation list in provider order
    pub chunks: Vec<GroundingChunk>,
    pub usage: Usage,
}

/// Usage statistics
#[derive(Debug, Clone, Copy, Default)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}
