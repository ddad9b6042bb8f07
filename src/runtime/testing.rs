//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::traits::Responder;
use crate::gateway::GatewayReply;
use crate::llm::{GroundedRequest, GroundedResponse, GroundingClient, LlmError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

// ============================================================================
// Mock Grounding Client
// ============================================================================

/// Mock provider client that returns queued responses
pub struct MockGroundingClient {
    responses: Mutex<VecDeque<Result<GroundedResponse, LlmError>>>,
    /// Record of all requests made
    requests: Mutex<Vec<GroundedRequest>>,
}

impl MockGroundingClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful response
    pub fn queue_response(&self, response: GroundedResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<GroundedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GroundingClient for MockGroundingClient {
    async fn generate(&self, request: &GroundedRequest) -> Result<GroundedResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Mock Responder
// ============================================================================

/// Responder that echoes messages, optionally holding each reply until the
/// test releases it
pub struct MockResponder {
    replies: Mutex<VecDeque<GatewayReply>>,
    /// Record of (message, `use_location`) per call
    calls: Mutex<Vec<(String, bool)>>,
    gate: Option<Arc<Semaphore>>,
}

impl MockResponder {
    /// Replies immediately
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Holds every reply until `release` is called
    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::new()
        }
    }

    /// Queue a specific reply; otherwise the message is echoed
    pub fn queue_reply(&self, reply: GatewayReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Let `n` held replies through
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn recorded_calls(&self) -> Vec<(String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn get_response(&self, message: &str, use_location: bool) -> GatewayReply {
        self.calls
            .lock()
            .unwrap()
            .push((message.to_string(), use_location));

        if let Some(gate) = &self.gate {
            gate.acquire().await.unwrap().forget();
        }

        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| GatewayReply {
                text: format!("reply to {message}"),
                sources: vec![],
            })
    }
}
