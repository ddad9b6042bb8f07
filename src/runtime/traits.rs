//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::gateway::{GatewayReply, ResponseGateway};
use async_trait::async_trait;
use std::sync::Arc;

/// Produces the model reply for one user message.
///
/// Implementations must not fail: whatever goes wrong is already folded into
/// the returned reply, so the loading flag always clears.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn get_response(&self, message: &str, use_location: bool) -> GatewayReply;
}

#[async_trait]
impl<T: Responder + ?Sized> Responder for Arc<T> {
    async fn get_response(&self, message: &str, use_location: bool) -> GatewayReply {
        (**self).get_response(message, use_location).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

#[async_trait]
impl Responder for ResponseGateway {
    async fn get_response(&self, message: &str, use_location: bool) -> GatewayReply {
        ResponseGateway::get_response(self, message, use_location).await
    }
}
