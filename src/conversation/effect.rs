//! Effects produced by state transitions

use super::message::ChatMessage;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Change widget visibility
    SetOpen(bool),

    /// Replace the input buffer
    SetInput(String),

    /// Append to the transcript
    AppendMessage(ChatMessage),

    /// Ask the gateway for a reply (runs in the background)
    RequestReply { message: String, use_location: bool },

    /// Tell connected clients that visibility or loading changed
    NotifyStateChange,
}

impl Effect {
    pub fn clear_input() -> Self {
        Effect::SetInput(String::new())
    }
}
