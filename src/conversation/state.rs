//! Conversation state types

use super::message::ChatMessage;
use serde::Serialize;

/// Request phase of a conversation. There is no error state: failures come
/// back as an ordinary model reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConvState {
    #[default]
    Idle,
    /// One gateway call is in flight for `message`
    Sending { message: String },
}

impl ConvState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ConvState::Sending { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::Sending { .. } => "sending",
        }
    }
}

/// Widget-owned state besides the request phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub open: bool,
    /// Composed but unsent input
    pub input: String,
    /// Append-only; insertion order is display order
    pub transcript: Vec<ChatMessage>,
}

impl Session {
    /// Closed widget, empty input, greeting only
    pub fn new() -> Self {
        Self {
            open: false,
            input: String::new(),
            transcript: vec![ChatMessage::greeting()],
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
