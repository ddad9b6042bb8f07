//! Events that can occur in a conversation

use crate::gateway::GatewayReply;

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // Widget events
    /// Show the widget; a topic also sends a canned inquiry about it
    Open { topic: Option<String> },
    Close,
    Toggle,
    SetInput { text: String },
    /// Send the given text
    Send { text: String },
    /// Send whatever is in the input buffer
    Submit,

    // Gateway events
    ReplyReady { reply: GatewayReply },
}
