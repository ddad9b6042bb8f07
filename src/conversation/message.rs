//! Transcript entries

use crate::gateway::{GatewayReply, Source};
use crate::persona::GREETING;
use serde::{Deserialize, Serialize};

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

/// One transcript entry; never mutated once appended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<Source>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sources: vec![],
        }
    }

    pub fn model(reply: GatewayReply) -> Self {
        Self {
            role: Role::Model,
            text: reply.text,
            sources: reply.sources,
        }
    }

    /// Opening message of every transcript
    pub fn greeting() -> Self {
        Self {
            role: Role::Model,
            text: GREETING.to_string(),
            sources: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_format() {
        let msg = ChatMessage::model(GatewayReply {
            text: "See here".to_string(),
            sources: vec![Source {
                uri: "https://a.com".to_string(),
                title: None,
            }],
        });
        assert_eq!(
            serde_json::to_value(&msg).unwrap(),
            json!({
                "role": "model",
                "text": "See here",
                "sources": [{ "uri": "https://a.com", "label": "Source" }]
            })
        );

        let user = serde_json::to_value(ChatMessage::user("hi")).unwrap();
        assert_eq!(user, json!({ "role": "user", "text": "hi" }));
    }
}
