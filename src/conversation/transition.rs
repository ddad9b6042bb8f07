//! Pure state transition function
//!
//! `Idle -> Sending -> Idle` on every send. While `Sending`, further sends
//! are rejected; the runtime drops rejected events without a trace in the
//! transcript.

use super::classify::is_location_relevant;
use super::message::ChatMessage;
use super::{ConvState, Effect, Event, Session};
use crate::persona::topic_inquiry;
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("A reply is still pending")]
    Busy,
    #[error("Message is empty")]
    EmptyMessage,
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
pub fn transition(
    state: &ConvState,
    session: &Session,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // Visibility never depends on the request phase
        (_, Event::Open { topic }) => {
            let opened = set_open(state, true);
            let Some(topic) = topic.filter(|t| !t.is_empty()) else {
                return Ok(opened);
            };
            // The canned inquiry goes through the normal send gate but leaves
            // any draft in the input box alone
            match begin_send(state, topic_inquiry(&topic), InputBuffer::Keep) {
                Ok(sent) => Ok(TransitionResult::new(sent.new_state)
                    .with_effects(opened.effects)
                    .with_effects(sent.effects)),
                Err(_) => Ok(opened),
            }
        }

        (_, Event::Close) => Ok(set_open(state, false)),

        (_, Event::Toggle) => Ok(set_open(state, !session.open)),

        (_, Event::SetInput { text }) => {
            Ok(TransitionResult::new(state.clone()).with_effect(Effect::SetInput(text)))
        }

        (_, Event::Send { text }) => begin_send(state, text, InputBuffer::Clear),

        (_, Event::Submit) => begin_send(state, session.input.clone(), InputBuffer::Clear),

        // Sending + ReplyReady -> Idle
        (ConvState::Sending { .. }, Event::ReplyReady { reply }) => {
            Ok(TransitionResult::new(ConvState::Idle)
                .with_effect(Effect::AppendMessage(ChatMessage::model(reply)))
                .with_effect(Effect::NotifyStateChange))
        }

        (ConvState::Idle, event @ Event::ReplyReady { .. }) => {
            Err(TransitionError::InvalidTransition(format!(
                "No transition from Idle with event {event:?}"
            )))
        }
    }
}

fn set_open(state: &ConvState, open: bool) -> TransitionResult {
    TransitionResult::new(state.clone())
        .with_effect(Effect::SetOpen(open))
        .with_effect(Effect::NotifyStateChange)
}

/// What a successful send does to the input buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputBuffer {
    Clear,
    Keep,
}

// Idle + non-blank text -> Sending
fn begin_send(
    state: &ConvState,
    text: String,
    input: InputBuffer,
) -> Result<TransitionResult, TransitionError> {
    if state.is_loading() {
        return Err(TransitionError::Busy);
    }
    if text.trim().is_empty() {
        return Err(TransitionError::EmptyMessage);
    }

    let use_location = is_location_relevant(&text);
    let mut result = TransitionResult::new(ConvState::Sending {
        message: text.clone(),
    })
    .with_effect(Effect::AppendMessage(ChatMessage::user(text.clone())));
    if input == InputBuffer::Clear {
        result = result.with_effect(Effect::clear_input());
    }
    Ok(result
        .with_effect(Effect::NotifyStateChange)
        .with_effect(Effect::RequestReply {
            message: text,
            use_location,
        }))
}
