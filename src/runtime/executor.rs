//! Widget runtime executor

use super::traits::Responder;
use super::{SessionSnapshot, WidgetEvent};
use crate::conversation::{transition, ConvState, Effect, Event, Session};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};

/// Event loop owning one widget's conversation.
///
/// Requests are spawned in the background and report back through the event
/// channel; nothing cancels them, so a reply lands even after the widget
/// closed.
pub struct WidgetRuntime<R>
where
    R: Responder + 'static,
{
    state: ConvState,
    session: Session,
    responder: Arc<R>,
    event_rx: mpsc::Receiver<Event>,
    /// Weak so the loop ends once every handle and in-flight request is gone
    event_tx: mpsc::WeakSender<Event>,
    broadcast_tx: broadcast::Sender<WidgetEvent>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl<R> WidgetRuntime<R>
where
    R: Responder + 'static,
{
    pub fn new(
        responder: R,
        event_rx: mpsc::Receiver<Event>,
        event_tx: &mpsc::Sender<Event>,
        broadcast_tx: broadcast::Sender<WidgetEvent>,
        snapshot_tx: watch::Sender<SessionSnapshot>,
    ) -> Self {
        Self {
            state: ConvState::Idle,
            session: Session::new(),
            responder: Arc::new(responder),
            event_rx,
            event_tx: event_tx.downgrade(),
            broadcast_tx,
            snapshot_tx,
        }
    }

    pub async fn run(mut self) {
        tracing::debug!("Starting widget runtime");

        while let Some(event) = self.event_rx.recv().await {
            self.process_event(event);
        }

        tracing::debug!(
            messages = self.session.transcript.len(),
            "Widget runtime stopped"
        );
    }

    fn process_event(&mut self, event: Event) {
        let result = match transition(&self.state, &self.session, event) {
            Ok(r) => r,
            Err(e) => {
                // Busy and blank sends are dropped silently
                tracing::debug!(state = self.state.name(), reason = %e, "Event dropped");
                return;
            }
        };

        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }

        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::SetOpen(open) => self.session.open = open,

            Effect::SetInput(text) => self.session.input = text,

            Effect::AppendMessage(message) => {
                self.session.transcript.push(message.clone());
                let _ = self.broadcast_tx.send(WidgetEvent::Message { message });
            }

            Effect::NotifyStateChange => {
                let _ = self.broadcast_tx.send(WidgetEvent::StateChange {
                    open: self.session.open,
                    loading: self.state.is_loading(),
                });
            }

            Effect::RequestReply {
                message,
                use_location,
            } => {
                let Some(event_tx) = self.event_tx.upgrade() else {
                    // Every handle is gone; nobody is left to see the reply
                    tracing::warn!("Widget detached, reply request dropped");
                    return;
                };
                let responder = self.responder.clone();

                tokio::spawn(async move {
                    tracing::info!(use_location, "Requesting consultant reply");
                    let reply = responder.get_response(&message, use_location).await;
                    if event_tx.send(Event::ReplyReady { reply }).await.is_err() {
                        tracing::warn!("Widget runtime gone before reply arrived");
                    }
                });
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::new(&self.session, &self.state)
    }
}
