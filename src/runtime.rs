//! Runtime for chat widgets
//!
//! Each rendered widget gets its own event loop and an independent session.
//! The rest of the application talks to a widget only through its
//! [`WidgetHandle`] (or an [`OpenTrigger`] cloned from it).

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use traits::*;

use crate::conversation::{ChatMessage, ConvState, Event, Session};
use crate::gateway::ResponseGateway;
use crate::llm::GroundingClient;
use crate::location::ReportedLocation;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch, RwLock};

use executor::WidgetRuntime;

/// Commands buffered per widget before senders wait (or `fire` drops)
const EVENT_QUEUE_DEPTH: usize = 64;

/// Point-in-time view of a widget
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub open: bool,
    pub input: String,
    pub loading: bool,
    pub messages: Vec<ChatMessage>,
}

impl SessionSnapshot {
    pub fn new(session: &Session, state: &ConvState) -> Self {
        Self {
            open: session.open,
            input: session.input.clone(),
            loading: state.is_loading(),
            messages: session.transcript.clone(),
        }
    }
}

/// Updates pushed to connected clients
#[derive(Debug, Clone)]
pub enum WidgetEvent {
    Message { message: ChatMessage },
    StateChange { open: bool, loading: bool },
}

#[derive(Debug, Error)]
#[error("Widget is no longer running")]
pub struct WidgetGone;

/// Command interface of one running widget
#[derive(Clone)]
pub struct WidgetHandle {
    event_tx: mpsc::Sender<Event>,
    broadcast_tx: broadcast::Sender<WidgetEvent>,
    snapshot_rx: watch::Receiver<SessionSnapshot>,
}

impl WidgetHandle {
    /// Start a widget runtime in the background
    pub fn spawn<R: Responder + 'static>(responder: R) -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (broadcast_tx, _) = broadcast::channel(128);
        let (snapshot_tx, snapshot_rx) =
            watch::channel(SessionSnapshot::new(&Session::new(), &ConvState::Idle));

        let runtime = WidgetRuntime::new(
            responder,
            event_rx,
            &event_tx,
            broadcast_tx.clone(),
            snapshot_tx,
        );
        tokio::spawn(runtime.run());

        Self {
            event_tx,
            broadcast_tx,
            snapshot_rx,
        }
    }

    async fn dispatch(&self, event: Event) -> Result<(), WidgetGone> {
        self.event_tx.send(event).await.map_err(|_| WidgetGone)
    }

    /// Hide the widget. Transcript and any pending reply are kept.
    pub async fn close(&self) -> Result<(), WidgetGone> {
        self.dispatch(Event::Close).await
    }

    pub async fn toggle(&self) -> Result<(), WidgetGone> {
        self.dispatch(Event::Toggle).await
    }

    pub async fn set_input(&self, text: impl Into<String>) -> Result<(), WidgetGone> {
        self.dispatch(Event::SetInput { text: text.into() }).await
    }

    /// Send a message. Ignored while a reply is pending or when blank.
    pub async fn send(&self, text: impl Into<String>) -> Result<(), WidgetGone> {
        self.dispatch(Event::Send { text: text.into() }).await
    }

    /// Send the current input buffer
    pub async fn submit(&self) -> Result<(), WidgetGone> {
        self.dispatch(Event::Submit).await
    }

    /// The widget's `open(topic)` entry point, for "learn more" actions
    /// elsewhere in the UI
    pub fn trigger(&self) -> OpenTrigger {
        OpenTrigger {
            event_tx: self.event_tx.clone(),
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot_rx.borrow().clone()
    }

    #[allow(dead_code)] // Useful for tests
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_rx.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.broadcast_tx.subscribe()
    }

    /// Number of live update streams
    pub fn subscriber_count(&self) -> usize {
        self.broadcast_tx.receiver_count()
    }
}

/// Fire-and-forget "open with topic" signal
#[derive(Clone)]
pub struct OpenTrigger {
    event_tx: mpsc::Sender<Event>,
}

impl OpenTrigger {
    /// Never waits. If the widget already has `EVENT_QUEUE_DEPTH` commands
    /// queued the signal is dropped with a warning, like any other
    /// unheard broadcast.
    pub fn fire(&self, topic: Option<&str>) {
        let event = Event::Open {
            topic: topic.map(str::to_string),
        };
        if let Err(e) = self.event_tx.try_send(event) {
            tracing::warn!(error = %e, "Open signal dropped");
        }
    }
}

/// A hosted widget plus the location its browser reported
#[derive(Clone)]
pub struct WidgetSession {
    pub handle: WidgetHandle,
    pub locator: Arc<ReportedLocation>,
    last_active: Arc<Mutex<Instant>>,
}

impl WidgetSession {
    fn touch(&self) {
        *self
            .last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last = *self
            .last_active
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        now.saturating_duration_since(last)
    }
}

/// Registry of all hosted widget sessions
pub struct SessionManager {
    client: Arc<dyn GroundingClient>,
    location_wait: Duration,
    idle_timeout: Duration,
    sessions: RwLock<HashMap<String, WidgetSession>>,
}

impl SessionManager {
    pub fn new(
        client: Arc<dyn GroundingClient>,
        location_wait: Duration,
        idle_timeout: Duration,
    ) -> Self {
        Self {
            client,
            location_wait,
            idle_timeout,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Start a fresh widget and return its id
    pub async fn create(&self) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let locator = Arc::new(ReportedLocation::new());
        let gateway =
            ResponseGateway::new(self.client.clone(), locator.clone(), self.location_wait);

        let session = WidgetSession {
            handle: WidgetHandle::spawn(gateway),
            locator,
            last_active: Arc::new(Mutex::new(Instant::now())),
        };
        self.sessions.write().await.insert(id.clone(), session);

        tracing::info!(session_id = %id, "Widget session created");
        id
    }

    /// Look a session up, counting the lookup as activity
    pub async fn get(&self, id: &str) -> Option<WidgetSession> {
        let session = self.sessions.read().await.get(id).cloned()?;
        session.touch();
        Some(session)
    }

    /// Tear a session down. A pending reply still completes, then the
    /// runtime stops.
    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!(session_id = %id, "Widget session removed");
        }
        removed
    }

    /// Drop sessions idle for at least the idle timeout. A session with an
    /// open update stream is never idle. Returns how many were dropped.
    pub async fn evict_idle(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let keep = session.handle.subscriber_count() > 0
                || session.idle_for(now) < self.idle_timeout;
            if !keep {
                tracing::info!(session_id = %id, "Idle widget session evicted");
            }
            keep
        });
        before - sessions.len()
    }

    /// Sweep idle sessions every `every` until the manager is dropped
    pub fn spawn_reaper(manager: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let manager: Weak<Self> = Arc::downgrade(manager);
        tokio::spawn(async move {
            let mut ticks = tokio::time::interval(every);
            ticks.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticks.tick().await;
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                let evicted = manager.evict_idle().await;
                if evicted > 0 {
                    tracing::debug!(evicted, "Idle sweep finished");
                }
            }
        })
    }
}
