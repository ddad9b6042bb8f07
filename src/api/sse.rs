//! Server-Sent Events support

use crate::location::LocationPrompt;
use crate::runtime::{SessionSnapshot, WidgetEvent};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Convert broadcast stream to SSE stream, starting with a full snapshot.
/// Location prompts are interleaved as `location_request` events.
pub fn sse_stream(
    init: SessionSnapshot,
    broadcast_rx: tokio::sync::broadcast::Receiver<WidgetEvent>,
    prompt_rx: tokio::sync::broadcast::Receiver<LocationPrompt>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let init = futures::stream::once(async move {
        let data = json!({
            "type": "init",
            "session": init,
        });
        Ok(Event::default().event("init").data(data.to_string()))
    });

    let broadcasts = BroadcastStream::new(broadcast_rx).filter_map(|result| match result {
        Ok(event) => Some(Ok(widget_event_to_axum(event))),
        Err(_) => None, // Skip lagged messages
    });

    let prompts = BroadcastStream::new(prompt_rx).filter_map(|result| match result {
        Ok(LocationPrompt) => Some(Ok(location_request())),
        Err(_) => None,
    });

    Sse::new(init.chain(broadcasts.merge(prompts))).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn widget_event_to_axum(event: WidgetEvent) -> Event {
    let (event_type, data) = match event {
        WidgetEvent::Message { message } => (
            "message",
            json!({
                "type": "message",
                "message": message
            }),
        ),
        WidgetEvent::StateChange { open, loading } => (
            "state_change",
            json!({
                "type": "state_change",
                "open": open,
                "loading": loading
            }),
        ),
    };

    Event::default().event(event_type).data(data.to_string())
}

fn location_request() -> Event {
    let data = json!({ "type": "location_request" });
    Event::default()
        .event("location_request")
        .data(data.to_string())
}
