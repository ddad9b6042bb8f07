//! HTTP request handlers

use super::sse::sse_stream;
use super::types::{
    CreateSessionResponse, ErrorResponse, LocationReport, OpenRequest, QueuedResponse,
    SuccessResponse, TextRequest,
};
use super::AppState;
use crate::location::Location;
use crate::runtime::{SessionSnapshot, WidgetGone, WidgetSession};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/sessions", post(create_session))
        .route(
            "/api/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route("/api/sessions/:id/stream", get(stream_session))
        // Widget commands
        .route("/api/sessions/:id/open", post(open_widget))
        .route("/api/sessions/:id/close", post(close_widget))
        .route("/api/sessions/:id/toggle", post(toggle_widget))
        .route("/api/sessions/:id/input", post(set_input))
        .route("/api/sessions/:id/send", post(send_message))
        .route("/api/sessions/:id/submit", post(submit_input))
        // Browser geolocation outcome
        .route("/api/sessions/:id/location", post(report_location))
        .route("/version", get(get_version))
        .with_state(state)
}

async fn lookup(state: &AppState, id: &str) -> Result<WidgetSession, AppError> {
    state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))
}

// ============================================================
// Session Lifecycle
// ============================================================

async fn create_session(State(state): State<AppState>) -> Json<CreateSessionResponse> {
    let session_id = state.sessions.create().await;
    Json(CreateSessionResponse { session_id })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let session = lookup(&state, &id).await?;
    Ok(Json(session.handle.snapshot()))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    if state.sessions.remove(&id).await {
        Ok(Json(SuccessResponse { success: true }))
    } else {
        Err(AppError::NotFound(format!("Session not found: {id}")))
    }
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let session = lookup(&state, &id).await?;
    // Subscribe before snapshotting so no update falls between the two
    let rx = session.handle.subscribe();
    let prompts = session.locator.subscribe_prompts();
    Ok(sse_stream(session.handle.snapshot(), rx, prompts))
}

// ============================================================
// Widget Commands
// ============================================================

async fn open_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Option<Json<OpenRequest>>,
) -> Result<Json<QueuedResponse>, AppError> {
    let session = lookup(&state, &id).await?;
    let req = body.map(|Json(r)| r).unwrap_or_default();
    session.handle.trigger().fire(req.topic.as_deref());
    Ok(Json(QueuedResponse { queued: true }))
}

async fn close_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QueuedResponse>, AppError> {
    let session = lookup(&state, &id).await?;
    session.handle.close().await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn toggle_widget(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QueuedResponse>, AppError> {
    let session = lookup(&state, &id).await?;
    session.handle.toggle().await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn set_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TextRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    let session = lookup(&state, &id).await?;
    session.handle.set_input(req.text).await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TextRequest>,
) -> Result<Json<QueuedResponse>, AppError> {
    let session = lookup(&state, &id).await?;
    session.handle.send(req.text).await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn submit_input(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<QueuedResponse>, AppError> {
    let session = lookup(&state, &id).await?;
    session.handle.submit().await?;
    Ok(Json(QueuedResponse { queued: true }))
}

async fn report_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(report): Json<LocationReport>,
) -> Result<Json<SuccessResponse>, AppError> {
    let session = lookup(&state, &id).await?;

    if report.denied {
        session.locator.deny();
        return Ok(Json(SuccessResponse { success: true }));
    }

    let (Some(latitude), Some(longitude)) = (report.latitude, report.longitude) else {
        return Err(AppError::BadRequest(
            "latitude and longitude are required unless denied".to_string(),
        ));
    };
    let location =
        Location::new(latitude, longitude).map_err(|e| AppError::BadRequest(e.to_string()))?;
    session.locator.report(location);
    Ok(Json(SuccessResponse { success: true }))
}

async fn get_version() -> &'static str {
    concat!("drewverse-consultant ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl From<WidgetGone> for AppError {
    fn from(e: WidgetGone) -> Self {
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}
