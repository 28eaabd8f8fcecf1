//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Event, EventEntry};
use crate::error::{AppError, AppResult};

use super::AppState;

// =========================================================================
// Request types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct EntryRequest {
    pub event_type_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
}

impl From<EntryRequest> for EventEntry {
    fn from(request: EntryRequest) -> Self {
        EventEntry::new(
            request.event_type_id,
            request.title,
            request.start_time,
            request.end_time,
        )
        .with_description(request.description)
        .with_location(request.location)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub user_id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub entries: Vec<EntryRequest>,
}

impl From<CreateEventRequest> for Event {
    fn from(request: CreateEventRequest) -> Self {
        let mut event = Event::new(
            request.user_id,
            request.title,
            request.start_time,
            request.end_time,
        )
        .with_description(request.description)
        .with_location(request.location);
        event.entries = request.entries.into_iter().map(EventEntry::from).collect();
        event
    }
}

/// Full replacement of an event; the owner cannot be changed
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateEventRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub entries: Vec<EntryRequest>,
}

impl UpdateEventRequest {
    fn into_event(self, id: i64) -> Event {
        Event {
            id,
            user_id: 0,
            title: self.title,
            description: self.description,
            start_time: self.start_time,
            end_time: self.end_time,
            location: self.location,
            entries: self.entries.into_iter().map(EventEntry::from).collect(),
        }
    }
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", post(create_event))
        .route(
            "/events/:id",
            get(get_event).put(update_event).delete(delete_event),
        )
}

/// Parse an event identifier taken from the request path
pub fn parse_event_id(raw: &str) -> AppResult<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::InvalidEventId("Event ID is required".to_string()));
    }

    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::InvalidEventId("Invalid Event ID".to_string())),
    }
}

fn invalid_body(rejection: JsonRejection) -> AppError {
    AppError::InvalidRequest(rejection.body_text())
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

// =========================================================================
// POST /events
// =========================================================================

async fn create_event(
    State(state): State<AppState>,
    payload: Result<Json<CreateEventRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Event>)> {
    let Json(request) = payload.map_err(invalid_body)?;
    let event = state.store.create(request.into()).await?;

    Ok((StatusCode::CREATED, Json(event)))
}

// =========================================================================
// GET /events/:id
// =========================================================================

async fn get_event(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<Event>> {
    let id = parse_event_id(&raw_id)?;

    let event = state
        .store
        .get_by_id(id)
        .await?
        .ok_or(AppError::EventNotFound(id))?;

    Ok(Json(event))
}

// =========================================================================
// PUT /events/:id
// =========================================================================

/// Replace an event. Entry ids in the response are newly assigned.
async fn update_event(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateEventRequest>, JsonRejection>,
) -> AppResult<Json<Event>> {
    let id = parse_event_id(&raw_id)?;
    let Json(request) = payload.map_err(invalid_body)?;

    let mut event = request.into_event(id);
    state.store.update(&mut event).await?;

    Ok(Json(event))
}

// =========================================================================
// DELETE /events/:id
// =========================================================================

async fn delete_event(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<StatusCode> {
    let id = parse_event_id(&raw_id)?;

    state.store.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
