//! Event endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use daysync_core::events::{self, CreateEvent};
use daysync_core::store::EventPatch;
use daysync_core::{DeleteScope, Event, RecurrencePattern};

use crate::routes::{AppError, OwnerId};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/recent", get(recent_changes))
        .route("/events/{id}", axum::routing::put(update_event).delete(delete_event))
}

/// Request body for creating an event
#[derive(Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub color: Option<String>,
    /// "none" | "daily" | "weekly" | "monthly" | "yearly"; unknown values
    /// are rejected with 400.
    pub recurrence_pattern: Option<String>,
}

/// POST /events - Create an event, expanding recurrence into a series.
/// Returns the first instance as the representative result.
async fn create_event(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Json(req): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let pattern = match req.recurrence_pattern.as_deref() {
        Some(s) => s.parse::<RecurrencePattern>()?,
        None => RecurrencePattern::None,
    };

    let event = events::create_event(
        &*state.store,
        owner_id,
        CreateEvent {
            title: req.title,
            start_time: req.start_time,
            end_time: req.end_time,
            color: req.color,
            recurrence_pattern: pattern,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

/// GET /events?start_date=&end_date= - List the owner's events.
async fn list_events(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events =
        events::list_events(&*state.store, owner_id, query.start_date, query.end_date).await?;
    Ok(Json(events))
}

#[derive(Deserialize)]
pub struct RecentQuery {
    pub limit: Option<usize>,
}

/// GET /events/recent?limit= - Most recently touched events, newest first.
async fn recent_changes(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Event>>, AppError> {
    let events =
        events::recent_changes(&*state.store, owner_id, query.limit.unwrap_or(20)).await?;
    Ok(Json(events))
}

/// Request body for updating an event; omitted fields are left unchanged.
#[derive(Deserialize)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub color: Option<String>,
}

/// PUT /events/:id - Edit title/times/color.
async fn update_event(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateEventRequest>,
) -> Result<Json<Event>, AppError> {
    let patch = EventPatch {
        title: req.title,
        start_time: req.start_time,
        end_time: req.end_time,
        color: req.color,
    };
    let event = events::update_event(&*state.store, owner_id, id, patch).await?;
    Ok(Json(event))
}

#[derive(Deserialize)]
pub struct DeleteQuery {
    /// "single" (default) or "series"
    pub delete_type: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted: u64,
}

/// DELETE /events/:id?delete_type=single|series
async fn delete_event(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Path(id): Path<Uuid>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<DeleteResponse>, AppError> {
    let scope = match query.delete_type.as_deref() {
        Some(s) => s.parse::<DeleteScope>()?,
        None => DeleteScope::Single,
    };
    let deleted = events::delete_event(&*state.store, owner_id, id, scope).await?;
    Ok(Json(DeleteResponse { deleted }))
}
