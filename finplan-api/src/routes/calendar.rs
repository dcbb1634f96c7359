/// Calendar event endpoints
///
/// All handlers require a valid bearer credential; rows are scoped to the
/// authenticated user.
///
/// # Endpoints
///
/// - `GET /v1/calendar?start=&end=` - list events, optionally date-bounded
/// - `POST /v1/calendar` - create event
/// - `PUT /v1/calendar` - update event (id in body)
/// - `DELETE /v1/calendar?id=` - delete event

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::{NaiveDate, NaiveTime};
use finplan_shared::{
    auth::middleware::AuthContext,
    models::calendar_event::{
        CalendarEvent, CreateCalendarEvent, EventKind, UpdateCalendarEvent,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// GET query parameters
#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    /// Inclusive lower date bound
    pub start: Option<NaiveDate>,

    /// Inclusive upper date bound
    pub end: Option<NaiveDate>,
}

/// Create event request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEventRequest {
    /// Event title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// The day of the event
    pub date: NaiveDate,

    /// Optional time of day
    pub time: Option<NaiveTime>,

    /// Event kind; defaults to reminder
    #[serde(rename = "type", default = "default_kind")]
    pub kind: EventKind,

    /// Loose reference to a transaction or goal
    pub related_id: Option<Uuid>,
}

fn default_kind() -> EventKind {
    EventKind::Reminder
}

/// Update event request: the id plus the fields to change
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    /// Event ID
    pub id: Uuid,

    /// Fields to change
    #[serde(flatten)]
    pub changes: UpdateCalendarEvent,
}

/// Delete query parameter
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Row ID to delete
    pub id: Uuid,
}

/// List events response
#[derive(Debug, Serialize)]
pub struct EventsResponse {
    /// Matching events in calendar order
    pub events: Vec<CalendarEvent>,
}

/// Single event response
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// The affected event
    pub event: CalendarEvent,
}

/// Delete acknowledgement
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    /// Human-readable acknowledgement
    pub message: String,

    /// The deleted row ID
    pub id: Uuid,
}

/// GET /v1/calendar
pub async fn list_events(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Json<EventsResponse>> {
    let events =
        CalendarEvent::list_by_user(&state.db, auth.user_id, query.start, query.end).await?;

    Ok(Json(EventsResponse { events }))
}

/// POST /v1/calendar
///
/// # Errors
///
/// - `422`: title missing or too long
pub async fn create_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateEventRequest>,
) -> ApiResult<Json<EventResponse>> {
    req.validate().map_err(validation_details)?;

    let event = CalendarEvent::create(
        &state.db,
        CreateCalendarEvent {
            user_id: auth.user_id,
            title: req.title.trim().to_string(),
            date: req.date,
            time: req.time,
            kind: req.kind,
            related_id: req.related_id,
        },
    )
    .await?;

    Ok(Json(EventResponse { event }))
}

/// PUT /v1/calendar
///
/// # Errors
///
/// - `400`: empty update
/// - `404`: no event with that id owned by the caller
pub async fn update_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateEventRequest>,
) -> ApiResult<Json<EventResponse>> {
    if req.changes.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    let event = CalendarEvent::update(&state.db, auth.user_id, req.id, req.changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

    Ok(Json(EventResponse { event }))
}

/// DELETE /v1/calendar?id=
///
/// # Errors
///
/// - `404`: no event with that id owned by the caller
pub async fn delete_event(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = CalendarEvent::delete(&state.db, auth.user_id, query.id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Event not found".to_string()));
    }

    Ok(Json(DeletedResponse {
        message: "Event deleted successfully".to_string(),
        id: query.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_defaults() {
        let body = serde_json::json!({
            "title": "Оплатить аренду",
            "date": "2024-02-01"
        });

        let req: CreateEventRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.kind, EventKind::Reminder);
        assert!(req.time.is_none());
        assert!(req.related_id.is_none());
    }

    #[test]
    fn test_create_request_with_goal_link() {
        let goal_id = Uuid::new_v4();
        let body = serde_json::json!({
            "title": "Цель: отпуск",
            "date": "2024-06-01",
            "time": "09:30:00",
            "type": "goal",
            "related_id": goal_id
        });

        let req: CreateEventRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.kind, EventKind::Goal);
        assert_eq!(req.related_id, Some(goal_id));
    }

    #[test]
    fn test_update_request_completed_flag() {
        let body = serde_json::json!({
            "id": Uuid::new_v4(),
            "completed": true
        });

        let req: UpdateEventRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.changes.completed, Some(true));
        assert!(!req.changes.is_empty());
    }
}
