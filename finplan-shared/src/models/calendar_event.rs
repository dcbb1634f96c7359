/// Calendar event model and database operations
///
/// Events sit on a user's financial calendar: reminders, transaction
/// due dates, goal deadlines, or anything else. `related_id` is a loose
/// reference into `transactions` or `goals` depending on `type`; there
/// is deliberately no foreign key on it.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const EVENT_COLUMNS: &str = "id, user_id, title, date, time, type, related_id, completed, \
                             created_at, updated_at";

/// Event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Plain reminder
    Reminder,

    /// Linked to a transaction via related_id
    Transaction,

    /// Linked to a goal via related_id
    Goal,

    /// Anything else
    Other,
}

/// Calendar event model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CalendarEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Event title
    pub title: String,

    /// The day of the event
    pub date: NaiveDate,

    /// Optional time of day
    pub time: Option<NaiveTime>,

    /// Event kind
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Loose reference to a transaction or goal, depending on kind
    pub related_id: Option<Uuid>,

    /// Whether the event is done
    pub completed: bool,

    /// When the event was created
    pub created_at: DateTime<Utc>,

    /// When the event was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCalendarEvent {
    /// Owning user
    pub user_id: Uuid,

    /// Event title
    pub title: String,

    /// The day of the event
    pub date: NaiveDate,

    /// Optional time of day
    pub time: Option<NaiveTime>,

    /// Event kind
    #[serde(rename = "type", default = "default_kind")]
    pub kind: EventKind,

    /// Loose reference to a transaction or goal
    pub related_id: Option<Uuid>,
}

fn default_kind() -> EventKind {
    EventKind::Reminder
}

/// Input for updating an event
///
/// Only non-None fields are updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCalendarEvent {
    /// New title
    pub title: Option<String>,

    /// New date
    pub date: Option<NaiveDate>,

    /// New time (use Some(None) to clear)
    pub time: Option<Option<NaiveTime>>,

    /// New kind
    #[serde(rename = "type")]
    pub kind: Option<EventKind>,

    /// New related id (use Some(None) to clear)
    pub related_id: Option<Option<Uuid>>,

    /// Mark done / not done
    pub completed: Option<bool>,
}

impl UpdateCalendarEvent {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.kind.is_none()
            && self.related_id.is_none()
            && self.completed.is_none()
    }
}

impl CalendarEvent {
    /// Creates a new event
    pub async fn create(pool: &PgPool, data: CreateCalendarEvent) -> Result<Self, sqlx::Error> {
        let event = sqlx::query_as::<_, CalendarEvent>(&format!(
            r#"
            INSERT INTO calendar_events (user_id, title, date, time, type, related_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {EVENT_COLUMNS}
            "#,
        ))
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.date)
        .bind(data.time)
        .bind(data.kind)
        .bind(data.related_id)
        .fetch_one(pool)
        .await?;

        Ok(event)
    }

    /// Lists a user's events, optionally bounded to a date range
    ///
    /// Results are ordered by date, then time (untimed events first).
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let events = sqlx::query_as::<_, CalendarEvent>(&format!(
            r#"
            SELECT {EVENT_COLUMNS}
            FROM calendar_events
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            ORDER BY date ASC, time ASC NULLS FIRST
            "#,
        ))
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_all(pool)
        .await?;

        Ok(events)
    }

    /// Updates an event scoped to a user
    ///
    /// Returns `Ok(None)` if the row does not exist or belongs to
    /// someone else.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        data: UpdateCalendarEvent,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE calendar_events SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", date = ${}", bind_count));
        }
        if data.time.is_some() {
            bind_count += 1;
            query.push_str(&format!(", time = ${}", bind_count));
        }
        if data.kind.is_some() {
            bind_count += 1;
            query.push_str(&format!(", type = ${}", bind_count));
        }
        if data.related_id.is_some() {
            bind_count += 1;
            query.push_str(&format!(", related_id = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {EVENT_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, CalendarEvent>(&query)
            .bind(id)
            .bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(date) = data.date {
            q = q.bind(date);
        }
        if let Some(time) = data.time {
            q = q.bind(time);
        }
        if let Some(kind) = data.kind {
            q = q.bind(kind);
        }
        if let Some(related_id) = data.related_id {
            q = q.bind(related_id);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        let event = q.fetch_optional(pool).await?;

        Ok(event)
    }

    /// Deletes an event scoped to a user
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM calendar_events WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization() {
        assert_eq!(serde_json::to_value(EventKind::Reminder).unwrap(), "reminder");
        assert_eq!(serde_json::to_value(EventKind::Goal).unwrap(), "goal");
    }

    #[test]
    fn test_create_defaults_to_reminder() {
        let payload = serde_json::json!({
            "user_id": Uuid::new_v4(),
            "title": "Оплатить аренду",
            "date": "2024-02-01"
        });

        let create: CreateCalendarEvent = serde_json::from_value(payload).unwrap();
        assert_eq!(create.kind, EventKind::Reminder);
        assert!(create.time.is_none());
        assert!(create.related_id.is_none());
    }

    #[test]
    fn test_event_json_shape() {
        let event = CalendarEvent {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Цель: отпуск".to_string(),
            date: "2024-06-01".parse().unwrap(),
            time: Some("09:30:00".parse().unwrap()),
            kind: EventKind::Goal,
            related_id: Some(Uuid::new_v4()),
            completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "goal");
        assert_eq!(json["date"], "2024-06-01");
        assert_eq!(json["time"], "09:30:00");
    }
}
