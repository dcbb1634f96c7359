/// Tag model and database operations
///
/// Tags are per-user labels attached to transactions through the
/// `transaction_tags` join table. `(user_id, name)` is unique.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Default tag color when the client does not pick one
pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";

/// Tag model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tag {
    /// Unique tag ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Tag name, unique per user
    pub name: String,

    /// Display color (hex, e.g. "#3B82F6")
    pub color: String,

    /// When the tag was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new tag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTag {
    /// Owning user
    pub user_id: Uuid,

    /// Tag name
    pub name: String,

    /// Display color
    pub color: String,
}

impl Tag {
    /// Creates a new tag
    ///
    /// # Errors
    ///
    /// Returns a unique-constraint error if the user already has a tag
    /// with this name.
    pub async fn create(pool: &PgPool, data: CreateTag) -> Result<Self, sqlx::Error> {
        let tag = sqlx::query_as::<_, Tag>(
            r#"
            INSERT INTO tags (user_id, name, color)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, name, color, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.name)
        .bind(data.color)
        .fetch_one(pool)
        .await?;

        Ok(tag)
    }

    /// Lists all tags belonging to a user, ordered by name
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, user_id, name, color, created_at
            FROM tags
            WHERE user_id = $1
            ORDER BY name
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_serialization() {
        let tag = Tag {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Продукты".to_string(),
            color: DEFAULT_TAG_COLOR.to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&tag).unwrap();
        assert_eq!(json["name"], "Продукты");
        assert_eq!(json["color"], "#3B82F6");
    }
}
