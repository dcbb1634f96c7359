/// Savings goal model and database operations
///
/// A goal tracks progress toward a target amount. `current_amount` may
/// exceed `target_amount`; progress above 100% is reported as-is and any
/// clamping is a display concern.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const GOAL_COLUMNS: &str = "id, user_id, title, description, target_amount, current_amount, \
                            deadline, completed, created_at, updated_at";

/// Savings goal model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Goal {
    /// Unique goal ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Goal title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Target amount (positive)
    pub target_amount: Decimal,

    /// Amount saved so far; may exceed the target
    pub current_amount: Decimal,

    /// Optional deadline
    pub deadline: Option<NaiveDate>,

    /// Whether the goal is marked completed
    pub completed: bool,

    /// When the goal was created
    pub created_at: DateTime<Utc>,

    /// When the goal was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGoal {
    /// Owning user
    pub user_id: Uuid,

    /// Goal title
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Target amount (must be positive)
    pub target_amount: Decimal,

    /// Optional deadline
    pub deadline: Option<NaiveDate>,
}

/// Input for updating a goal
///
/// Only non-None fields are updated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateGoal {
    /// New title
    pub title: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New target amount
    pub target_amount: Option<Decimal>,

    /// New saved amount
    pub current_amount: Option<Decimal>,

    /// New deadline (use Some(None) to clear)
    pub deadline: Option<Option<NaiveDate>>,

    /// Mark completed / not completed
    pub completed: Option<bool>,
}

impl UpdateGoal {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.target_amount.is_none()
            && self.current_amount.is_none()
            && self.deadline.is_none()
            && self.completed.is_none()
    }
}

impl Goal {
    /// Progress toward the target as a percentage
    ///
    /// current_amount / target_amount × 100, exact decimal arithmetic.
    /// Values above 100 are returned as-is. A zero target yields zero.
    pub fn progress_percent(&self) -> Decimal {
        if self.target_amount.is_zero() {
            return Decimal::ZERO;
        }

        self.current_amount / self.target_amount * Decimal::from(100)
    }

    /// Creates a new goal with a zero starting amount
    pub async fn create(pool: &PgPool, data: CreateGoal) -> Result<Self, sqlx::Error> {
        let goal = sqlx::query_as::<_, Goal>(&format!(
            r#"
            INSERT INTO goals (user_id, title, description, target_amount, deadline)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {GOAL_COLUMNS}
            "#,
        ))
        .bind(data.user_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.target_amount)
        .bind(data.deadline)
        .fetch_one(pool)
        .await?;

        Ok(goal)
    }

    /// Lists a user's goals, newest first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let goals = sqlx::query_as::<_, Goal>(&format!(
            r#"
            SELECT {GOAL_COLUMNS}
            FROM goals
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(goals)
    }

    /// Updates a goal scoped to a user
    ///
    /// Returns `Ok(None)` if the row does not exist or belongs to
    /// someone else.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        data: UpdateGoal,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = String::from("UPDATE goals SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.title.is_some() {
            bind_count += 1;
            query.push_str(&format!(", title = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.target_amount.is_some() {
            bind_count += 1;
            query.push_str(&format!(", target_amount = ${}", bind_count));
        }
        if data.current_amount.is_some() {
            bind_count += 1;
            query.push_str(&format!(", current_amount = ${}", bind_count));
        }
        if data.deadline.is_some() {
            bind_count += 1;
            query.push_str(&format!(", deadline = ${}", bind_count));
        }
        if data.completed.is_some() {
            bind_count += 1;
            query.push_str(&format!(", completed = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {GOAL_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Goal>(&query).bind(id).bind(user_id);

        if let Some(title) = data.title {
            q = q.bind(title);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(target_amount) = data.target_amount {
            q = q.bind(target_amount);
        }
        if let Some(current_amount) = data.current_amount {
            q = q.bind(current_amount);
        }
        if let Some(deadline) = data.deadline {
            q = q.bind(deadline);
        }
        if let Some(completed) = data.completed {
            q = q.bind(completed);
        }

        let goal = q.fetch_optional(pool).await?;

        Ok(goal)
    }

    /// Deletes a goal scoped to a user
    ///
    /// Returns true if a row was deleted.
    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM goals WHERE id = $1 AND user_id = $2")
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

    fn goal_with_amounts(current: Decimal, target: Decimal) -> Goal {
        Goal {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Отпуск".to_string(),
            description: String::new(),
            target_amount: target,
            current_amount: current,
            deadline: None,
            completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_percent() {
        let goal = goal_with_amounts(Decimal::new(2500, 2), Decimal::new(10000, 2));
        assert_eq!(goal.progress_percent(), Decimal::from(25));
    }

    #[test]
    fn test_progress_can_exceed_hundred() {
        let goal = goal_with_amounts(Decimal::from(150), Decimal::from(100));
        assert_eq!(goal.progress_percent(), Decimal::from(150));
    }

    #[test]
    fn test_progress_zero_target() {
        let goal = goal_with_amounts(Decimal::from(10), Decimal::ZERO);
        assert_eq!(goal.progress_percent(), Decimal::ZERO);
    }

    #[test]
    fn test_progress_is_exact() {
        // 1/3 of the way: exact decimal division, no float representation
        let goal = goal_with_amounts(Decimal::from(1), Decimal::from(3));
        let progress = goal.progress_percent();
        assert!(progress > Decimal::new(3333, 2));
        assert!(progress < Decimal::new(3334, 2));
    }
}
