/// Savings goal endpoints
///
/// All handlers require a valid bearer credential; rows are scoped to the
/// authenticated user.
///
/// # Endpoints
///
/// - `GET /v1/goals` - list goals
/// - `POST /v1/goals` - create goal
/// - `PUT /v1/goals` - update goal (id in body)
/// - `DELETE /v1/goals?id=` - delete goal

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult},
};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::NaiveDate;
use finplan_shared::{
    auth::middleware::AuthContext,
    models::goal::{CreateGoal, Goal, UpdateGoal},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create goal request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateGoalRequest {
    /// Goal title
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// Target amount (must be positive)
    pub target_amount: Decimal,

    /// Optional deadline
    pub deadline: Option<NaiveDate>,
}

/// Update goal request: the goal id plus the fields to change
#[derive(Debug, Deserialize)]
pub struct UpdateGoalRequest {
    /// Goal ID
    pub id: Uuid,

    /// Fields to change
    #[serde(flatten)]
    pub changes: UpdateGoal,
}

/// Delete query parameter
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Row ID to delete
    pub id: Uuid,
}

/// List goals response
#[derive(Debug, Serialize)]
pub struct GoalsResponse {
    /// The user's goals, newest first
    pub goals: Vec<Goal>,
}

/// Single goal response
#[derive(Debug, Serialize)]
pub struct GoalResponse {
    /// The affected goal
    pub goal: Goal,
}

/// Delete acknowledgement
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    /// Human-readable acknowledgement
    pub message: String,

    /// The deleted row ID
    pub id: Uuid,
}

/// GET /v1/goals
pub async fn list_goals(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<GoalsResponse>> {
    let goals = Goal::list_by_user(&state.db, auth.user_id).await?;

    Ok(Json(GoalsResponse { goals }))
}

/// POST /v1/goals
///
/// # Errors
///
/// - `422`: title missing or too long
/// - `400`: non-positive target amount
pub async fn create_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateGoalRequest>,
) -> ApiResult<Json<GoalResponse>> {
    req.validate().map_err(validation_details)?;

    if req.target_amount <= Decimal::ZERO {
        return Err(ApiError::BadRequest(
            "Target amount must be positive".to_string(),
        ));
    }

    let goal = Goal::create(
        &state.db,
        CreateGoal {
            user_id: auth.user_id,
            title: req.title.trim().to_string(),
            description: req.description.trim().to_string(),
            target_amount: req.target_amount,
            deadline: req.deadline,
        },
    )
    .await?;

    Ok(Json(GoalResponse { goal }))
}

/// PUT /v1/goals
///
/// # Errors
///
/// - `400`: empty update or non-positive target amount
/// - `404`: no goal with that id owned by the caller
pub async fn update_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateGoalRequest>,
) -> ApiResult<Json<GoalResponse>> {
    if req.changes.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    if let Some(target_amount) = req.changes.target_amount {
        if target_amount <= Decimal::ZERO {
            return Err(ApiError::BadRequest(
                "Target amount must be positive".to_string(),
            ));
        }
    }

    let goal = Goal::update(&state.db, auth.user_id, req.id, req.changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Goal not found".to_string()))?;

    Ok(Json(GoalResponse { goal }))
}

/// DELETE /v1/goals?id=
///
/// # Errors
///
/// - `404`: no goal with that id owned by the caller
pub async fn delete_goal(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = Goal::delete(&state.db, auth.user_id, query.id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Goal not found".to_string()));
    }

    Ok(Json(DeletedResponse {
        message: "Goal deleted successfully".to_string(),
        id: query.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_request_flattens_changes() {
        let body = serde_json::json!({
            "id": Uuid::new_v4(),
            "current_amount": "150.50",
            "completed": true
        });

        let req: UpdateGoalRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.changes.current_amount, Some(Decimal::new(15050, 2)));
        assert_eq!(req.changes.completed, Some(true));
        assert!(req.changes.title.is_none());
        assert!(!req.changes.is_empty());
    }

    #[test]
    fn test_empty_update_detected() {
        let body = serde_json::json!({ "id": Uuid::new_v4() });

        let req: UpdateGoalRequest = serde_json::from_value(body).unwrap();
        assert!(req.changes.is_empty());
    }
}
