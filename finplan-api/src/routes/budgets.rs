/// Budget endpoints
///
/// All handlers require a valid bearer credential; rows are scoped to the
/// authenticated user. Category allocations travel inside the budget body.
///
/// # Endpoints
///
/// - `GET /v1/budgets` - list budgets with categories
/// - `POST /v1/budgets` - create budget (with categories)
/// - `PUT /v1/budgets` - update budget (id in body)
/// - `DELETE /v1/budgets?id=` - delete budget

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
    models::budget::{
        Budget, BudgetPeriod, BudgetWithCategories, CategoryInput, CreateBudget, UpdateBudget,
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Create budget request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBudgetRequest {
    /// Budget name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    /// Monthly or yearly
    #[serde(rename = "type")]
    pub period: BudgetPeriod,

    /// Total budgeted amount (must be positive)
    pub total_amount: Decimal,

    /// First day covered
    pub start_date: NaiveDate,

    /// Last day covered
    pub end_date: NaiveDate,

    /// Initial category allocations
    #[serde(default)]
    pub categories: Vec<CategoryInput>,
}

/// Update budget request: the id plus the fields to change
#[derive(Debug, Deserialize)]
pub struct UpdateBudgetRequest {
    /// Budget ID
    pub id: Uuid,

    /// Fields to change
    #[serde(flatten)]
    pub changes: UpdateBudget,
}

/// Delete query parameter
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Row ID to delete
    pub id: Uuid,
}

/// List budgets response
#[derive(Debug, Serialize)]
pub struct BudgetsResponse {
    /// The user's budgets, newest first
    pub budgets: Vec<BudgetWithCategories>,
}

/// Single budget response
#[derive(Debug, Serialize)]
pub struct BudgetResponse {
    /// The affected budget
    pub budget: BudgetWithCategories,
}

/// Delete acknowledgement
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    /// Human-readable acknowledgement
    pub message: String,

    /// The deleted row ID
    pub id: Uuid,
}

/// GET /v1/budgets
pub async fn list_budgets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<BudgetsResponse>> {
    let budgets = Budget::list_by_user(&state.db, auth.user_id).await?;

    Ok(Json(BudgetsResponse { budgets }))
}

/// POST /v1/budgets
///
/// # Errors
///
/// - `422`: name missing or too long
/// - `400`: non-positive total, end date before start date, or negative
///   category allocation
pub async fn create_budget(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateBudgetRequest>,
) -> ApiResult<Json<BudgetResponse>> {
    req.validate().map_err(validation_details)?;

    if req.total_amount <= Decimal::ZERO {
        return Err(ApiError::BadRequest(
            "Total amount must be positive".to_string(),
        ));
    }

    // The schema leaves the date ordering unenforced; the boundary does not
    if req.end_date < req.start_date {
        return Err(ApiError::BadRequest(
            "End date must not be before start date".to_string(),
        ));
    }

    validate_categories(&req.categories)?;

    let budget = Budget::create(
        &state.db,
        CreateBudget {
            user_id: auth.user_id,
            name: req.name.trim().to_string(),
            period: req.period,
            total_amount: req.total_amount,
            start_date: req.start_date,
            end_date: req.end_date,
            categories: req.categories,
        },
    )
    .await?;

    Ok(Json(BudgetResponse { budget }))
}

/// PUT /v1/budgets
///
/// # Errors
///
/// - `400`: empty update, non-positive total, inverted date range, or
///   negative category allocation
/// - `404`: no budget with that id owned by the caller
pub async fn update_budget(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateBudgetRequest>,
) -> ApiResult<Json<BudgetResponse>> {
    if req.changes.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    if let Some(total_amount) = req.changes.total_amount {
        if total_amount <= Decimal::ZERO {
            return Err(ApiError::BadRequest(
                "Total amount must be positive".to_string(),
            ));
        }
    }

    if let (Some(start), Some(end)) = (req.changes.start_date, req.changes.end_date) {
        if end < start {
            return Err(ApiError::BadRequest(
                "End date must not be before start date".to_string(),
            ));
        }
    }

    if let Some(ref categories) = req.changes.categories {
        validate_categories(categories)?;
    }

    let budget = Budget::update(&state.db, auth.user_id, req.id, req.changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Budget not found".to_string()))?;

    Ok(Json(BudgetResponse { budget }))
}

/// DELETE /v1/budgets?id=
///
/// # Errors
///
/// - `404`: no budget with that id owned by the caller
pub async fn delete_budget(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = Budget::delete(&state.db, auth.user_id, query.id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Budget not found".to_string()));
    }

    Ok(Json(DeletedResponse {
        message: "Budget deleted successfully".to_string(),
        id: query.id,
    }))
}

fn validate_categories(categories: &[CategoryInput]) -> ApiResult<()> {
    for category in categories {
        if category.category.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Category name is required".to_string(),
            ));
        }
        if category.allocated_amount < Decimal::ZERO {
            return Err(ApiError::BadRequest(
                "Allocated amount must not be negative".to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_shape() {
        let body = serde_json::json!({
            "name": "Январь",
            "type": "monthly",
            "total_amount": "50000",
            "start_date": "2024-01-01",
            "end_date": "2024-01-31",
            "categories": [
                { "category": "Продукты", "allocated_amount": "15000" }
            ]
        });

        let req: CreateBudgetRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.period, BudgetPeriod::Monthly);
        assert_eq!(req.categories.len(), 1);
        assert_eq!(req.categories[0].allocated_amount, Decimal::from(15000));
    }

    #[test]
    fn test_validate_categories_rejects_negative() {
        let categories = vec![CategoryInput {
            category: "Продукты".to_string(),
            allocated_amount: Decimal::from(-1),
        }];

        assert!(validate_categories(&categories).is_err());
    }

    #[test]
    fn test_update_request_flattens_changes() {
        let body = serde_json::json!({
            "id": Uuid::new_v4(),
            "active": false
        });

        let req: UpdateBudgetRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.changes.active, Some(false));
        assert!(!req.changes.is_empty());
    }
}
