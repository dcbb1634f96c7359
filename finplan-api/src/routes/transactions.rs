/// Transaction and tag endpoints
///
/// All handlers require a valid bearer credential; rows are scoped to the
/// authenticated user.
///
/// # Endpoints
///
/// - `GET /v1/transactions` - `action=list` (default, with filters),
///   `action=tags`, or `action=statistics`
/// - `POST /v1/transactions` - tagged body: `create_transaction` or `create_tag`
/// - `PUT /v1/transactions` - update transaction (id in body)
/// - `DELETE /v1/transactions?id=` - delete transaction

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
    models::{
        tag::{CreateTag, Tag, DEFAULT_TAG_COLOR},
        transaction::{
            CreateTransaction, Statistics, Transaction, TransactionFilter, TransactionKind,
            UpdateTransaction,
        },
    },
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// GET query parameters
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// "list" (default), "tags", or "statistics"
    pub action: Option<String>,

    /// Page size (list)
    pub limit: Option<i64>,

    /// Page offset (list)
    pub offset: Option<i64>,

    /// Filter by tag name (list)
    pub tag: Option<String>,

    /// Inclusive lower date bound (list, statistics)
    pub date_from: Option<NaiveDate>,

    /// Inclusive upper date bound (list, statistics)
    pub date_to: Option<NaiveDate>,

    /// Filter by direction (list)
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
}

/// Tagged POST body
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TransactionAction {
    /// Create a transaction
    CreateTransaction(CreateTransactionRequest),

    /// Create a tag
    CreateTag(CreateTagRequest),
}

/// Create transaction request
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    /// Income or expense
    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Amount (must be positive)
    pub amount: Decimal,

    /// Category label
    pub category: String,

    /// Free-form description
    #[serde(default)]
    pub description: String,

    /// The day the transaction happened
    pub date: NaiveDate,

    /// Tags to attach
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Create tag request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagRequest {
    /// Tag name
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    /// Display color; defaults to the standard blue
    pub color: Option<String>,
}

/// Update transaction request: the id plus the fields to change
#[derive(Debug, Deserialize)]
pub struct UpdateTransactionRequest {
    /// Transaction ID
    pub id: Uuid,

    /// Fields to change
    #[serde(flatten)]
    pub changes: UpdateTransaction,
}

/// Delete query parameter
#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Row ID to delete
    pub id: Uuid,
}

/// GET dispatch response
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TransactionsGetResponse {
    /// action=list
    List {
        /// Matching transactions, newest first
        transactions: Vec<Transaction>,
    },

    /// action=tags
    Tags {
        /// The user's tags, by name
        tags: Vec<Tag>,
    },

    /// action=statistics
    Statistics {
        /// Aggregates over the requested range
        statistics: Statistics,
    },
}

/// POST dispatch response
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TransactionsPostResponse {
    /// create_transaction
    Transaction {
        /// The created transaction
        transaction: Transaction,
    },

    /// create_tag
    Tag {
        /// The created tag
        tag: Tag,
    },
}

/// Single transaction response
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    /// The affected transaction
    pub transaction: Transaction,
}

/// Delete acknowledgement
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    /// Human-readable acknowledgement
    pub message: String,

    /// The deleted row ID
    pub id: Uuid,
}

/// GET /v1/transactions - list, tags, or statistics
///
/// # Errors
///
/// - `400`: unknown action
pub async fn get_transactions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<TransactionsQuery>,
) -> ApiResult<Json<TransactionsGetResponse>> {
    match query.action.as_deref().unwrap_or("list") {
        "list" => {
            let filter = TransactionFilter {
                kind: query.kind,
                tag: query.tag,
                date_from: query.date_from,
                date_to: query.date_to,
                limit: query.limit.unwrap_or(50).clamp(1, 500),
                offset: query.offset.unwrap_or(0).max(0),
            };

            let transactions = Transaction::list(&state.db, auth.user_id, filter).await?;
            Ok(Json(TransactionsGetResponse::List { transactions }))
        }
        "tags" => {
            let tags = Tag::list_by_user(&state.db, auth.user_id).await?;
            Ok(Json(TransactionsGetResponse::Tags { tags }))
        }
        "statistics" => {
            let statistics =
                Transaction::statistics(&state.db, auth.user_id, query.date_from, query.date_to)
                    .await?;
            Ok(Json(TransactionsGetResponse::Statistics { statistics }))
        }
        other => Err(ApiError::BadRequest(format!("Invalid action: {}", other))),
    }
}

/// POST /v1/transactions - create a transaction or a tag
///
/// # Errors
///
/// - `400`: non-positive amount or empty fields
/// - `409`: duplicate tag name
pub async fn transaction_action(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(action): Json<TransactionAction>,
) -> ApiResult<Json<TransactionsPostResponse>> {
    match action {
        TransactionAction::CreateTransaction(req) => {
            if req.amount <= Decimal::ZERO {
                return Err(ApiError::BadRequest("Amount must be positive".to_string()));
            }
            if req.category.trim().is_empty() {
                return Err(ApiError::BadRequest("Category is required".to_string()));
            }

            let transaction = Transaction::create(
                &state.db,
                CreateTransaction {
                    user_id: auth.user_id,
                    kind: req.kind,
                    amount: req.amount,
                    category: req.category.trim().to_string(),
                    description: req.description,
                    date: req.date,
                    tag_ids: req.tag_ids,
                },
            )
            .await?;

            Ok(Json(TransactionsPostResponse::Transaction { transaction }))
        }
        TransactionAction::CreateTag(req) => {
            req.validate().map_err(validation_details)?;

            let tag = Tag::create(
                &state.db,
                CreateTag {
                    user_id: auth.user_id,
                    name: req.name.trim().to_string(),
                    color: req.color.unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
                },
            )
            .await?;

            Ok(Json(TransactionsPostResponse::Tag { tag }))
        }
    }
}

/// PUT /v1/transactions
///
/// # Errors
///
/// - `400`: empty update or non-positive amount
/// - `404`: no transaction with that id owned by the caller
pub async fn update_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<UpdateTransactionRequest>,
) -> ApiResult<Json<TransactionResponse>> {
    if req.changes.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".to_string()));
    }

    if let Some(amount) = req.changes.amount {
        if amount <= Decimal::ZERO {
            return Err(ApiError::BadRequest("Amount must be positive".to_string()));
        }
    }

    let transaction = Transaction::update(&state.db, auth.user_id, req.id, req.changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("Transaction not found".to_string()))?;

    Ok(Json(TransactionResponse { transaction }))
}

/// DELETE /v1/transactions?id=
///
/// # Errors
///
/// - `404`: no transaction with that id owned by the caller
pub async fn delete_transaction(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Json<DeletedResponse>> {
    let deleted = Transaction::delete(&state.db, auth.user_id, query.id).await?;

    if !deleted {
        return Err(ApiError::NotFound("Transaction not found".to_string()));
    }

    Ok(Json(DeletedResponse {
        message: "Transaction deleted successfully".to_string(),
        id: query.id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_transaction_action() {
        let body = serde_json::json!({
            "action": "create_transaction",
            "type": "expense",
            "amount": 100,
            "category": "Продукты",
            "date": "2024-01-01"
        });

        let action: TransactionAction = serde_json::from_value(body).unwrap();
        match action {
            TransactionAction::CreateTransaction(req) => {
                assert_eq!(req.kind, TransactionKind::Expense);
                assert_eq!(req.amount, Decimal::from(100));
                assert_eq!(req.category, "Продукты");
                assert!(req.tag_ids.is_empty());
            }
            _ => panic!("Expected create_transaction"),
        }
    }

    #[test]
    fn test_create_tag_action() {
        let body = serde_json::json!({
            "action": "create_tag",
            "name": "еда"
        });

        let action: TransactionAction = serde_json::from_value(body).unwrap();
        match action {
            TransactionAction::CreateTag(req) => {
                assert_eq!(req.name, "еда");
                assert!(req.color.is_none());
            }
            _ => panic!("Expected create_tag"),
        }
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let body = serde_json::json!({
            "action": "delete_everything"
        });

        assert!(serde_json::from_value::<TransactionAction>(body).is_err());
    }

    #[test]
    fn test_update_request_with_tag_relink() {
        let id = Uuid::new_v4();
        let tag = Uuid::new_v4();
        let body = serde_json::json!({
            "id": id,
            "amount": "250.00",
            "tag_ids": [tag]
        });

        let req: UpdateTransactionRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.id, id);
        assert_eq!(req.changes.amount, Some(Decimal::new(25000, 2)));
        assert_eq!(req.changes.tag_ids, Some(vec![tag]));
    }
}
