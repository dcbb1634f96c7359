/// Transaction model and database operations
///
/// Transactions are the core entity of FinPlan: a dated income or expense
/// amount with a category, an optional description, and any number of
/// tags. Amounts are `NUMERIC(14, 2)` in Postgres and [`Decimal`] in Rust,
/// so currency arithmetic is exact end to end.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE transaction_type AS ENUM ('income', 'expense');
///
/// CREATE TABLE transactions (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     type transaction_type NOT NULL,
///     amount NUMERIC(14, 2) NOT NULL CHECK (amount > 0),
///     category VARCHAR(100) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     date DATE NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE transaction_tags (
///     transaction_id UUID NOT NULL REFERENCES transactions(id) ON DELETE CASCADE,
///     tag_id UUID NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
///     PRIMARY KEY (transaction_id, tag_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use finplan_shared::models::transaction::{CreateTransaction, Transaction, TransactionKind};
/// use finplan_shared::db::pool::{create_pool, DatabaseConfig};
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let created = Transaction::create(&pool, CreateTransaction {
///     user_id: Uuid::new_v4(),
///     kind: TransactionKind::Expense,
///     amount: Decimal::new(10000, 2), // 100.00
///     category: "Продукты".to_string(),
///     description: String::new(),
///     date: "2024-01-01".parse()?,
///     tag_ids: vec![],
/// }).await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

/// Transaction direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in
    Income,

    /// Money going out
    Expense,
}

impl TransactionKind {
    /// String form matching the database enum
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// Tag shape embedded in transaction listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    /// Tag ID
    pub id: Uuid,

    /// Tag name
    pub name: String,

    /// Display color
    pub color: String,
}

/// Transaction row with its tags aggregated in
///
/// Produced by the listing queries, which fold the `transaction_tags`
/// join into a JSON array per row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    /// Unique transaction ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Income or expense
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Amount, always positive; direction comes from `type`
    pub amount: Decimal,

    /// Category label
    pub category: String,

    /// Free-form description
    pub description: String,

    /// The day the transaction happened
    pub date: NaiveDate,

    /// Attached tags
    pub tags: Json<Vec<TagRef>>,

    /// When the row was created
    pub created_at: DateTime<Utc>,

    /// When the row was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTransaction {
    /// Owning user
    pub user_id: Uuid,

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

    /// Tags to link; ids not owned by the user are silently skipped
    #[serde(default)]
    pub tag_ids: Vec<Uuid>,
}

/// Input for updating a transaction
///
/// Only non-None fields are updated. `tag_ids = Some(...)` replaces the
/// full tag set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTransaction {
    /// New direction
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,

    /// New amount
    pub amount: Option<Decimal>,

    /// New category
    pub category: Option<String>,

    /// New description
    pub description: Option<String>,

    /// New date
    pub date: Option<NaiveDate>,

    /// Replacement tag set
    pub tag_ids: Option<Vec<Uuid>>,
}

impl UpdateTransaction {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.amount.is_none()
            && self.category.is_none()
            && self.description.is_none()
            && self.date.is_none()
            && self.tag_ids.is_none()
    }
}

/// Listing filters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Only this direction
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,

    /// Only transactions carrying a tag with this name
    pub tag: Option<String>,

    /// Inclusive lower date bound
    pub date_from: Option<NaiveDate>,

    /// Inclusive upper date bound
    pub date_to: Option<NaiveDate>,

    /// Page size
    pub limit: i64,

    /// Page offset
    pub offset: i64,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        Self {
            kind: None,
            tag: None,
            date_from: None,
            date_to: None,
            limit: 50,
            offset: 0,
        }
    }
}

/// Per-direction aggregate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TotalsEntry {
    /// Sum of amounts
    pub total: Decimal,

    /// Number of transactions
    pub count: i64,
}

/// Aggregates keyed by direction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatisticsTotals {
    /// Income aggregate
    pub income: TotalsEntry,

    /// Expense aggregate
    pub expense: TotalsEntry,
}

/// Per-category aggregate
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CategoryTotal {
    /// Category label
    pub category: String,

    /// Direction of the aggregated transactions
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Sum of amounts
    pub total: Decimal,

    /// Number of transactions
    pub count: i64,
}

/// Per-tag aggregate
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagTotal {
    /// Tag name
    pub name: String,

    /// Tag color
    pub color: String,

    /// Sum of amounts
    pub total: Decimal,

    /// Number of transactions
    pub count: i64,
}

/// Transaction statistics over an optional date range
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    /// Totals keyed by direction
    pub totals: StatisticsTotals,

    /// Income minus expense, exact
    pub balance: Decimal,

    /// Per-category breakdown, largest first
    pub by_category: Vec<CategoryTotal>,

    /// Per-tag breakdown, largest first
    pub by_tags: Vec<TagTotal>,
}

const SELECT_WITH_TAGS: &str = r#"
    SELECT t.id, t.user_id, t.type, t.amount, t.category, t.description, t.date,
           COALESCE(
               json_agg(json_build_object('id', tag.id, 'name', tag.name, 'color', tag.color))
               FILTER (WHERE tag.id IS NOT NULL),
               '[]'::json
           ) AS tags,
           t.created_at, t.updated_at
    FROM transactions t
    LEFT JOIN transaction_tags tt ON t.id = tt.transaction_id
    LEFT JOIN tags tag ON tt.tag_id = tag.id
"#;

impl Transaction {
    /// Creates a transaction and links its tags atomically
    ///
    /// Tag ids that do not exist or belong to another user are skipped
    /// rather than failing the whole create.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert violates a constraint (e.g. the
    /// positive-amount CHECK) or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateTransaction) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO transactions (user_id, type, amount, category, description, date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(data.user_id)
        .bind(data.kind)
        .bind(data.amount)
        .bind(&data.category)
        .bind(&data.description)
        .bind(data.date)
        .fetch_one(&mut *tx)
        .await?;

        if !data.tag_ids.is_empty() {
            link_tags(&mut tx, id, data.user_id, &data.tag_ids).await?;
        }

        tx.commit().await?;

        Self::find_by_id(pool, data.user_id, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds one transaction (with tags) scoped to a user
    pub async fn find_by_id(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "{SELECT_WITH_TAGS} WHERE t.user_id = $1 AND t.id = $2 GROUP BY t.id",
        );

        let transaction = sqlx::query_as::<_, Transaction>(&query)
            .bind(user_id)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(transaction)
    }

    /// Lists a user's transactions with optional filters
    ///
    /// Results are ordered by date (newest first), then creation time.
    pub async fn list(
        pool: &PgPool,
        user_id: Uuid,
        filter: TransactionFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        // Build the WHERE clause based on which filters are present
        let mut query = format!("{SELECT_WITH_TAGS} WHERE t.user_id = $1");
        let mut bind_count = 1;

        if filter.kind.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.type = ${}", bind_count));
        }
        if filter.date_from.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.date >= ${}", bind_count));
        }
        if filter.date_to.is_some() {
            bind_count += 1;
            query.push_str(&format!(" AND t.date <= ${}", bind_count));
        }
        if filter.tag.is_some() {
            bind_count += 1;
            query.push_str(&format!(
                " AND EXISTS (SELECT 1 FROM transaction_tags x \
                 JOIN tags g ON g.id = x.tag_id \
                 WHERE x.transaction_id = t.id AND g.name = ${})",
                bind_count
            ));
        }

        query.push_str(" GROUP BY t.id ORDER BY t.date DESC, t.created_at DESC");
        query.push_str(&format!(
            " LIMIT ${} OFFSET ${}",
            bind_count + 1,
            bind_count + 2
        ));

        let mut q = sqlx::query_as::<_, Transaction>(&query).bind(user_id);

        if let Some(kind) = filter.kind {
            q = q.bind(kind);
        }
        if let Some(date_from) = filter.date_from {
            q = q.bind(date_from);
        }
        if let Some(date_to) = filter.date_to {
            q = q.bind(date_to);
        }
        if let Some(tag) = filter.tag {
            q = q.bind(tag);
        }

        let transactions = q.bind(filter.limit).bind(filter.offset).fetch_all(pool).await?;

        Ok(transactions)
    }

    /// Updates a transaction scoped to a user
    ///
    /// Returns `Ok(None)` if the row does not exist or belongs to someone
    /// else. A `tag_ids` value replaces the whole tag set.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        data: UpdateTransaction,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let owned: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM transactions WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        if owned.is_none() {
            return Ok(None);
        }

        let mut query = String::from("UPDATE transactions SET updated_at = NOW()");
        let mut bind_count = 1;

        if data.kind.is_some() {
            bind_count += 1;
            query.push_str(&format!(", type = ${}", bind_count));
        }
        if data.amount.is_some() {
            bind_count += 1;
            query.push_str(&format!(", amount = ${}", bind_count));
        }
        if data.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", date = ${}", bind_count));
        }

        query.push_str(" WHERE id = $1");

        let mut q = sqlx::query(&query).bind(id);

        if let Some(kind) = data.kind {
            q = q.bind(kind);
        }
        if let Some(amount) = data.amount {
            q = q.bind(amount);
        }
        if let Some(category) = data.category {
            q = q.bind(category);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(date) = data.date {
            q = q.bind(date);
        }

        q.execute(&mut *tx).await?;

        if let Some(tag_ids) = data.tag_ids {
            sqlx::query("DELETE FROM transaction_tags WHERE transaction_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await?;

            if !tag_ids.is_empty() {
                link_tags(&mut tx, id, user_id, &tag_ids).await?;
            }
        }

        tx.commit().await?;

        Self::find_by_id(pool, user_id, id).await
    }

    /// Deletes a transaction scoped to a user
    ///
    /// Returns true if a row was deleted. Tag links cascade.
    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Computes statistics over an optional date range
    ///
    /// All sums are NUMERIC in the database and [`Decimal`] in Rust;
    /// the balance (income − expense) never drifts.
    pub async fn statistics(
        pool: &PgPool,
        user_id: Uuid,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> Result<Statistics, sqlx::Error> {
        let by_kind: Vec<(TransactionKind, Decimal, i64)> = sqlx::query_as(
            r#"
            SELECT type, SUM(amount) AS total, COUNT(*) AS count
            FROM transactions
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            GROUP BY type
            "#,
        )
        .bind(user_id)
        .bind(date_from)
        .bind(date_to)
        .fetch_all(pool)
        .await?;

        let mut totals = StatisticsTotals::default();
        for (kind, total, count) in by_kind {
            let entry = TotalsEntry { total, count };
            match kind {
                TransactionKind::Income => totals.income = entry,
                TransactionKind::Expense => totals.expense = entry,
            }
        }

        let by_category = sqlx::query_as::<_, CategoryTotal>(
            r#"
            SELECT category, type, SUM(amount) AS total, COUNT(*) AS count
            FROM transactions
            WHERE user_id = $1
              AND ($2::date IS NULL OR date >= $2)
              AND ($3::date IS NULL OR date <= $3)
            GROUP BY category, type
            ORDER BY total DESC
            "#,
        )
        .bind(user_id)
        .bind(date_from)
        .bind(date_to)
        .fetch_all(pool)
        .await?;

        let by_tags = sqlx::query_as::<_, TagTotal>(
            r#"
            SELECT tag.name, tag.color, SUM(t.amount) AS total, COUNT(t.id) AS count
            FROM transactions t
            JOIN transaction_tags tt ON t.id = tt.transaction_id
            JOIN tags tag ON tt.tag_id = tag.id
            WHERE t.user_id = $1
              AND ($2::date IS NULL OR t.date >= $2)
              AND ($3::date IS NULL OR t.date <= $3)
            GROUP BY tag.id, tag.name, tag.color
            ORDER BY total DESC
            "#,
        )
        .bind(user_id)
        .bind(date_from)
        .bind(date_to)
        .fetch_all(pool)
        .await?;

        let balance = totals.income.total - totals.expense.total;

        Ok(Statistics {
            totals,
            balance,
            by_category,
            by_tags,
        })
    }
}

/// Links tags to a transaction, skipping ids the user does not own
async fn link_tags(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    transaction_id: Uuid,
    user_id: Uuid,
    tag_ids: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO transaction_tags (transaction_id, tag_id)
        SELECT $1, t.id FROM tags t
        WHERE t.id = ANY($2) AND t.user_id = $3
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(transaction_id)
    .bind(tag_ids)
    .bind(user_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serialization() {
        assert_eq!(
            serde_json::to_value(TransactionKind::Income).unwrap(),
            "income"
        );
        assert_eq!(
            serde_json::to_value(TransactionKind::Expense).unwrap(),
            "expense"
        );
        assert_eq!(TransactionKind::Income.as_str(), "income");
    }

    #[test]
    fn test_transaction_json_shape() {
        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            kind: TransactionKind::Expense,
            amount: Decimal::new(10000, 2),
            category: "Продукты".to_string(),
            description: String::new(),
            date: "2024-01-01".parse().unwrap(),
            tags: Json(vec![TagRef {
                id: Uuid::new_v4(),
                name: "еда".to_string(),
                color: "#3B82F6".to_string(),
            }]),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&transaction).unwrap();
        assert_eq!(json["type"], "expense");
        assert_eq!(json["category"], "Продукты");
        assert_eq!(json["tags"][0]["name"], "еда");
        // Decimal serializes as an exact string, never a float
        assert_eq!(json["amount"], "100.00");
    }

    #[test]
    fn test_filter_defaults() {
        let filter = TransactionFilter::default();
        assert_eq!(filter.limit, 50);
        assert_eq!(filter.offset, 0);
        assert!(filter.kind.is_none());
        assert!(filter.tag.is_none());
    }

    #[test]
    fn test_balance_is_exact() {
        // 0.1 + 0.2 style drift is impossible with Decimal
        let income = TotalsEntry {
            total: Decimal::new(30, 1), // 3.0
            count: 2,
        };
        let expense = TotalsEntry {
            total: Decimal::new(1, 1) + Decimal::new(2, 1), // 0.1 + 0.2
            count: 2,
        };

        let balance = income.total - expense.total;
        assert_eq!(balance, Decimal::new(27, 1)); // exactly 2.7
        assert_eq!(balance.to_string(), "2.7");
    }

    #[test]
    fn test_create_request_deserializes_spec_payload() {
        let payload = serde_json::json!({
            "user_id": Uuid::new_v4(),
            "type": "expense",
            "amount": 100,
            "category": "Продукты",
            "date": "2024-01-01"
        });

        let create: CreateTransaction = serde_json::from_value(payload).unwrap();
        assert_eq!(create.kind, TransactionKind::Expense);
        assert_eq!(create.amount, Decimal::new(100, 0));
        assert_eq!(create.category, "Продукты");
        assert!(create.tag_ids.is_empty());
    }
}
