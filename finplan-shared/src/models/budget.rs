/// Budget model and database operations
///
/// A budget covers a date range with a total amount and per-category
/// allocations. Category rows live in `budget_categories` and cascade
/// with their budget. Amounts stay NUMERIC/[`Decimal`] throughout, so
/// category math is exact; allocations exceeding the total or spend
/// exceeding an allocation are not enforced here.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const BUDGET_COLUMNS: &str = "id, user_id, name, type, total_amount, start_date, end_date, \
                              active, created_at, updated_at";

/// Budget period kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "budget_period", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BudgetPeriod {
    /// Month-sized budget
    Monthly,

    /// Year-sized budget
    Yearly,
}

/// Budget model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Budget {
    /// Unique budget ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Budget name
    pub name: String,

    /// Monthly or yearly
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub period: BudgetPeriod,

    /// Total budgeted amount
    pub total_amount: Decimal,

    /// First day covered
    pub start_date: NaiveDate,

    /// Last day covered (≥ start_date, validated at the API boundary)
    pub end_date: NaiveDate,

    /// Whether the budget is currently active
    pub active: bool,

    /// When the budget was created
    pub created_at: DateTime<Utc>,

    /// When the budget was last updated
    pub updated_at: DateTime<Utc>,
}

/// Per-category allocation within a budget
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BudgetCategory {
    /// Unique row ID
    pub id: Uuid,

    /// Parent budget
    pub budget_id: Uuid,

    /// Category label
    pub category: String,

    /// Amount allocated to this category
    pub allocated_amount: Decimal,

    /// Amount spent against this category
    pub spent_amount: Decimal,
}

/// A budget together with its category allocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetWithCategories {
    /// The budget row
    #[serde(flatten)]
    pub budget: Budget,

    /// Its category allocations
    pub categories: Vec<BudgetCategory>,
}

/// Category input when creating or replacing allocations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryInput {
    /// Category label
    pub category: String,

    /// Allocated amount
    pub allocated_amount: Decimal,
}

/// Input for creating a new budget
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBudget {
    /// Owning user
    pub user_id: Uuid,

    /// Budget name
    pub name: String,

    /// Monthly or yearly
    #[serde(rename = "type")]
    pub period: BudgetPeriod,

    /// Total budgeted amount
    pub total_amount: Decimal,

    /// First day covered
    pub start_date: NaiveDate,

    /// Last day covered
    pub end_date: NaiveDate,

    /// Initial category allocations
    #[serde(default)]
    pub categories: Vec<CategoryInput>,
}

/// Input for updating a budget
///
/// Only non-None fields are updated. `categories = Some(...)` replaces
/// the whole allocation set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateBudget {
    /// New name
    pub name: Option<String>,

    /// New period kind
    #[serde(rename = "type")]
    pub period: Option<BudgetPeriod>,

    /// New total amount
    pub total_amount: Option<Decimal>,

    /// New start date
    pub start_date: Option<NaiveDate>,

    /// New end date
    pub end_date: Option<NaiveDate>,

    /// Activate / deactivate
    pub active: Option<bool>,

    /// Replacement category allocations
    pub categories: Option<Vec<CategoryInput>>,
}

impl UpdateBudget {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.period.is_none()
            && self.total_amount.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
            && self.active.is_none()
            && self.categories.is_none()
    }
}

impl Budget {
    /// Creates a budget and its category allocations atomically
    pub async fn create(
        pool: &PgPool,
        data: CreateBudget,
    ) -> Result<BudgetWithCategories, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let budget = sqlx::query_as::<_, Budget>(&format!(
            r#"
            INSERT INTO budgets (user_id, name, type, total_amount, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {BUDGET_COLUMNS}
            "#,
        ))
        .bind(data.user_id)
        .bind(data.name)
        .bind(data.period)
        .bind(data.total_amount)
        .bind(data.start_date)
        .bind(data.end_date)
        .fetch_one(&mut *tx)
        .await?;

        for category in &data.categories {
            sqlx::query(
                r#"
                INSERT INTO budget_categories (budget_id, category, allocated_amount)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(budget.id)
            .bind(&category.category)
            .bind(category.allocated_amount)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let categories = BudgetCategory::list_by_budget(pool, budget.id).await?;

        Ok(BudgetWithCategories { budget, categories })
    }

    /// Lists a user's budgets with their categories, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<BudgetWithCategories>, sqlx::Error> {
        let budgets = sqlx::query_as::<_, Budget>(&format!(
            r#"
            SELECT {BUDGET_COLUMNS}
            FROM budgets
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        let ids: Vec<Uuid> = budgets.iter().map(|b| b.id).collect();

        let all_categories = sqlx::query_as::<_, BudgetCategory>(
            r#"
            SELECT id, budget_id, category, allocated_amount, spent_amount
            FROM budget_categories
            WHERE budget_id = ANY($1)
            ORDER BY category
            "#,
        )
        .bind(&ids)
        .fetch_all(pool)
        .await?;

        let mut by_budget: HashMap<Uuid, Vec<BudgetCategory>> = HashMap::new();
        for category in all_categories {
            by_budget.entry(category.budget_id).or_default().push(category);
        }

        let result = budgets
            .into_iter()
            .map(|budget| {
                let categories = by_budget.remove(&budget.id).unwrap_or_default();
                BudgetWithCategories { budget, categories }
            })
            .collect();

        Ok(result)
    }

    /// Updates a budget scoped to a user
    ///
    /// Returns `Ok(None)` if the row does not exist or belongs to
    /// someone else.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        id: Uuid,
        data: UpdateBudget,
    ) -> Result<Option<BudgetWithCategories>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let mut query = String::from("UPDATE budgets SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.period.is_some() {
            bind_count += 1;
            query.push_str(&format!(", type = ${}", bind_count));
        }
        if data.total_amount.is_some() {
            bind_count += 1;
            query.push_str(&format!(", total_amount = ${}", bind_count));
        }
        if data.start_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", start_date = ${}", bind_count));
        }
        if data.end_date.is_some() {
            bind_count += 1;
            query.push_str(&format!(", end_date = ${}", bind_count));
        }
        if data.active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", active = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND user_id = $2 RETURNING {BUDGET_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Budget>(&query).bind(id).bind(user_id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(period) = data.period {
            q = q.bind(period);
        }
        if let Some(total_amount) = data.total_amount {
            q = q.bind(total_amount);
        }
        if let Some(start_date) = data.start_date {
            q = q.bind(start_date);
        }
        if let Some(end_date) = data.end_date {
            q = q.bind(end_date);
        }
        if let Some(active) = data.active {
            q = q.bind(active);
        }

        let Some(budget) = q.fetch_optional(&mut *tx).await? else {
            return Ok(None);
        };

        if let Some(categories) = data.categories {
            sqlx::query("DELETE FROM budget_categories WHERE budget_id = $1")
                .bind(budget.id)
                .execute(&mut *tx)
                .await?;

            for category in &categories {
                sqlx::query(
                    r#"
                    INSERT INTO budget_categories (budget_id, category, allocated_amount)
                    VALUES ($1, $2, $3)
                    "#,
                )
                .bind(budget.id)
                .bind(&category.category)
                .bind(category.allocated_amount)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        let categories = BudgetCategory::list_by_budget(pool, budget.id).await?;

        Ok(Some(BudgetWithCategories { budget, categories }))
    }

    /// Deletes a budget scoped to a user
    ///
    /// Returns true if a row was deleted. Categories cascade.
    pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM budgets WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl BudgetCategory {
    /// Lists the category allocations of one budget
    pub async fn list_by_budget(pool: &PgPool, budget_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let categories = sqlx::query_as::<_, BudgetCategory>(
            r#"
            SELECT id, budget_id, category, allocated_amount, spent_amount
            FROM budget_categories
            WHERE budget_id = $1
            ORDER BY category
            "#,
        )
        .bind(budget_id)
        .fetch_all(pool)
        .await?;

        Ok(categories)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_serialization() {
        assert_eq!(
            serde_json::to_value(BudgetPeriod::Monthly).unwrap(),
            "monthly"
        );
        assert_eq!(serde_json::to_value(BudgetPeriod::Yearly).unwrap(), "yearly");
    }

    #[test]
    fn test_budget_with_categories_flattens() {
        let budget = Budget {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            name: "Январь".to_string(),
            period: BudgetPeriod::Monthly,
            total_amount: Decimal::from(50000),
            start_date: "2024-01-01".parse().unwrap(),
            end_date: "2024-01-31".parse().unwrap(),
            active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let with_categories = BudgetWithCategories {
            budget,
            categories: vec![BudgetCategory {
                id: Uuid::new_v4(),
                budget_id: Uuid::new_v4(),
                category: "Продукты".to_string(),
                allocated_amount: Decimal::from(15000),
                spent_amount: Decimal::ZERO,
            }],
        };

        let json = serde_json::to_value(&with_categories).unwrap();
        // Budget fields sit at the top level, not nested under "budget"
        assert_eq!(json["name"], "Январь");
        assert_eq!(json["type"], "monthly");
        assert_eq!(json["categories"][0]["category"], "Продукты");
    }
}
