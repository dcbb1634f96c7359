/// Database models for FinPlan
///
/// This module contains all database models and their CRUD operations.
/// Every query on a user-owned entity is scoped by `user_id`; ownership
/// is part of the WHERE clause, so a row the caller does not own behaves
/// exactly like a row that does not exist.
///
/// # Models
///
/// - `user`: User accounts, credentials, and reset tokens
/// - `tag`: Per-user transaction tags
/// - `transaction`: Income/expense transactions with tag links
/// - `goal`: Savings goals
/// - `budget`: Budgets and their category allocations
/// - `calendar_event`: Financial calendar events
///
/// # Example
///
/// ```no_run
/// use finplan_shared::models::user::{CreateUser, User};
/// use finplan_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::create(&pool, CreateUser {
///     email: "user@example.com".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     first_name: "John".to_string(),
///     last_name: "Doe".to_string(),
/// }).await?;
/// # Ok(())
/// # }
/// ```

pub mod budget;
pub mod calendar_event;
pub mod goal;
pub mod tag;
pub mod transaction;
pub mod user;
