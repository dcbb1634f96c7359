/// Authentication utilities
///
/// This module provides the authentication primitives for FinPlan:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and policy checks
/// - [`jwt`]: JWT session token generation and validation
/// - [`reset_token`]: single-use password reset tokens
/// - [`middleware`]: request auth context for axum handlers
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Session Tokens**: HS256-signed JWTs with issuer and expiry checks
/// - **Reset Tokens**: 32 bytes of OS randomness, hex-encoded, 1 hour validity
///
/// # Example
///
/// ```no_run
/// use finplan_shared::auth::password::{hash_password, verify_password};
/// use finplan_shared::auth::jwt::{create_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "user@example.com".to_string());
/// let token = create_token(&claims, "secret-key-at-least-32-bytes-long")?;
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod reset_token;
