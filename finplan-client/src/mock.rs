/// In-memory stub implementation of the auth backend
///
/// Behaves like a tiny FinPlan server held in a mutex: accounts, live
/// sessions, and outstanding reset tokens. Used by tests and offline
/// development; selected by constructing it, never by a runtime flag.
///
/// The stub mirrors the real server's observable contract: duplicate
/// registration conflicts, wrong passwords are unauthorized, the password
/// policy is the same 6-character minimum, and reset tokens are
/// single-use.

use crate::{
    backend::{AuthBackend, AuthSuccess, UserProfile},
    error::ClientError,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Minimum password length, kept in lockstep with the server policy
const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(Debug, Clone)]
struct MockAccount {
    id: Uuid,
    email: String,
    password: String,
    first_name: String,
    last_name: String,
    reset_token: Option<String>,
}

impl MockAccount {
    fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    /// Accounts keyed by lowercased email
    accounts: HashMap<String, MockAccount>,

    /// Live sessions: token → user id
    sessions: HashMap<String, Uuid>,
}

/// In-memory auth backend stub
#[derive(Debug, Default)]
pub struct MockAuthBackend {
    state: Mutex<MockState>,
}

impl MockAuthBackend {
    /// Creates an empty stub
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the outstanding reset token for an email, if any
    ///
    /// Stands in for reading the reset email in tests.
    pub fn reset_token_for(&self, email: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .accounts
            .get(&email.trim().to_lowercase())
            .and_then(|account| account.reset_token.clone())
    }

    fn issue_session(state: &mut MockState, user_id: Uuid) -> String {
        let token = format!("mock-session-{}", Uuid::new_v4());
        state.sessions.insert(token.clone(), user_id);
        token
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ClientError> {
        let mut state = self.state.lock().unwrap();

        let key = email.trim().to_lowercase();
        let account = state
            .accounts
            .get(&key)
            .cloned()
            .ok_or_else(|| ClientError::Unauthorized("Invalid email or password".to_string()))?;

        if account.password != password {
            return Err(ClientError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        let token = Self::issue_session(&mut state, account.id);

        Ok(AuthSuccess {
            token,
            user: account.profile(),
        })
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthSuccess, ClientError> {
        let key = email.trim().to_lowercase();

        if key.is_empty() || !key.contains('@') {
            return Err(ClientError::Validation("Invalid email format".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ClientError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let mut state = self.state.lock().unwrap();

        if state.accounts.contains_key(&key) {
            return Err(ClientError::Server {
                status: 409,
                message: "Email already exists".to_string(),
            });
        }

        let account = MockAccount {
            id: Uuid::new_v4(),
            email: key.clone(),
            password: password.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            reset_token: None,
        };

        let profile = account.profile();
        let user_id = account.id;
        state.accounts.insert(key, account);
        let token = Self::issue_session(&mut state, user_id);

        Ok(AuthSuccess {
            token,
            user: profile,
        })
    }

    async fn verify(&self, token: &str) -> Result<UserProfile, ClientError> {
        let state = self.state.lock().unwrap();

        let user_id = state
            .sessions
            .get(token)
            .copied()
            .ok_or_else(|| ClientError::Unauthorized("Invalid token".to_string()))?;

        state
            .accounts
            .values()
            .find(|account| account.id == user_id)
            .map(MockAccount::profile)
            .ok_or_else(|| ClientError::Unauthorized("Invalid token".to_string()))
    }

    async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();
        state.sessions.remove(token);
        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), ClientError> {
        let mut state = self.state.lock().unwrap();

        let key = email.trim().to_lowercase();
        if let Some(account) = state.accounts.get_mut(&key) {
            account.reset_token = Some(format!("mock-reset-{}", Uuid::new_v4()));
        }

        // Same response whether or not the account exists
        Ok(())
    }

    async fn confirm_reset(&self, token: &str, password: &str) -> Result<(), ClientError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ClientError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }

        let mut state = self.state.lock().unwrap();

        let account = state
            .accounts
            .values_mut()
            .find(|account| account.reset_token.as_deref() == Some(token))
            .ok_or_else(|| ClientError::Validation("Invalid or expired token".to_string()))?;

        account.password = password.to_string();
        account.reset_token = None;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_then_login() {
        let backend = MockAuthBackend::new();

        let registered = backend
            .register("a@x.com", "secret1", "A", "B")
            .await
            .unwrap();
        assert_eq!(registered.user.email, "a@x.com");

        let logged_in = backend.login("a@x.com", "secret1").await.unwrap();
        assert_eq!(logged_in.user.email, "a@x.com");
        assert_eq!(logged_in.user.first_name, "A");
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let backend = MockAuthBackend::new();
        backend
            .register("a@x.com", "secret1", "A", "B")
            .await
            .unwrap();

        let err = backend.login("a@x.com", "wrong").await.unwrap_err();
        assert!(!err.to_string().is_empty());
        assert!(matches!(err, ClientError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let backend = MockAuthBackend::new();
        backend
            .register("a@x.com", "secret1", "A", "B")
            .await
            .unwrap();

        let err = backend
            .register("A@X.com", "secret2", "C", "D")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Server { status: 409, .. }));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let backend = MockAuthBackend::new();
        let err = backend
            .register("a@x.com", "short", "A", "B")
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let backend = MockAuthBackend::new();
        let success = backend
            .register("a@x.com", "secret1", "A", "B")
            .await
            .unwrap();

        assert!(backend.verify(&success.token).await.is_ok());
        backend.logout(&success.token).await.unwrap();
        assert!(backend.verify(&success.token).await.is_err());
    }

    #[tokio::test]
    async fn test_reset_flow_is_single_use() {
        let backend = MockAuthBackend::new();
        backend
            .register("a@x.com", "secret1", "A", "B")
            .await
            .unwrap();

        backend.reset_password("a@x.com").await.unwrap();
        let token = backend.reset_token_for("a@x.com").unwrap();

        backend.confirm_reset(&token, "newpass1").await.unwrap();

        // Old password no longer works, new one does
        assert!(backend.login("a@x.com", "secret1").await.is_err());
        assert!(backend.login("a@x.com", "newpass1").await.is_ok());

        // Token is spent
        let err = backend.confirm_reset(&token, "another1").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reset_for_unknown_email_is_silent() {
        let backend = MockAuthBackend::new();
        assert!(backend.reset_password("nobody@x.com").await.is_ok());
    }
}
