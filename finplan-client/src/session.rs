/// The client session state machine
///
/// A process-wide auth context with an explicit lifecycle: [`AuthSession::init`]
/// on page load (verify whatever credential was stored) and
/// [`AuthSession::logout`] as teardown. Views receive the session by
/// reference from whoever owns it; nothing here is a global.
///
/// # State Machine
///
/// ```text
/// Unauthenticated ──login/register ok──▶ Authenticated
/// Unauthenticated ◀──logout (always)──── Authenticated
///
/// init(stored):  * ──▶ Verifying ──verify ok──▶ Authenticated
///                               └─otherwise──▶ Unauthenticated
/// ```
///
/// The credential is an opaque bearer token held by the session (the
/// local-storage variant); callers persist `token()` between runs and
/// feed it back into `init`.

use crate::{
    backend::{AuthBackend, UserProfile},
    error::ClientError,
};
use std::sync::Arc;

/// Session lifecycle states
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No valid credential
    Unauthenticated,

    /// A stored credential is being checked against the server
    Verifying,

    /// The credential proved this user
    Authenticated(UserProfile),
}

/// The client auth session
pub struct AuthSession {
    backend: Arc<dyn AuthBackend>,
    state: SessionState,
    token: Option<String>,
}

impl AuthSession {
    /// Creates a session over the given backend, unauthenticated
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        Self {
            backend,
            state: SessionState::Unauthenticated,
            token: None,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The authenticated user, if any
    pub fn user(&self) -> Option<&UserProfile> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// The current credential, for persistence between runs
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// True iff the session holds a verified credential
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    /// Page-load lifecycle: verifies a stored credential
    ///
    /// Passes through `Verifying`; ends `Authenticated` when the backend
    /// vouches for the token and `Unauthenticated` otherwise. Every
    /// failure, including a network failure, degrades to
    /// `Unauthenticated`; the UI renders the login screen rather than
    /// crashing.
    pub async fn init(&mut self, stored_token: Option<String>) {
        self.state = SessionState::Verifying;

        let Some(token) = stored_token else {
            self.state = SessionState::Unauthenticated;
            return;
        };

        match self.backend.verify(&token).await {
            Ok(user) => {
                self.token = Some(token);
                self.state = SessionState::Authenticated(user);
            }
            Err(err) => {
                tracing::debug!("Stored credential rejected: {}", err);
                self.token = None;
                self.state = SessionState::Unauthenticated;
            }
        }
    }

    /// Authenticates with email + password
    ///
    /// On success the session stores the credential and becomes
    /// `Authenticated`. On failure the session is left as it was and the
    /// human-readable error is returned for the form.
    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
    ) -> Result<UserProfile, ClientError> {
        let success = self.backend.login(email, password).await?;

        self.token = Some(success.token);
        self.state = SessionState::Authenticated(success.user.clone());

        Ok(success.user)
    }

    /// Creates an account and authenticates it
    ///
    /// Same contract as [`login`](Self::login).
    pub async fn register(
        &mut self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<UserProfile, ClientError> {
        let success = self
            .backend
            .register(email, password, first_name, last_name)
            .await?;

        self.token = Some(success.token);
        self.state = SessionState::Authenticated(success.user.clone());

        Ok(success.user)
    }

    /// Teardown: clears the credential and transitions to
    /// `Unauthenticated` unconditionally
    ///
    /// The server is notified fire-and-forget from a spawned task; a dead
    /// network cannot keep the user logged in. Must be called from within
    /// a tokio runtime.
    pub fn logout(&mut self) {
        let token = self.token.take();
        self.state = SessionState::Unauthenticated;

        if let Some(token) = token {
            let backend = Arc::clone(&self.backend);
            tokio::spawn(async move {
                if let Err(err) = backend.logout(&token).await {
                    tracing::debug!("Best-effort logout notification failed: {}", err);
                }
            });
        }
    }

    /// Requests a password reset; never alters session state
    pub async fn reset_password(&self, email: &str) -> Result<(), ClientError> {
        self.backend.reset_password(email).await
    }

    /// Redeems a reset token; never alters session state
    pub async fn confirm_reset(&self, token: &str, password: &str) -> Result<(), ClientError> {
        self.backend.confirm_reset(token, password).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockAuthBackend;

    fn session() -> AuthSession {
        AuthSession::new(Arc::new(MockAuthBackend::new()))
    }

    #[tokio::test]
    async fn test_init_without_stored_credential() {
        let mut session = session();
        session.init(None).await;

        assert_eq!(*session.state(), SessionState::Unauthenticated);
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn test_register_then_login_roundtrip() {
        let mut session = session();

        let registered = session
            .register("a@x.com", "secret1", "A", "B")
            .await
            .unwrap();
        assert_eq!(registered.email, "a@x.com");
        assert!(session.is_authenticated());

        // A fresh session against the same backend can log straight in
        let backend = Arc::clone(&session.backend);
        let mut second = AuthSession::new(backend);
        let user = second.login("a@x.com", "secret1").await.unwrap();

        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.first_name, "A");
        assert!(second.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_failure_keeps_session_unauthenticated() {
        let mut session = session();
        session
            .register("a@x.com", "secret1", "A", "B")
            .await
            .unwrap();
        session.logout();

        let err = session.login("a@x.com", "wrong").await.unwrap_err();
        assert!(!err.to_string().is_empty());
        assert_eq!(*session.state(), SessionState::Unauthenticated);
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn test_logout_clears_credential_immediately() {
        let mut session = session();
        session
            .register("a@x.com", "secret1", "A", "B")
            .await
            .unwrap();
        assert!(session.token().is_some());

        session.logout();

        // No credential, no user: a verification pass now reports
        // unauthenticated without asking the server
        assert_eq!(*session.state(), SessionState::Unauthenticated);
        assert!(session.token().is_none());

        let stored = session.token().map(str::to_string);
        session.init(stored).await;
        assert_eq!(*session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_init_with_valid_stored_credential() {
        let backend = Arc::new(MockAuthBackend::new());

        let mut first = AuthSession::new(Arc::clone(&backend) as Arc<dyn AuthBackend>);
        first.register("a@x.com", "secret1", "A", "B").await.unwrap();
        let stored = first.token().map(str::to_string);

        // "Next page load": a new session picks up the stored token
        let mut second = AuthSession::new(backend);
        second.init(stored).await;

        assert!(second.is_authenticated());
        assert_eq!(second.user().unwrap().email, "a@x.com");
    }

    #[tokio::test]
    async fn test_init_with_garbage_credential() {
        let mut session = session();
        session.init(Some("mock-session-forged".to_string())).await;

        assert_eq!(*session.state(), SessionState::Unauthenticated);
        assert!(session.token().is_none());
    }

    #[tokio::test]
    async fn test_reset_flows_do_not_touch_state() {
        let backend = Arc::new(MockAuthBackend::new());
        let mut session = AuthSession::new(Arc::clone(&backend) as Arc<dyn AuthBackend>);
        session
            .register("a@x.com", "secret1", "A", "B")
            .await
            .unwrap();

        session.reset_password("a@x.com").await.unwrap();
        assert!(session.is_authenticated());

        let token = backend.reset_token_for("a@x.com").unwrap();
        session.confirm_reset(&token, "newpass1").await.unwrap();
        assert!(session.is_authenticated());
    }
}
