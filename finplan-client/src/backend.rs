/// The auth backend capability
///
/// Everything the session state machine needs from a server, expressed as
/// one async trait: {login, register, verify, logout, reset_password,
/// confirm_reset}. The real implementation is [`crate::http::HttpAuthBackend`];
/// tests use [`crate::mock::MockAuthBackend`]. Code holding an
/// `Arc<dyn AuthBackend>` cannot tell them apart, which is the point.

use crate::error::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The wire shape of a user, as the auth endpoint returns it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User ID
    pub id: Uuid,

    /// Email address
    pub email: String,

    /// Given name
    pub first_name: String,

    /// Family name
    pub last_name: String,
}

/// Successful login or registration: a credential plus the user it proves
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSuccess {
    /// Opaque bearer token
    pub token: String,

    /// The authenticated user
    pub user: UserProfile,
}

/// Server capability behind the session state machine
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Authenticates with email + password
    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ClientError>;

    /// Creates a new account and authenticates it
    async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthSuccess, ClientError>;

    /// Checks whether a stored credential is still valid
    async fn verify(&self, token: &str) -> Result<UserProfile, ClientError>;

    /// Tells the server the credential is being discarded (best-effort)
    async fn logout(&self, token: &str) -> Result<(), ClientError>;

    /// Requests a password reset for the email, if an account exists
    async fn reset_password(&self, email: &str) -> Result<(), ClientError>;

    /// Redeems a reset token for a new password
    async fn confirm_reset(&self, token: &str, password: &str) -> Result<(), ClientError>;
}
