/// Authentication endpoint
///
/// One endpoint carries the whole credential lifecycle, action-dispatched
/// the way the clients expect it:
///
/// - `GET /v1/auth` - verify the bearer credential, returns `{user, valid}`
/// - `POST /v1/auth` - tagged body: `{"action": "login" | "register" |
///   "reset_password" | "confirm_reset", ...}`
/// - `DELETE /v1/auth` - logout acknowledgement
///
/// Sessions are stateless JWTs; logout is client-side credential disposal
/// and the DELETE handler only acknowledges it.

use crate::{
    app::AppState,
    error::{validation_details, ApiError, ApiResult},
};
use axum::{extract::State, http::HeaderMap, Json};
use finplan_shared::{
    auth::{
        jwt,
        middleware::bearer_token,
        password,
        reset_token::{generate_reset_token, reset_token_expiry},
    },
    models::user::{CreateUser, User, UserProfile},
};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Tagged auth action body
///
/// The payload shape is validated at the boundary: an unknown action or a
/// missing field fails deserialization before any handler logic runs.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuthAction {
    /// Authenticate with email + password
    Login(LoginRequest),

    /// Create a new account
    Register(RegisterRequest),

    /// Request a password reset token
    ResetPassword(ResetPasswordRequest),

    /// Redeem a reset token for a new password
    ConfirmReset(ConfirmResetRequest),
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    pub email: String,

    /// Password
    pub password: String,
}

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (policy-checked separately)
    pub password: String,

    /// Given name
    #[serde(default)]
    #[validate(length(max = 255, message = "First name must be at most 255 characters"))]
    pub first_name: String,

    /// Family name
    #[serde(default)]
    #[validate(length(max = 255, message = "Last name must be at most 255 characters"))]
    pub last_name: String,
}

/// Reset-password request
#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// Confirm-reset request
#[derive(Debug, Deserialize)]
pub struct ConfirmResetRequest {
    /// The reset token from the email link
    pub token: String,

    /// The new password
    pub password: String,
}

/// Token + user response for login and register
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Bearer session token (7-day JWT)
    pub token: String,

    /// The authenticated user
    pub user: UserProfile,
}

/// Credential verification response
#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    /// The authenticated user
    pub user: UserProfile,

    /// Always true on success; failures are 401s
    pub valid: bool,
}

/// Plain acknowledgement response
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    /// Human-readable acknowledgement
    pub message: String,
}

/// Response of the POST dispatch: token+user or an acknowledgement
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AuthActionResponse {
    /// login / register
    Auth(AuthResponse),

    /// reset_password / confirm_reset
    Message(MessageResponse),
}

/// POST /v1/auth - dispatches on the tagged action
pub async fn auth_action(
    State(state): State<AppState>,
    Json(action): Json<AuthAction>,
) -> ApiResult<Json<AuthActionResponse>> {
    let response = match action {
        AuthAction::Login(req) => AuthActionResponse::Auth(login(&state, req).await?),
        AuthAction::Register(req) => AuthActionResponse::Auth(register(&state, req).await?),
        AuthAction::ResetPassword(req) => {
            AuthActionResponse::Message(reset_password(&state, req).await?)
        }
        AuthAction::ConfirmReset(req) => {
            AuthActionResponse::Message(confirm_reset(&state, req).await?)
        }
    };

    Ok(Json(response))
}

/// Registers a new user and issues a session token
///
/// # Errors
///
/// - `422`: email format or name length invalid
/// - `400`: password shorter than the policy minimum
/// - `409`: email already registered
async fn register(state: &AppState, req: RegisterRequest) -> ApiResult<AuthResponse> {
    req.validate().map_err(validation_details)?;

    password::validate_password_policy(&req.password).map_err(ApiError::BadRequest)?;

    let email = req.email.trim().to_lowercase();
    let password_hash = password::hash_password(&req.password)?;

    // The unique constraint on email turns a duplicate into a 409
    let user = User::create(
        &state.db,
        CreateUser {
            email,
            password_hash,
            first_name: req.first_name,
            last_name: req.last_name,
        },
    )
    .await?;

    let claims = jwt::Claims::new(user.id, user.email.clone());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    tracing::info!(user_id = %user.id, "New user registered");

    Ok(AuthResponse {
        token,
        user: user.profile(),
    })
}

/// Authenticates a user and issues a session token
///
/// # Errors
///
/// - `400`: missing email or password
/// - `401`: unknown email or wrong password (indistinguishable on purpose)
async fn login(state: &AppState, req: LoginRequest) -> ApiResult<AuthResponse> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let email = req.email.trim().to_lowercase();

    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::update_last_login(&state.db, user.id).await?;

    let claims = jwt::Claims::new(user.id, user.email.clone());
    let token = jwt::create_token(&claims, state.jwt_secret())?;

    Ok(AuthResponse {
        token,
        user: user.profile(),
    })
}

/// Issues a reset token for the account, if it exists
///
/// The response never reveals whether the email has an account. Token
/// delivery (email) happens outside this service; the token is stored on
/// the user row with a one-hour expiry.
async fn reset_password(state: &AppState, req: ResetPasswordRequest) -> ApiResult<MessageResponse> {
    req.validate().map_err(validation_details)?;

    let email = req.email.trim().to_lowercase();

    if let Some(user) = User::find_by_email(&state.db, &email).await? {
        let token = generate_reset_token();
        User::set_reset_token(&state.db, user.id, &token, reset_token_expiry()).await?;

        tracing::info!(user_id = %user.id, "Password reset token issued");
    }

    Ok(MessageResponse {
        message: "Reset email sent if account exists".to_string(),
    })
}

/// Redeems a reset token and sets the new password
///
/// # Errors
///
/// - `400`: missing fields, policy violation, or invalid/expired token
async fn confirm_reset(state: &AppState, req: ConfirmResetRequest) -> ApiResult<MessageResponse> {
    if req.token.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "Token and new password are required".to_string(),
        ));
    }

    password::validate_password_policy(&req.password).map_err(ApiError::BadRequest)?;

    let user = User::find_by_valid_reset_token(&state.db, &req.token)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid or expired token".to_string()))?;

    let password_hash = password::hash_password(&req.password)?;

    // Clears the token, so it cannot be redeemed twice
    User::complete_password_reset(&state.db, user.id, &password_hash).await?;

    tracing::info!(user_id = %user.id, "Password reset completed");

    Ok(MessageResponse {
        message: "Password reset successful".to_string(),
    })
}

/// GET /v1/auth - verifies the bearer credential
///
/// # Errors
///
/// - `401`: missing, malformed, expired, or otherwise invalid credential,
///   or a token whose user no longer exists
pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<VerifyResponse>> {
    let token = bearer_token(&headers)
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())
        .map_err(|_| ApiError::Unauthorized("Invalid token".to_string()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    Ok(Json(VerifyResponse {
        user: user.profile(),
        valid: true,
    }))
}

/// DELETE /v1/auth - logout acknowledgement
///
/// Sessions are stateless; the client discards its token and this handler
/// just acknowledges. It deliberately accepts unauthenticated calls so a
/// client with a broken credential can still "log out".
pub async fn logout() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_dispatch_login() {
        let body = serde_json::json!({
            "action": "login",
            "email": "a@x.com",
            "password": "secret1"
        });

        let action: AuthAction = serde_json::from_value(body).unwrap();
        match action {
            AuthAction::Login(req) => {
                assert_eq!(req.email, "a@x.com");
                assert_eq!(req.password, "secret1");
            }
            _ => panic!("Expected login action"),
        }
    }

    #[test]
    fn test_action_dispatch_register() {
        let body = serde_json::json!({
            "action": "register",
            "email": "a@x.com",
            "password": "secret1",
            "first_name": "A",
            "last_name": "B"
        });

        let action: AuthAction = serde_json::from_value(body).unwrap();
        match action {
            AuthAction::Register(req) => {
                assert_eq!(req.first_name, "A");
                assert_eq!(req.last_name, "B");
            }
            _ => panic!("Expected register action"),
        }
    }

    #[test]
    fn test_register_names_default_to_empty() {
        let body = serde_json::json!({
            "action": "register",
            "email": "a@x.com",
            "password": "secret1"
        });

        let action: AuthAction = serde_json::from_value(body).unwrap();
        match action {
            AuthAction::Register(req) => {
                assert_eq!(req.first_name, "");
                assert_eq!(req.last_name, "");
            }
            _ => panic!("Expected register action"),
        }
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let body = serde_json::json!({
            "action": "impersonate",
            "email": "a@x.com"
        });

        assert!(serde_json::from_value::<AuthAction>(body).is_err());
    }

    #[test]
    fn test_confirm_reset_shape() {
        let body = serde_json::json!({
            "action": "confirm_reset",
            "token": "deadbeef",
            "password": "newpass1"
        });

        let action: AuthAction = serde_json::from_value(body).unwrap();
        assert!(matches!(action, AuthAction::ConfirmReset(_)));
    }
}
