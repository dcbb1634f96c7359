/// HTTP implementation of the auth backend
///
/// Talks to a FinPlan API server: `GET /v1/auth` (verify), `POST /v1/auth`
/// (tagged actions), `DELETE /v1/auth` (logout). The credential travels as
/// `Authorization: Bearer <token>`.
///
/// Non-2xx responses are mapped into the [`ClientError`] taxonomy from the
/// server's `{"error": code, "message": text}` envelope; transport
/// failures become the generic connection error.

use crate::{
    backend::{AuthBackend, AuthSuccess, UserProfile},
    error::ClientError,
};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

/// Auth backend backed by a real FinPlan API server
#[derive(Debug, Clone)]
pub struct HttpAuthBackend {
    client: reqwest::Client,
    base_url: String,
}

/// Verify response wire shape
#[derive(Debug, Deserialize)]
struct VerifyBody {
    user: UserProfile,
    #[allow(dead_code)]
    valid: bool,
}

/// Server error envelope; older deployments put the text in `error`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,

    #[serde(default)]
    message: Option<String>,
}

impl HttpAuthBackend {
    /// Creates a backend for the server at `base_url`
    /// (e.g. "http://localhost:8080")
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn auth_url(&self) -> String {
        format!("{}/v1/auth", self.base_url)
    }

    /// Converts a non-2xx response into a taxonomy error
    async fn error_from_response(response: reqwest::Response) -> ClientError {
        let status = response.status().as_u16();

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message.or(body.error))
            .unwrap_or_else(|| "Request failed".to_string());

        match status {
            401 => ClientError::Unauthorized(message),
            400 | 422 => ClientError::Validation(message),
            _ => ClientError::Server { status, message },
        }
    }

    async fn post_action(&self, body: serde_json::Value) -> Result<reqwest::Response, ClientError> {
        let response = self.client.post(self.auth_url()).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response)
    }
}

#[async_trait]
impl AuthBackend for HttpAuthBackend {
    async fn login(&self, email: &str, password: &str) -> Result<AuthSuccess, ClientError> {
        let response = self
            .post_action(json!({
                "action": "login",
                "email": email,
                "password": password,
            }))
            .await?;

        Ok(response.json::<AuthSuccess>().await?)
    }

    async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<AuthSuccess, ClientError> {
        let response = self
            .post_action(json!({
                "action": "register",
                "email": email,
                "password": password,
                "first_name": first_name,
                "last_name": last_name,
            }))
            .await?;

        Ok(response.json::<AuthSuccess>().await?)
    }

    async fn verify(&self, token: &str) -> Result<UserProfile, ClientError> {
        let response = self
            .client
            .get(self.auth_url())
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(response.json::<VerifyBody>().await?.user)
    }

    async fn logout(&self, token: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.auth_url())
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<(), ClientError> {
        self.post_action(json!({
            "action": "reset_password",
            "email": email,
        }))
        .await?;

        Ok(())
    }

    async fn confirm_reset(&self, token: &str, password: &str) -> Result<(), ClientError> {
        self.post_action(json!({
            "action": "confirm_reset",
            "token": token,
            "password": password,
        }))
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_stripped() {
        let backend = HttpAuthBackend::new("http://localhost:8080/");
        assert_eq!(backend.auth_url(), "http://localhost:8080/v1/auth");
    }

    #[test]
    fn test_auth_success_parses_server_response() {
        let body = serde_json::json!({
            "token": "eyJhbGciOi...",
            "user": {
                "id": "6a2f41a3-c54c-fce8-32d2-0324e1c32e22",
                "email": "a@x.com",
                "first_name": "A",
                "last_name": "B"
            }
        });

        let success: AuthSuccess = serde_json::from_value(body).unwrap();
        assert_eq!(success.user.email, "a@x.com");
        assert!(!success.token.is_empty());
    }
}
