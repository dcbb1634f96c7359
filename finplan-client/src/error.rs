/// Client error taxonomy
///
/// Every request failure becomes one of four kinds, mirroring how the UI
/// reacts: a generic connection message, an authentication failure (which
/// clears the session), a field-level validation message (kept next to
/// the form), or a status-driven server error. Errors are values; nothing
/// here ever panics the caller.

/// Error type for client-side operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// The request never reached the server, or the response never arrived
    #[error("Connection error. Please try again.")]
    Network,

    /// The server rejected the credential or the login attempt
    #[error("{0}")]
    Unauthorized(String),

    /// The server rejected a field value; surfaced next to the form
    #[error("{0}")]
    Validation(String),

    /// Any other non-success status
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,

        /// Message from the error envelope, or a generic fallback
        message: String,
    },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        tracing::debug!("Request failed: {}", err);
        ClientError::Network
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages_are_human_readable() {
        assert_eq!(
            ClientError::Network.to_string(),
            "Connection error. Please try again."
        );
        assert_eq!(
            ClientError::Unauthorized("Invalid email or password".to_string()).to_string(),
            "Invalid email or password"
        );
        assert_eq!(
            ClientError::Server {
                status: 500,
                message: "An internal error occurred".to_string()
            }
            .to_string(),
            "Server error (500): An internal error occurred"
        );
    }
}
