/// Password reset token utilities
///
/// Reset tokens are opaque single-use secrets mailed to the user (mail
/// delivery is outside this crate). A token is 32 bytes of OS randomness,
/// hex-encoded to 64 characters, and valid for one hour. Tokens are
/// cleared from the user row on successful confirmation, making them
/// single-use.
///
/// # Example
///
/// ```
/// use finplan_shared::auth::reset_token::{generate_reset_token, reset_token_expiry};
///
/// let token = generate_reset_token();
/// assert_eq!(token.len(), 64);
///
/// let expires_at = reset_token_expiry();
/// assert!(expires_at > chrono::Utc::now());
/// ```

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};

/// Reset token validity window
const RESET_TOKEN_LIFETIME_MINUTES: i64 = 60;

/// Generates a new reset token: 32 random bytes, hex-encoded
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Computes the expiry timestamp for a token issued now
pub fn reset_token_expiry() -> DateTime<Utc> {
    Utc::now() + Duration::minutes(RESET_TOKEN_LIFETIME_MINUTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_length_and_charset() {
        let token = generate_reset_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_tokens_are_unique() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expiry_is_one_hour_out() {
        let expires_at = reset_token_expiry();
        let delta = expires_at - Utc::now();
        assert!(delta > Duration::minutes(59));
        assert!(delta <= Duration::minutes(60));
    }
}
