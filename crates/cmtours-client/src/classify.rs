//! Classification of 401 response messages.
//!
//! The backend returns 401 for real authentication failures but also for
//! validation and permission failures, and the only distinguishing signal
//! is the wording of the message. Classification therefore works on text
//! alone, and anything it cannot place stays untouched: misreading a
//! validation message as an auth failure would log the user out of a valid
//! session.

/// What a 401 message turned out to mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthorizedKind {
    /// The message is about the refresh token. Never a session failure:
    /// the access token currently in use is not implicated.
    RefreshToken,
    /// A genuine authentication/session failure.
    Auth,
    /// Anything else: validation, permissions, unrelated 401s.
    Other,
}

/// Classify a 401 message by its wording.
pub fn classify_unauthorized(message: &str) -> UnauthorizedKind {
    let msg = message.to_lowercase();

    // Checked first: "refresh token expired" must never match the
    // token-expired rules below.
    if msg.contains("refresh token") || msg.contains("refresh_token") {
        return UnauthorizedKind::RefreshToken;
    }

    if msg.contains("authentication required")
        || msg.contains("not authenticated")
        || msg.contains("session expired")
    {
        return UnauthorizedKind::Auth;
    }

    if msg.contains("token")
        && (msg.contains("expired")
            || msg.contains("invalid token")
            || msg.contains("token invalid")
            || msg.contains("token signature")
            || msg.contains("token missing"))
    {
        return UnauthorizedKind::Auth;
    }

    if msg.contains("authorization")
        && (msg.contains("required") || msg.contains("missing") || msg.contains("invalid"))
    {
        return UnauthorizedKind::Auth;
    }

    if msg.contains("unauthorized") && !msg.contains("permission") && !msg.contains("insufficient")
    {
        return UnauthorizedKind::Auth;
    }

    UnauthorizedKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expired_is_auth() {
        assert_eq!(classify_unauthorized("Session expired"), UnauthorizedKind::Auth);
    }

    #[test]
    fn test_refresh_token_messages_are_never_auth() {
        assert_eq!(
            classify_unauthorized("refresh token expired"),
            UnauthorizedKind::RefreshToken
        );
        assert_eq!(
            classify_unauthorized("Invalid refresh token"),
            UnauthorizedKind::RefreshToken
        );
        assert_eq!(
            classify_unauthorized("refresh_token signature mismatch"),
            UnauthorizedKind::RefreshToken
        );
    }

    #[test]
    fn test_permission_messages_are_other() {
        assert_eq!(
            classify_unauthorized("Insufficient permissions"),
            UnauthorizedKind::Other
        );
        assert_eq!(
            classify_unauthorized("Unauthorized: missing permission bookings.write"),
            UnauthorizedKind::Other
        );
    }

    #[test]
    fn test_token_phrases_are_auth() {
        assert_eq!(
            classify_unauthorized("Invalid or expired token"),
            UnauthorizedKind::Auth
        );
        assert_eq!(classify_unauthorized("Token expired"), UnauthorizedKind::Auth);
        assert_eq!(classify_unauthorized("token invalid"), UnauthorizedKind::Auth);
        assert_eq!(
            classify_unauthorized("Token signature could not be verified"),
            UnauthorizedKind::Auth
        );
        assert_eq!(classify_unauthorized("Token missing"), UnauthorizedKind::Auth);
    }

    #[test]
    fn test_authorization_header_phrases_are_auth() {
        assert_eq!(
            classify_unauthorized("Authorization header required"),
            UnauthorizedKind::Auth
        );
        assert_eq!(
            classify_unauthorized("Authorization missing"),
            UnauthorizedKind::Auth
        );
        assert_eq!(
            classify_unauthorized("Invalid authorization"),
            UnauthorizedKind::Auth
        );
    }

    #[test]
    fn test_bare_unauthorized_is_auth() {
        assert_eq!(classify_unauthorized("Unauthorized"), UnauthorizedKind::Auth);
        assert_eq!(
            classify_unauthorized("Not authenticated"),
            UnauthorizedKind::Auth
        );
    }

    #[test]
    fn test_validation_messages_are_other() {
        assert_eq!(
            classify_unauthorized("Invalid package title"),
            UnauthorizedKind::Other
        );
        assert_eq!(classify_unauthorized(""), UnauthorizedKind::Other);
        assert_eq!(
            classify_unauthorized("The email field is required"),
            UnauthorizedKind::Other
        );
    }
}
