use thiserror::Error;

use crate::api::SESSION_EXPIRED_MESSAGE;

/// Failure taxonomy for calls against the remote RAG backend.
///
/// `SessionExpired` carries the marker message the client-side interceptor
/// recognizes; `Credentials` deliberately does not, so a failed login never
/// trips the expiry coordinator.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{}", SESSION_EXPIRED_MESSAGE)]
    SessionExpired,
    #[error("{0}")]
    Credentials(String),
    #[error("you do not have permission to access this resource")]
    Forbidden,
    #[error("{0}")]
    Api(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unexpected response format: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_expired_carries_the_interceptor_marker() {
        assert!(BackendError::SessionExpired
            .to_string()
            .contains(SESSION_EXPIRED_MESSAGE));
    }

    #[test]
    fn credential_errors_do_not_carry_the_marker() {
        let err = BackendError::Credentials("invalid username or password".to_string());
        assert!(!err.to_string().contains(SESSION_EXPIRED_MESSAGE));
    }
}
