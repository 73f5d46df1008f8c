use leptos::prelude::ServerFnError;

use crate::auth::expiry::{ExpiryOptions, SessionExpiry};

/// Marker carried by every error that means the backend no longer accepts the
/// session. Server-side classification produces it; the client interceptor
/// matches on it. Credential failures from the login and register endpoints
/// never carry it.
pub const SESSION_EXPIRED_MESSAGE: &str = "session expired, please log in again";

/// Strip the server-fn transport prefix so the user sees the message the
/// backend produced, not the plumbing around it.
pub fn friendly_message(err: &ServerFnError) -> String {
    let raw = err.to_string();
    raw.rsplit("error running server function: ")
        .next()
        .unwrap_or(raw.as_str())
        .trim()
        .to_string()
}

/// Response interceptor for failed server-fn calls, the single place 401
/// classification reaches the client. Session expiry is routed into the
/// coordinator (idempotent across concurrent failures); everything else
/// passes through as a plain message for inline display.
pub fn intercept_error(
    expiry: &SessionExpiry,
    err: &ServerFnError,
    return_url: Option<String>,
) -> String {
    let message = friendly_message(err);
    if message.contains(SESSION_EXPIRED_MESSAGE) {
        expiry.handle(ExpiryOptions {
            immediate: false,
            return_url,
        });
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::events::AuthEvents;
    use crate::auth::expiry::{TimerApi, TimerToken};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct CountingTimers {
        scheduled: AtomicUsize,
    }

    impl TimerApi for CountingTimers {
        fn schedule(&self, _delay: Duration, _callback: Box<dyn FnOnce() + Send>) -> TimerToken {
            TimerToken(self.scheduled.fetch_add(1, Ordering::SeqCst) as u64)
        }

        fn clear(&self, _token: TimerToken) {}
    }

    fn expiry_with_counter() -> (SessionExpiry, Arc<CountingTimers>) {
        let timers = Arc::new(CountingTimers::default());
        let expiry = SessionExpiry::new(AuthEvents::new(), timers.clone(), Arc::new(|_| {}));
        (expiry, timers)
    }

    #[test]
    fn credential_errors_bypass_coordinator() {
        let (expiry, timers) = expiry_with_counter();
        let err = ServerFnError::ServerError("invalid username or password".to_string());
        let message = intercept_error(&expiry, &err, None);
        assert_eq!(message, "invalid username or password");
        assert_eq!(timers.scheduled.load(Ordering::SeqCst), 0);
        assert!(!expiry.is_handling());
    }

    #[test]
    fn expired_session_trips_coordinator_once() {
        let (expiry, timers) = expiry_with_counter();
        let err = ServerFnError::ServerError(SESSION_EXPIRED_MESSAGE.to_string());

        // Several concurrent requests fail the same way; one redirect.
        intercept_error(&expiry, &err, Some("/kb".to_string()));
        intercept_error(&expiry, &err, Some("/kb".to_string()));
        intercept_error(&expiry, &err, None);

        assert_eq!(timers.scheduled.load(Ordering::SeqCst), 1);
        assert!(expiry.is_handling());
    }

    #[test]
    fn friendly_message_strips_the_transport_prefix() {
        let err = ServerFnError::ServerError("you do not have permission to access this resource".to_string());
        assert_eq!(
            friendly_message(&err),
            "you do not have permission to access this resource"
        );
    }
}
