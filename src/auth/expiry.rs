use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use leptos::leptos_dom::helpers::{set_timeout_with_handle, TimeoutHandle};
use log::error;

use crate::auth::events::{AuthEvents, AuthNotice, SESSION_EXPIRED_EVENT};

/// Grace window between notifying subscribers and navigating to login, so
/// synchronous cleanup can finish first.
pub const REDIRECT_GRACE: Duration = Duration::from_millis(500);
pub const LOGIN_PATH: &str = "/login";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(pub u64);

/// Seam over timer scheduling so the coordinator can run under test without
/// a browser event loop.
pub trait TimerApi: Send + Sync {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TimerToken;
    fn clear(&self, token: TimerToken);
}

#[derive(Debug, Clone, Default)]
pub struct ExpiryOptions {
    /// Skip the grace window and navigate on the next tick.
    pub immediate: bool,
    /// Where to send the user back after re-login; defaults to the current
    /// location at navigation time.
    pub return_url: Option<String>,
}

#[derive(Default)]
struct ExpiryState {
    handling: bool,
    pending: Option<TimerToken>,
}

/// Coordinates concurrent session-expired signals: any number of in-flight
/// requests may observe a 401 within the same window, but subscribers are
/// notified once and exactly one login redirect is scheduled.
///
/// Constructed once at startup and shared through context; tests build
/// isolated instances with recording seams.
#[derive(Clone)]
pub struct SessionExpiry {
    state: Arc<Mutex<ExpiryState>>,
    events: AuthEvents,
    timers: Arc<dyn TimerApi>,
    redirect: Arc<dyn Fn(Option<String>) + Send + Sync>,
}

impl SessionExpiry {
    pub fn new(
        events: AuthEvents,
        timers: Arc<dyn TimerApi>,
        redirect: Arc<dyn Fn(Option<String>) + Send + Sync>,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(ExpiryState::default())),
            events,
            timers,
            redirect,
        }
    }

    pub fn events(&self) -> &AuthEvents {
        &self.events
    }

    pub fn is_handling(&self) -> bool {
        self.state.lock().unwrap().handling
    }

    /// First signal in an idle state wins; every later call while handling is
    /// a no-op. Subscribers are notified synchronously before the redirect
    /// timer is armed.
    pub fn handle(&self, options: ExpiryOptions) {
        {
            let mut state = self.state.lock().unwrap();
            if state.handling {
                return;
            }
            state.handling = true;
        }

        self.events.publish(
            SESSION_EXPIRED_EVENT,
            &AuthNotice {
                return_url: options.return_url.clone(),
            },
        );

        let delay = if options.immediate {
            Duration::ZERO
        } else {
            REDIRECT_GRACE
        };
        let redirect = self.redirect.clone();
        let return_url = options.return_url;
        let token = self
            .timers
            .schedule(delay, Box::new(move || redirect(return_url)));

        let replaced = self.state.lock().unwrap().pending.replace(token);
        if let Some(previous) = replaced {
            self.timers.clear(previous);
        }
    }

    /// Abort a pending redirect (false positive, or the user chose to stay)
    /// and return to idle. Safe no-op when idle.
    pub fn cancel(&self) {
        let pending = {
            let mut state = self.state.lock().unwrap();
            state.handling = false;
            state.pending.take()
        };
        if let Some(token) = pending {
            self.timers.clear(token);
        }
    }

    /// Unconditionally return to idle. Does not clear a pending timer; this
    /// is a state-reinitialization hook, not an abort.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        state.handling = false;
        state.pending = None;
    }
}

/// Build the login URL carrying the path to come back to. No redirect
/// parameter when the user is already on the login page.
pub fn login_redirect_url(target: &str) -> String {
    if target.is_empty() || target == LOGIN_PATH {
        LOGIN_PATH.to_string()
    } else {
        format!("{LOGIN_PATH}?redirect={}", urlencoding::encode(target))
    }
}

/// Production timer seam over the browser event loop.
#[derive(Default)]
pub struct BrowserTimers {
    handles: Mutex<HashMap<u64, TimeoutHandle>>,
    next_id: AtomicU64,
}

impl TimerApi for BrowserTimers {
    fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TimerToken {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        match set_timeout_with_handle(move || callback(), delay) {
            Ok(handle) => {
                self.handles.lock().unwrap().insert(id, handle);
            }
            Err(e) => error!("failed to schedule redirect timer: {e:?}"),
        }
        TimerToken(id)
    }

    fn clear(&self, token: TimerToken) {
        if let Some(handle) = self.handles.lock().unwrap().remove(&token.0) {
            handle.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    type StoredTimer = (TimerToken, Duration, Box<dyn FnOnce() + Send>);

    #[derive(Default)]
    struct RecordingTimers {
        scheduled: Mutex<Vec<StoredTimer>>,
        cleared: Mutex<Vec<TimerToken>>,
        next_id: AtomicU64,
    }

    impl RecordingTimers {
        fn scheduled_count(&self) -> usize {
            self.scheduled.lock().unwrap().len()
        }

        fn fire_all(&self) {
            let timers: Vec<StoredTimer> = self.scheduled.lock().unwrap().drain(..).collect();
            for (_, _, callback) in timers {
                callback();
            }
        }
    }

    impl TimerApi for RecordingTimers {
        fn schedule(&self, delay: Duration, callback: Box<dyn FnOnce() + Send>) -> TimerToken {
            let token = TimerToken(self.next_id.fetch_add(1, Ordering::Relaxed));
            self.scheduled.lock().unwrap().push((token, delay, callback));
            token
        }

        fn clear(&self, token: TimerToken) {
            self.cleared.lock().unwrap().push(token);
            self.scheduled.lock().unwrap().retain(|(t, _, _)| *t != token);
        }
    }

    struct Fixture {
        expiry: SessionExpiry,
        timers: Arc<RecordingTimers>,
        redirects: Arc<Mutex<Vec<Option<String>>>>,
    }

    fn fixture() -> Fixture {
        let timers = Arc::new(RecordingTimers::default());
        let redirects = Arc::new(Mutex::new(Vec::new()));
        let sink = redirects.clone();
        let expiry = SessionExpiry::new(
            AuthEvents::new(),
            timers.clone(),
            Arc::new(move |url| sink.lock().unwrap().push(url)),
        );
        Fixture {
            expiry,
            timers,
            redirects,
        }
    }

    #[test]
    fn concurrent_handles_schedule_one_redirect() {
        let fx = fixture();
        let notified = Arc::new(AtomicUsize::new(0));
        let counter = notified.clone();
        let _sub = fx.expiry.events().subscribe(SESSION_EXPIRED_EVENT, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // Three requests discover the expired session within milliseconds.
        fx.expiry.handle(ExpiryOptions::default());
        fx.expiry.handle(ExpiryOptions::default());
        fx.expiry.handle(ExpiryOptions::default());

        assert_eq!(fx.timers.scheduled_count(), 1);
        assert_eq!(notified.load(Ordering::SeqCst), 1);
        assert!(fx.expiry.is_handling());
    }

    #[test]
    fn cancel_when_idle_is_noop() {
        let fx = fixture();
        fx.expiry.cancel();
        assert!(!fx.expiry.is_handling());
        assert_eq!(fx.timers.scheduled_count(), 0);
        assert!(fx.timers.cleared.lock().unwrap().is_empty());
    }

    #[test]
    fn cancel_clears_the_pending_redirect() {
        let fx = fixture();
        fx.expiry.handle(ExpiryOptions::default());
        fx.expiry.cancel();

        assert!(!fx.expiry.is_handling());
        assert_eq!(fx.timers.scheduled_count(), 0);
        assert_eq!(fx.timers.cleared.lock().unwrap().len(), 1);

        // A later expiry proceeds again.
        fx.expiry.handle(ExpiryOptions::default());
        assert_eq!(fx.timers.scheduled_count(), 1);
    }

    #[test]
    fn reset_returns_idle_without_clearing_the_timer() {
        let fx = fixture();
        fx.expiry.handle(ExpiryOptions::default());
        fx.expiry.reset();

        assert!(!fx.expiry.is_handling());
        assert!(fx.timers.cleared.lock().unwrap().is_empty());

        // The next episode replaces nothing; the stale timer was abandoned.
        fx.expiry.handle(ExpiryOptions::default());
        assert_eq!(fx.timers.scheduled_count(), 2);
    }

    #[test]
    fn subscribers_run_before_the_timer_is_armed() {
        let fx = fixture();
        let timers = fx.timers.clone();
        let observed = Arc::new(AtomicUsize::new(usize::MAX));
        let seen = observed.clone();
        let _sub = fx.expiry.events().subscribe(SESSION_EXPIRED_EVENT, move |_| {
            seen.store(timers.scheduled_count(), Ordering::SeqCst);
        });

        fx.expiry.handle(ExpiryOptions::default());
        assert_eq!(observed.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn immediate_skips_the_grace_window() {
        let fx = fixture();
        fx.expiry.handle(ExpiryOptions {
            immediate: true,
            return_url: None,
        });
        let scheduled = fx.timers.scheduled.lock().unwrap();
        assert_eq!(scheduled[0].1, Duration::ZERO);
    }

    #[test]
    fn grace_window_applies_by_default() {
        let fx = fixture();
        fx.expiry.handle(ExpiryOptions::default());
        let scheduled = fx.timers.scheduled.lock().unwrap();
        assert_eq!(scheduled[0].1, REDIRECT_GRACE);
    }

    #[test]
    fn fired_timer_navigates_with_the_return_url() {
        let fx = fixture();
        fx.expiry.handle(ExpiryOptions {
            immediate: false,
            return_url: Some("/kb/7".to_string()),
        });
        fx.timers.fire_all();
        assert_eq!(*fx.redirects.lock().unwrap(), vec![Some("/kb/7".to_string())]);
        // No automatic return to idle: navigation is expected to unload.
        assert!(fx.expiry.is_handling());
    }

    #[test]
    fn login_redirect_url_encodes_the_target() {
        assert_eq!(login_redirect_url("/kb/7"), "/login?redirect=%2Fkb%2F7");
        assert_eq!(login_redirect_url("/login"), "/login");
        assert_eq!(login_redirect_url(""), "/login");
    }
}
