use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use log::error;

pub const SESSION_EXPIRED_EVENT: &str = "auth:session_expired";
pub const LOGOUT_EVENT: &str = "auth:logout";

/// Payload delivered to auth event subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthNotice {
    pub return_url: Option<String>,
}

type Handler = Arc<dyn Fn(&AuthNotice) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: HashMap<&'static str, Vec<(u64, Handler)>>,
}

/// Publish/subscribe registry for auth lifecycle events. Components register
/// cleanup handlers (save a draft, stop a live stream) that must run before a
/// session-expired redirect fires.
#[derive(Clone, Default)]
pub struct AuthEvents {
    inner: Arc<Mutex<Registry>>,
}

impl AuthEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &self,
        event: &'static str,
        handler: impl Fn(&AuthNotice) + Send + Sync + 'static,
    ) -> Subscription {
        let mut registry = self.inner.lock().unwrap();
        let id = registry.next_id;
        registry.next_id += 1;
        registry
            .subscribers
            .entry(event)
            .or_default()
            .push((id, Arc::new(handler)));
        Subscription {
            events: self.clone(),
            event,
            id,
        }
    }

    /// Deliver `notice` to every current subscriber of `event`, in
    /// registration order. Handlers run outside the registry lock so they may
    /// subscribe, unsubscribe, or call back into the coordinator. A panicking
    /// handler is contained and logged; the fan-out always completes.
    pub fn publish(&self, event: &str, notice: &AuthNotice) {
        let handlers: Vec<Handler> = {
            let registry = self.inner.lock().unwrap();
            registry
                .subscribers
                .get(event)
                .map(|subs| subs.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };
        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(notice))).is_err() {
                error!("auth event handler panicked while handling {event}");
            }
        }
    }

    fn unsubscribe(&self, event: &'static str, id: u64) {
        let mut registry = self.inner.lock().unwrap();
        if let Some(subs) = registry.subscribers.get_mut(event) {
            subs.retain(|(sub_id, _)| *sub_id != id);
        }
    }
}

/// Handle returned by `subscribe`; removes exactly that handler.
#[must_use = "dropping a Subscription silently keeps the handler registered"]
pub struct Subscription {
    events: AuthEvents,
    event: &'static str,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        self.events.unsubscribe(self.event, self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn delivers_in_registration_order() {
        let events = AuthEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let first = seen.clone();
        let _a = events.subscribe(SESSION_EXPIRED_EVENT, move |_| {
            first.lock().unwrap().push("first");
        });
        let second = seen.clone();
        let _b = events.subscribe(SESSION_EXPIRED_EVENT, move |_| {
            second.lock().unwrap().push("second");
        });

        events.publish(SESSION_EXPIRED_EVENT, &AuthNotice::default());
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let events = AuthEvents::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let a_calls = calls.clone();
        let a = events.subscribe(SESSION_EXPIRED_EVENT, move |_| {
            a_calls.fetch_add(1, Ordering::SeqCst);
        });
        let b_calls = calls.clone();
        let _b = events.subscribe(SESSION_EXPIRED_EVENT, move |_| {
            b_calls.fetch_add(10, Ordering::SeqCst);
        });

        a.unsubscribe();
        events.publish(SESSION_EXPIRED_EVENT, &AuthNotice::default());
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn panicking_handler_does_not_block_the_rest() {
        let events = AuthEvents::new();
        let reached = Arc::new(AtomicUsize::new(0));

        let _bad = events.subscribe(SESSION_EXPIRED_EVENT, |_| panic!("boom"));
        let ok = reached.clone();
        let _good = events.subscribe(SESSION_EXPIRED_EVENT, move |_| {
            ok.fetch_add(1, Ordering::SeqCst);
        });

        events.publish(SESSION_EXPIRED_EVENT, &AuthNotice::default());
        assert_eq!(reached.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn publish_without_subscribers_is_a_noop() {
        let events = AuthEvents::new();
        events.publish(LOGOUT_EVENT, &AuthNotice::default());
    }

    #[test]
    fn notice_carries_the_return_url() {
        let events = AuthEvents::new();
        let seen = Arc::new(Mutex::new(None));
        let sink = seen.clone();
        let _sub = events.subscribe(SESSION_EXPIRED_EVENT, move |notice| {
            *sink.lock().unwrap() = notice.return_url.clone();
        });
        events.publish(
            SESSION_EXPIRED_EVENT,
            &AuthNotice {
                return_url: Some("/kb/42".to_string()),
            },
        );
        assert_eq!(*seen.lock().unwrap(), Some("/kb/42".to_string()));
    }
}
