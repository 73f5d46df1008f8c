use std::sync::Arc;

use leptos::{prelude::*, task::spawn_local};
use log::error;

use crate::auth::events::AuthEvents;
use crate::auth::expiry::{login_redirect_url, BrowserTimers, SessionExpiry};
use crate::auth::token;
use crate::auth::{get_current_user, verify_session};
use crate::models::user::UserView;

#[derive(Clone)]
pub struct AuthContext {
    pub is_authenticated: ReadSignal<bool>,
    pub current_user: ReadSignal<Option<UserView>>,
    pub is_loading: ReadSignal<bool>,
    pub refresh: WriteSignal<u32>,
}

impl AuthContext {
    pub fn refresh_auth(&self) {
        self.refresh.update(|v| *v = (*v + 1) % 1000);
    }
}

/// Production redirect: resolve the return target (explicit, else the path
/// the user is on) and leave for the login page.
fn browser_redirect(return_url: Option<String>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let location = window.location();
    let target = return_url
        .or_else(|| location.pathname().ok())
        .unwrap_or_default();
    if let Err(e) = location.set_href(&login_redirect_url(&target)) {
        error!("failed to navigate to login: {e:?}");
    }
}

#[component]
pub fn AuthProvider(children: Children) -> impl IntoView {
    let (is_authenticated, set_is_authenticated) = signal(false);
    let (current_user, set_current_user) = signal(None::<UserView>);
    let (is_loading, set_is_loading) = signal(true);
    let (refresh, set_refresh) = signal(0u32);

    // The one coordinator instance for this app, shared through context with
    // every request-issuing component.
    let events = AuthEvents::new();
    let expiry = SessionExpiry::new(
        events.clone(),
        Arc::new(BrowserTimers::default()),
        Arc::new(browser_redirect),
    );
    provide_context(events);
    provide_context(expiry);

    let auth_context = AuthContext {
        is_authenticated,
        current_user,
        is_loading,
        refresh: set_refresh,
    };

    Effect::new(move |_| {
        let tick = refresh.get();
        // Recently verified and still holding a user: skip the backend
        // round-trip unless a refresh was explicitly requested.
        if tick == 0 && current_user.get_untracked().is_some() && !token::needs_revalidation() {
            set_is_loading.set(false);
            return;
        }
        spawn_local(async move {
            set_is_loading.set(true);

            match verify_session().await {
                Ok(true) => {
                    set_is_authenticated.set(true);
                    token::mark_verified();
                    if let Ok(Some(user)) = get_current_user().await {
                        set_current_user.set(Some(user));
                    }
                }
                Ok(false) => {
                    set_is_authenticated.set(false);
                    set_current_user.set(None);
                    token::clear_verification();
                }
                Err(_) => {
                    set_is_authenticated.set(false);
                    set_current_user.set(None);
                }
            }
            set_is_loading.set(false);
        });
    });

    provide_context(auth_context.clone());

    view! { {children()} }
}
