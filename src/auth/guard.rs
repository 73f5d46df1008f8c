use leptos::prelude::*;
use leptos_router::hooks::{use_location, use_navigate};

use crate::auth::context::AuthContext;
use crate::auth::expiry::login_redirect_url;
use crate::components::loading::Loading;

/// Route guard for authenticated pages: shows the spinner while the session
/// is being verified, bounces to login (remembering where the user was)
/// otherwise.
#[component]
pub fn RequireAuth(children: ChildrenFn) -> impl IntoView {
    let auth = expect_context::<AuthContext>();
    let navigate = use_navigate();
    let location = use_location();

    let is_loading = auth.is_loading;
    let is_authenticated = auth.is_authenticated;

    Effect::new(move |_| {
        if !is_loading.get() && !is_authenticated.get() {
            let path = location.pathname.get_untracked();
            navigate(&login_redirect_url(&path), Default::default());
        }
    });

    view! {
        {move || {
            if is_loading.get() {
                view! { <Loading/> }.into_any()
            } else if is_authenticated.get() {
                children().into_any()
            } else {
                view! { <div></div> }.into_any()
            }
        }}
    }
}
