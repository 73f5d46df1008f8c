use leptos::{prelude::*, task::spawn_local};
use leptos_icons::Icon;
use web_sys::window;

#[cfg(feature = "ssr")]
const DARK_MODE_COOKIE: &str = "ragline_dark_mode";

#[server(SetDarkModeCookie, "/api")]
pub async fn set_dark_mode_cookie(is_dark: bool) -> Result<(), ServerFnError> {
    use axum_extra::extract::cookie::{Cookie, SameSite};
    use cookie::time;
    use http::{HeaderName, HeaderValue};

    let cookie = Cookie::build((DARK_MODE_COOKIE, is_dark.to_string()))
        .path("/")
        .http_only(false)
        .same_site(SameSite::Lax)
        .expires(time::OffsetDateTime::now_utc() + time::Duration::days(365))
        .build();

    let response_options = use_context::<leptos_axum::ResponseOptions>()
        .ok_or_else(|| ServerFnError::new("response options not found"))?;

    let cookie_value = HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| ServerFnError::new(format!("cookie header error: {e}")))?;

    response_options.insert_header(HeaderName::from_static("set-cookie"), cookie_value);

    Ok(())
}

#[server(GetDarkModeCookie, "/api")]
pub async fn get_dark_mode_cookie() -> Result<Option<bool>, ServerFnError> {
    use axum_extra::extract::cookie::CookieJar;
    use leptos_axum::extract;

    let cookie_jar = extract::<CookieJar>()
        .await
        .map_err(|e| ServerFnError::new(format!("cookie jar error: {e}")))?;

    Ok(cookie_jar
        .get(DARK_MODE_COOKIE)
        .and_then(|cookie| cookie.value().parse().ok()))
}

#[component]
pub fn DarkModeToggle() -> impl IntoView {
    let (is_dark, set_is_dark) = signal(false);
    let set_cookie_action = ServerAction::<SetDarkModeCookie>::new();

    Effect::new(move |_| {
        spawn_local(async move {
            if let Ok(Some(dark_mode)) = get_dark_mode_cookie().await {
                set_is_dark.set(dark_mode);
                apply_dark_mode(dark_mode);
            }
        });
    });

    let toggle_dark_mode = move |_| {
        let new_state = !is_dark.get();
        set_is_dark.set(new_state);
        apply_dark_mode(new_state);

        set_cookie_action.dispatch(SetDarkModeCookie { is_dark: new_state });
    };

    view! {
        <button
            class="p-2 rounded-md text-slate-500 dark:text-slate-300 hover:bg-slate-200 dark:hover:bg-slate-700 transition-colors"
            on:click=toggle_dark_mode
        >
            {move || {
                if is_dark.get() {
                    view! { <Icon icon=icondata_bs::BsSun width="16" height="16"/> }.into_any()
                } else {
                    view! { <Icon icon=icondata_bs::BsMoon width="16" height="16"/> }.into_any()
                }
            }}
        </button>
    }
}

fn apply_dark_mode(is_dark: bool) {
    if let Some(window) = window() {
        if let Some(document) = window.document() {
            if let Some(body) = document.body() {
                let _ = if is_dark {
                    body.class_list().add_1("dark")
                } else {
                    body.class_list().remove_1("dark")
                };
            }
        }
    }
}
