use cfg_if::cfg_if;
use leptos::prelude::*;

pub mod context;
pub mod events;
pub mod expiry;
pub mod guard;
#[cfg(feature = "ssr")]
pub mod middleware;
pub mod token;

use crate::models::user::UserView;

pub const AUTH_COOKIE_NAME: &str = "ragline_token";

cfg_if! {
    if #[cfg(feature = "ssr")] {
        use axum_extra::extract::cookie::CookieJar;
        use http::{HeaderName, HeaderValue};
        use leptos_axum::ResponseOptions;

        use crate::backend::Backend;
        use crate::state::AppState;

        pub fn bearer_from_jar(jar: &CookieJar) -> Option<String> {
            jar.get(AUTH_COOKIE_NAME)
                .map(|c| c.value().to_string())
                .filter(|t| !t.is_empty())
        }

        /// Extract the backend bearer token for the current server-fn call.
        /// Absence means the session is gone; the error carries the expiry
        /// marker so the client interceptor routes it to the coordinator.
        pub async fn bearer_token() -> Result<String, ServerFnError> {
            let jar = leptos_axum::extract::<CookieJar>().await
                .map_err(|e| ServerFnError::new(format!("cookie jar error: {e}")))?;
            bearer_from_jar(&jar)
                .ok_or_else(|| ServerFnError::new(crate::api::SESSION_EXPIRED_MESSAGE))
        }

        pub fn backend_from_context() -> Result<Backend, ServerFnError> {
            let state = use_context::<AppState>()
                .ok_or_else(|| ServerFnError::new("app state not found"))?;
            Ok(state.backend.clone())
        }

        fn set_cookie_header(cookie: cookie::Cookie<'_>) -> Result<(), ServerFnError> {
            let response_options = use_context::<ResponseOptions>()
                .ok_or_else(|| ServerFnError::new("response options not found"))?;
            let value = HeaderValue::from_str(&cookie.to_string())
                .map_err(|e| ServerFnError::new(format!("cookie header error: {e}")))?;
            response_options.insert_header(HeaderName::from_static("set-cookie"), value);
            Ok(())
        }

        fn auth_cookie(token: &str) -> cookie::Cookie<'static> {
            cookie::Cookie::build((AUTH_COOKIE_NAME, token.to_string()))
                .path("/")
                .http_only(true)
                .same_site(cookie::SameSite::Lax)
                .max_age(cookie::time::Duration::hours(24))
                .build()
        }

        fn expired_auth_cookie() -> cookie::Cookie<'static> {
            cookie::Cookie::build((AUTH_COOKIE_NAME, ""))
                .path("/")
                .max_age(cookie::time::Duration::seconds(-1))
                .build()
        }
    }
}

#[server(Login, "/api")]
pub async fn login(username: String, password: String) -> Result<UserView, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::models::user::Credentials;

        log::debug!("attempting login for user: {username}");
        let backend = backend_from_context()?;
        let auth = backend
            .login(&Credentials { username, password })
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))?;

        set_cookie_header(auth_cookie(&auth.token))?;
        log::info!("user {} logged in", auth.user.username);
        Ok(auth.user)
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(Register, "/api")]
pub async fn register(
    username: String,
    password: String,
    email: Option<String>,
) -> Result<(), ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::models::user::Registration;

        let backend = backend_from_context()?;
        backend
            .register(&Registration {
                username: username.clone(),
                password,
                email,
            })
            .await
            .map_err(|e| ServerFnError::new(e.to_string()))?;
        log::info!("registered user {username}");
        Ok(())
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(Logout, "/api")]
pub async fn logout() -> Result<(), ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        let jar = leptos_axum::extract::<CookieJar>()
            .await
            .map_err(|e| ServerFnError::new(format!("cookie jar error: {e}")))?;

        // Best effort: the cookie is cleared regardless of whether the
        // backend acknowledges the logout.
        if let Some(bearer) = bearer_from_jar(&jar) {
            let backend = backend_from_context()?;
            if let Err(e) = backend.logout(&bearer).await {
                log::warn!("backend logout failed: {e}");
            }
        }

        set_cookie_header(expired_auth_cookie())?;
        log::info!("session cookie cleared");
        Ok(())
    }

    #[cfg(not(feature = "ssr"))]
    Err(ServerFnError::new("server-side function called on client"))
}

#[server(GetCurrentUser, "/api")]
pub async fn get_current_user() -> Result<Option<UserView>, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        let jar = leptos_axum::extract::<CookieJar>()
            .await
            .map_err(|e| ServerFnError::new(format!("cookie jar error: {e}")))?;

        let Some(bearer) = bearer_from_jar(&jar) else {
            return Ok(None);
        };

        let backend = backend_from_context()?;
        match backend.current_user(&bearer).await {
            Ok(user) => Ok(Some(user)),
            Err(crate::backend::BackendError::SessionExpired) => Ok(None),
            Err(e) => Err(ServerFnError::new(e.to_string())),
        }
    }

    #[cfg(not(feature = "ssr"))]
    Ok(None)
}

#[server(VerifySession, "/api")]
pub async fn verify_session() -> Result<bool, ServerFnError> {
    #[cfg(feature = "ssr")]
    {
        use crate::auth::token::token_expired;

        let jar = match leptos_axum::extract::<CookieJar>().await {
            Ok(jar) => jar,
            Err(_) => return Ok(false),
        };

        let Some(bearer) = bearer_from_jar(&jar) else {
            return Ok(false);
        };
        if token_expired(&bearer) {
            return Ok(false);
        }

        let backend = backend_from_context()?;
        match backend.current_user(&bearer).await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    #[cfg(not(feature = "ssr"))]
    Ok(false)
}
