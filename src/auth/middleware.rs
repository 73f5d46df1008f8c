use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;
use log::debug;

use crate::auth::token::token_expired;
use crate::auth::AUTH_COOKIE_NAME;

/// Backend bearer token attached to a request by `require_auth`, consumed by
/// the stream handlers.
#[derive(Clone)]
pub struct BearerToken(pub String);

/// Gate for the streaming endpoints: the session cookie must be present and
/// not already past its expiry buffer. Requests that would certainly be
/// rejected by the backend are stopped here.
pub async fn require_auth(cookie_jar: CookieJar, request: Request, next: Next) -> Response {
    let token = cookie_jar
        .get(AUTH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty());

    match token {
        Some(token) if !token_expired(&token) => {
            let mut request = request;
            request.extensions_mut().insert(BearerToken(token));
            next.run(request).await
        }
        Some(_) => {
            debug!("auth middleware - token past expiry for {}", request.uri());
            StatusCode::UNAUTHORIZED.into_response()
        }
        None => {
            debug!("auth middleware - no session cookie for {}", request.uri());
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}
