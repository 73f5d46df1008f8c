use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const LAST_VERIFY_KEY: &str = "ragline_last_verify";
pub const CHAT_DRAFT_KEY: &str = "ragline_chat_draft";

/// Re-verify against the backend at most every five minutes.
const VERIFY_INTERVAL_MS: i64 = 5 * 60 * 1000;
/// Treat a token as expired one minute early to leave a refresh window.
const EXPIRY_BUFFER_MS: i64 = 60 * 1000;

/// Payload claims this app cares about. Anything unparseable is treated as
/// needing re-verification, never trusted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
}

/// Decode a JWT payload segment without verifying the signature. The backend
/// owns verification; this only exists to skip requests that are certain to
/// be rejected.
pub fn parse_claims(token: &str) -> Option<Claims> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload).ok()?;
    serde_json::from_slice(&bytes).ok()
}

pub fn is_expired_at(claims: &Claims, now_ms: i64) -> bool {
    match claims.exp {
        Some(exp) => now_ms >= exp * 1000 - EXPIRY_BUFFER_MS,
        None => true,
    }
}

/// True when the token is missing an expiry, cannot be parsed, or expires
/// within the buffer window.
pub fn token_expired(token: &str) -> bool {
    match parse_claims(token) {
        Some(claims) => is_expired_at(&claims, Utc::now().timestamp_millis()),
        None => true,
    }
}

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

/// Record a successful backend verification (browser only).
pub fn mark_verified() {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(LAST_VERIFY_KEY, &Utc::now().timestamp_millis().to_string());
    }
}

/// Whether the session should be re-verified against the backend: true when
/// there is no recorded verification or the last one is stale.
pub fn needs_revalidation() -> bool {
    let Some(storage) = local_storage() else {
        return true;
    };
    match storage
        .get_item(LAST_VERIFY_KEY)
        .ok()
        .flatten()
        .and_then(|v| v.parse::<i64>().ok())
    {
        Some(last) => Utc::now().timestamp_millis() - last >= VERIFY_INTERVAL_MS,
        None => true,
    }
}

pub fn clear_verification() {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(LAST_VERIFY_KEY);
    }
}

/// Stash an unsent chat input when the session expires mid-conversation.
pub fn save_chat_draft(draft: &str) {
    if draft.is_empty() {
        return;
    }
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(CHAT_DRAFT_KEY, draft);
    }
}

/// Retrieve and clear a stashed chat draft.
pub fn take_chat_draft() -> Option<String> {
    let storage = local_storage()?;
    let draft = storage.get_item(CHAT_DRAFT_KEY).ok().flatten()?;
    let _ = storage.remove_item(CHAT_DRAFT_KEY);
    if draft.is_empty() {
        None
    } else {
        Some(draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "header.{}.signature",
            URL_SAFE_NO_PAD.encode(payload.as_bytes())
        )
    }

    #[test]
    fn parses_payload_claims() {
        let token = token_with_payload("{\"sub\":\"42\",\"exp\":1700000000,\"iat\":1699990000}");
        let claims = parse_claims(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("42"));
        assert_eq!(claims.exp, Some(1_700_000_000));
    }

    #[test]
    fn garbage_tokens_do_not_parse() {
        assert!(parse_claims("not-a-jwt").is_none());
        assert!(parse_claims("a.!!!!.c").is_none());
    }

    #[test]
    fn expiry_buffer_applies() {
        let claims = Claims {
            exp: Some(1_000),
            ..Default::default()
        };
        // Expiry at t=1_000_000ms with a 60s buffer: expired from 940_000ms on.
        assert!(!is_expired_at(&claims, 939_999));
        assert!(is_expired_at(&claims, 940_000));
        assert!(is_expired_at(&claims, 2_000_000));
    }

    #[test]
    fn missing_exp_counts_as_expired() {
        assert!(is_expired_at(&Claims::default(), 0));
        let token = token_with_payload("{\"sub\":\"42\"}");
        assert!(token_expired(&token));
    }
}
