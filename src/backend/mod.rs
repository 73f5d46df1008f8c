pub mod error;

use std::time::Duration;

use log::debug;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::chat::{ChatHistoryEntry, ChatStreamRequest};
use crate::models::knowledgebase::{Knowledgebase, KnowledgebaseDraft, Paged};
use crate::models::document::DocumentView;
use crate::models::settings::{AppSettings, ModelCatalog};
use crate::models::upload::{FileUrl, UploadedImage};
use crate::models::user::{AuthResponse, Credentials, Registration, UserView};

pub use error::BackendError;

const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
/// Applied to plain request/response calls. Streaming requests carry no
/// timeout: the read loop is bounded by its cancellation token instead.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed client for the remote RAG backend. Owned by `AppState` and handed to
/// server functions and the stream relay; constructed once at startup.
#[derive(Clone)]
pub struct Backend {
    http: Client,
    base_url: String,
}

impl Backend {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("RAGLINE_BACKEND_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        debug!("backend client created for {base_url}");
        Self {
            http: Client::new(),
            base_url,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // -- auth ---------------------------------------------------------------

    pub async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, BackendError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .timeout(REQUEST_TIMEOUT)
            .json(credentials)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(classify_failure(response, true).await);
        }
        let value: Value = response.json().await?;
        serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
    }

    pub async fn register(&self, registration: &Registration) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .timeout(REQUEST_TIMEOUT)
            .json(registration)
            .send()
            .await?;
        expect_ok(response, true).await
    }

    pub async fn current_user(&self, bearer: &str) -> Result<UserView, BackendError> {
        self.get_json(self.http.get(self.url("/auth/me")).bearer_auth(bearer))
            .await
    }

    pub async fn logout(&self, bearer: &str) -> Result<(), BackendError> {
        let response = self
            .http
            .post(self.url("/auth/logout"))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(bearer)
            .send()
            .await?;
        expect_ok(response, false).await
    }

    // -- knowledge bases ----------------------------------------------------

    pub async fn list_knowledgebases(
        &self,
        bearer: &str,
        page: i64,
        page_size: i64,
    ) -> Result<Paged<Knowledgebase>, BackendError> {
        self.get_json(
            self.http
                .get(self.url("/kb"))
                .bearer_auth(bearer)
                .query(&[("page", page), ("page_size", page_size)]),
        )
        .await
    }

    pub async fn get_knowledgebase(
        &self,
        bearer: &str,
        id: &str,
    ) -> Result<Knowledgebase, BackendError> {
        self.get_json(
            self.http
                .get(self.url(&format!("/kb/{id}")))
                .bearer_auth(bearer),
        )
        .await
    }

    pub async fn create_knowledgebase(
        &self,
        bearer: &str,
        draft: &KnowledgebaseDraft,
    ) -> Result<Knowledgebase, BackendError> {
        self.get_json(
            self.http
                .post(self.url("/kb"))
                .bearer_auth(bearer)
                .json(draft),
        )
        .await
    }

    pub async fn update_knowledgebase(
        &self,
        bearer: &str,
        id: &str,
        draft: &KnowledgebaseDraft,
    ) -> Result<Knowledgebase, BackendError> {
        self.get_json(
            self.http
                .put(self.url(&format!("/kb/{id}")))
                .bearer_auth(bearer)
                .json(draft),
        )
        .await
    }

    pub async fn delete_knowledgebase(&self, bearer: &str, id: &str) -> Result<(), BackendError> {
        let response = self
            .http
            .delete(self.url(&format!("/kb/{id}")))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(bearer)
            .send()
            .await?;
        expect_ok(response, false).await
    }

    // -- documents ----------------------------------------------------------

    pub async fn list_documents(
        &self,
        bearer: &str,
        kb_id: &str,
        page: i64,
        page_size: i64,
    ) -> Result<Paged<DocumentView>, BackendError> {
        self.get_json(
            self.http
                .get(self.url(&format!("/kb/{kb_id}/documents")))
                .bearer_auth(bearer)
                .query(&[("page", page), ("page_size", page_size)]),
        )
        .await
    }

    pub async fn upload_document(
        &self,
        bearer: &str,
        kb_id: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<DocumentView, BackendError> {
        let part = Part::bytes(bytes).file_name(filename.to_string());
        let form = Form::new().part("file", part);
        self.get_json(
            self.http
                .post(self.url(&format!("/kb/{kb_id}/documents")))
                .bearer_auth(bearer)
                .multipart(form),
        )
        .await
    }

    pub async fn delete_document(
        &self,
        bearer: &str,
        kb_id: &str,
        doc_id: &str,
    ) -> Result<(), BackendError> {
        let response = self
            .http
            .delete(self.url(&format!("/kb/{kb_id}/documents/{doc_id}")))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(bearer)
            .send()
            .await?;
        expect_ok(response, false).await
    }

    // -- chat ---------------------------------------------------------------

    /// Open the backend's chat stream. The returned response is checked for
    /// auth/permission failures but its body is left untouched so the relay
    /// can pump it incrementally.
    pub async fn open_chat_stream(
        &self,
        bearer: &str,
        request: &ChatStreamRequest,
    ) -> Result<Response, BackendError> {
        let response = self
            .http
            .post(self.url("/chat/stream"))
            .bearer_auth(bearer)
            .json(request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(classify_failure(response, false).await);
        }
        Ok(response)
    }

    pub async fn chat_history(
        &self,
        bearer: &str,
        kb_id: &str,
    ) -> Result<Vec<ChatHistoryEntry>, BackendError> {
        self.get_json(
            self.http
                .get(self.url(&format!("/chat/history/{kb_id}")))
                .bearer_auth(bearer),
        )
        .await
    }

    pub async fn clear_chat_history(&self, bearer: &str, kb_id: &str) -> Result<(), BackendError> {
        let response = self
            .http
            .delete(self.url(&format!("/chat/history/{kb_id}")))
            .timeout(REQUEST_TIMEOUT)
            .bearer_auth(bearer)
            .send()
            .await?;
        expect_ok(response, false).await
    }

    // -- settings -----------------------------------------------------------

    pub async fn settings(&self, bearer: &str) -> Result<AppSettings, BackendError> {
        self.get_json(self.http.get(self.url("/settings")).bearer_auth(bearer))
            .await
    }

    pub async fn update_settings(
        &self,
        bearer: &str,
        settings: &AppSettings,
    ) -> Result<AppSettings, BackendError> {
        self.get_json(
            self.http
                .put(self.url("/settings"))
                .bearer_auth(bearer)
                .json(settings),
        )
        .await
    }

    pub async fn model_catalog(&self, bearer: &str) -> Result<ModelCatalog, BackendError> {
        self.get_json(
            self.http
                .get(self.url("/settings/models"))
                .bearer_auth(bearer),
        )
        .await
    }

    // -- uploads ------------------------------------------------------------

    pub async fn upload_image(
        &self,
        bearer: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
        biz_type: &str,
    ) -> Result<UploadedImage, BackendError> {
        let part = Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| BackendError::Decode(e.to_string()))?;
        let form = Form::new()
            .part("file", part)
            .text("biz_type", biz_type.to_string());
        self.get_json(
            self.http
                .post(self.url("/upload/image"))
                .bearer_auth(bearer)
                .multipart(form),
        )
        .await
    }

    pub async fn file_url(
        &self,
        bearer: &str,
        object_key: &str,
        expires: i64,
    ) -> Result<FileUrl, BackendError> {
        self.get_json(
            self.http
                .get(self.url("/upload/url"))
                .bearer_auth(bearer)
                .query(&[("object_key", object_key.to_string()), ("expires", expires.to_string())]),
        )
        .await
    }

    // -- plumbing -----------------------------------------------------------

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request.timeout(REQUEST_TIMEOUT).send().await?;
        if !response.status().is_success() {
            return Err(classify_failure(response, false).await);
        }
        let value: Value = response.json().await?;
        unwrap_envelope(value)
    }
}

/// Map a non-success response to the error taxonomy. A 401 on a credentials
/// endpoint is a credential failure; everywhere else it means the session is
/// no longer accepted.
async fn classify_failure(response: Response, auth_endpoint: bool) -> BackendError {
    let status = response.status();
    let message = response
        .json::<Value>()
        .await
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string));
    match status {
        StatusCode::UNAUTHORIZED if auth_endpoint => BackendError::Credentials(
            message.unwrap_or_else(|| "invalid username or password".to_string()),
        ),
        StatusCode::UNAUTHORIZED => BackendError::SessionExpired,
        StatusCode::FORBIDDEN => BackendError::Forbidden,
        _ => BackendError::Api(
            message.unwrap_or_else(|| format!("request failed with status {status}")),
        ),
    }
}

async fn expect_ok(response: Response, auth_endpoint: bool) -> Result<(), BackendError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(classify_failure(response, auth_endpoint).await)
    }
}

/// The backend wraps most payloads as `{ "data": … }` but some deployments
/// return the bare object. Prefer the envelope, fall back to the whole body.
pub fn unwrap_envelope<T: DeserializeOwned>(value: Value) -> Result<T, BackendError> {
    if let Some(data) = value.get("data") {
        if !data.is_null() {
            if let Ok(parsed) = serde_json::from_value::<T>(data.clone()) {
                return Ok(parsed);
            }
        }
    }
    serde_json::from_value(value).map_err(|e| BackendError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::knowledgebase::Paged;

    #[test]
    fn envelope_is_preferred() {
        let value = serde_json::json!({ "data": { "items": [], "total": 3 } });
        let paged: Paged<i32> = unwrap_envelope(value).unwrap();
        assert_eq!(paged.total, 3);
    }

    #[test]
    fn bare_body_is_accepted() {
        let value = serde_json::json!({ "items": [1, 2], "total": 2 });
        let paged: Paged<i32> = unwrap_envelope(value).unwrap();
        assert_eq!(paged.items, vec![1, 2]);
    }

    #[test]
    fn mismatched_body_is_a_decode_error() {
        let value = serde_json::json!("nonsense");
        let result: Result<Paged<i32>, _> = unwrap_envelope(value);
        assert!(matches!(result, Err(BackendError::Decode(_))));
    }
}
