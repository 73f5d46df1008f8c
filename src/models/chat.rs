use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One turn of conversation context sent with a streaming request. The
/// backend expects at most the last few turns; the chat page trims to ten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub role: String,
    pub content: String,
}

/// Body of `POST /chat/stream`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatStreamRequest {
    pub kb_id: String,
    pub message: String,
    pub history: Vec<HistoryMessage>,
}

/// Persisted history entry returned by `GET /chat/history/{kb_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatHistoryEntry {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Client-side message bubble state.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayMessage {
    pub id: String,
    pub role: String,
    pub content: String,
    pub streaming: bool,
    pub error: bool,
}

impl DisplayMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: "user".to_string(),
            content: content.into(),
            streaming: false,
            error: false,
        }
    }

    pub fn assistant_placeholder() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: "assistant".to_string(),
            content: String::new(),
            streaming: true,
            error: false,
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == "user"
    }
}

impl From<ChatHistoryEntry> for DisplayMessage {
    fn from(entry: ChatHistoryEntry) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role: entry.role,
            content: entry.content,
            streaming: false,
            error: false,
        }
    }
}
