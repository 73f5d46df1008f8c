use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Extensions the backend's ingestion pipeline accepts.
pub const ALLOWED_DOCUMENT_EXTENSIONS: [&str; 4] = ["txt", "md", "pdf", "docx"];
pub const MAX_DOCUMENT_BYTES: f64 = 20.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Processing,
    Ready,
    Failed,
}

impl DocumentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "pending",
            DocumentStatus::Processing => "processing",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Failed => "failed",
        }
    }

    pub fn badge_class(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "bg-gray-200 text-gray-700 dark:bg-gray-700 dark:text-gray-200",
            DocumentStatus::Processing => "bg-amber-100 text-amber-700 dark:bg-amber-900 dark:text-amber-200",
            DocumentStatus::Ready => "bg-emerald-100 text-emerald-700 dark:bg-emerald-900 dark:text-emerald-200",
            DocumentStatus::Failed => "bg-rose-100 text-rose-700 dark:bg-rose-900 dark:text-rose-200",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentView {
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub size_bytes: Option<i64>,
    #[serde(default)]
    pub chunk_count: Option<i32>,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

pub fn human_size(bytes: i64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}

/// Case-insensitive extension allowlist check for the upload modal.
pub fn extension_allowed(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_DOCUMENT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_size_picks_sane_units() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn extension_allowlist() {
        assert!(extension_allowed("notes.md"));
        assert!(extension_allowed("REPORT.PDF"));
        assert!(!extension_allowed("malware.exe"));
        assert!(!extension_allowed("no_extension"));
    }

    #[test]
    fn status_parses_lowercase() {
        let doc: DocumentView =
            serde_json::from_str("{\"id\":\"d1\",\"filename\":\"a.txt\",\"status\":\"processing\"}")
                .unwrap();
        assert_eq!(doc.status, DocumentStatus::Processing);
    }
}
