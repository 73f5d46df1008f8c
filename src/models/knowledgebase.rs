use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const DEFAULT_CHUNK_SIZE: i32 = 512;
pub const DEFAULT_CHUNK_OVERLAP: i32 = 50;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Knowledgebase {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub chunk_size: Option<i32>,
    #[serde(default)]
    pub chunk_overlap: Option<i32>,
    #[serde(default)]
    pub document_count: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Create/update payload produced by the knowledge-base form modal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgebaseDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub chunk_size: i32,
    pub chunk_overlap: i32,
    #[serde(default)]
    pub cover_key: Option<String>,
}

impl Default for KnowledgebaseDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            cover_key: None,
        }
    }
}

fn first_page() -> i64 {
    1
}

/// Paginated listing envelope used by the backend for collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paged<T> {
    #[serde(default)]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: i64,
    #[serde(default = "first_page")]
    pub page: i64,
    #[serde(default)]
    pub page_size: i64,
}

impl<T> Paged<T> {
    pub fn page_count(&self) -> i64 {
        if self.page_size <= 0 {
            return 1;
        }
        (self.total + self.page_size - 1) / self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        let paged: Paged<i32> = Paged {
            items: vec![],
            total: 21,
            page: 1,
            page_size: 10,
        };
        assert_eq!(paged.page_count(), 3);
    }

    #[test]
    fn paged_tolerates_missing_fields() {
        let paged: Paged<i32> = serde_json::from_str("{\"items\":[1,2]}").unwrap();
        assert_eq!(paged.items, vec![1, 2]);
        assert_eq!(paged.page, 1);
        assert_eq!(paged.total, 0);
    }
}
