use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub llm_model: String,
    #[serde(default)]
    pub embedding_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_k")]
    pub top_k: i32,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_top_k() -> i32 {
    5
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            llm_model: String::new(),
            embedding_model: String::new(),
            temperature: default_temperature(),
            top_k: default_top_k(),
        }
    }
}

/// Model choices exposed by `GET /settings/models`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default)]
    pub llm_models: Vec<String>,
    #[serde(default)]
    pub embedding_models: Vec<String>,
}
