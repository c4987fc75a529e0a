use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One persisted unit in the external vector store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub content: String,
    pub user_id: String,
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// Metadata attached to every memory. Round-trips through the memory
/// service unchanged except for fields the service may enrich.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Capture time, RFC 3339. The authoritative ordering key for
    /// downstream consumers.
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub key_elements: Vec<String>,
    #[serde(default)]
    pub user_intent: String,
    #[serde(default)]
    pub display_num: u32,
}

/// A memory plus its retrieval relevance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub memory: Memory,
    /// Higher is more relevant
    pub score: f64,
    /// Lower is closer
    pub distance: f64,
}
