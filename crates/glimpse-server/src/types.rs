use glimpse_enhancer::{EnhancementType, MemoryInfo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct EnhanceRequest {
    #[serde(default)]
    pub prompt: String,
    /// Optional page context tag, e.g. which chat site the extension is on
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub max_memories: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnhanceResponse {
    pub original_prompt: String,
    pub enhanced_prompt: String,
    pub memories_used: Vec<String>,
    pub memory_count: usize,
    pub enhancement_type: EnhancementType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub memories: Vec<MemoryInfo>,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub port: u16,
    pub stats: glimpse_enhancer::EnhancerStats,
}
