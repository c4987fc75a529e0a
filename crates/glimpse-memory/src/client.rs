use crate::service::MemoryStore;
use crate::types::{Memory, Metadata, SearchResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glimpse_core::{Dialect, Error, MemoryConfig, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the external vector memory service.
pub struct MemoryClient {
    config: MemoryConfig,
    client: Client,
}

impl MemoryClient {
    pub fn new(config: MemoryConfig) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.config.api_key.is_empty() {
            builder
        } else {
            builder.header("Authorization", format!("Bearer {}", self.config.api_key))
        }
    }

    fn build_add_payload(&self, content: &str, metadata: &Metadata) -> Value {
        match self.config.dialect {
            Dialect::Message => json!({
                "messages": [{"role": "user", "content": content}],
                "user_id": self.config.user_id,
                "agent_id": self.config.collection_name,
                "metadata": metadata,
            }),
            Dialect::Content => json!({
                "content": content,
                "container_tag": self.config.collection_name,
                "metadata": metadata,
            }),
        }
    }

    fn build_search_payload(&self, query: &str, limit: usize) -> Value {
        match self.config.dialect {
            Dialect::Message => json!({
                "query": query,
                "user_id": self.config.user_id,
                "agent_id": self.config.collection_name,
                "limit": limit,
            }),
            Dialect::Content => json!({
                "q": query,
                "container_tag": self.config.collection_name,
                "limit": limit,
            }),
        }
    }

    fn recent_query(&self, limit: usize) -> Vec<(&'static str, String)> {
        match self.config.dialect {
            Dialect::Message => vec![
                ("user_id", self.config.user_id.clone()),
                ("agent_id", self.config.collection_name.clone()),
                ("limit", limit.to_string()),
            ],
            Dialect::Content => vec![
                ("container_tag", self.config.collection_name.clone()),
                ("limit", limit.to_string()),
            ],
        }
    }
}

#[async_trait]
impl MemoryStore for MemoryClient {
    async fn add(&self, content: &str, metadata: Metadata) -> Result<Memory> {
        let payload = self.build_add_payload(content, &metadata);

        let response = self
            .authorize(self.client.post(self.url("/v1/memories/")))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::memory(format!("add request failed: {}", e)))?;

        let status = response.status();
        if !(status == 200 || status == 201) {
            return Err(Error::memory(format!("add returned status {}", status)));
        }

        // The backend may omit the assigned id; the record is still usable
        // locally with an empty one.
        let id = response
            .json::<Value>()
            .await
            .ok()
            .and_then(|v| v.get("id").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_default();

        Ok(Memory {
            id,
            content: content.to_string(),
            user_id: self.config.user_id.clone(),
            metadata,
            created_at: Utc::now(),
        })
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>> {
        let limit = if limit == 0 { 10 } else { limit };
        let payload = self.build_search_payload(query, limit);

        let response = self
            .authorize(self.client.post(self.url("/v1/memories/search/")))
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::memory(format!("search request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::memory(format!(
                "search returned status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::memory(format!("decoding search response: {}", e)))?;

        let results = parse_search_response(body);
        tracing::debug!(count = results.len(), "memory search returned");
        Ok(results)
    }

    async fn get_recent(&self, limit: usize) -> Result<Vec<Memory>> {
        let response = self
            .authorize(self.client.get(self.url("/v1/memories/")))
            .query(&self.recent_query(limit))
            .send()
            .await
            .map_err(|e| Error::memory(format!("list request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::memory(format!(
                "list returned status {}",
                response.status()
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::memory(format!("decoding list response: {}", e)))?;

        Ok(parse_memory_list(body))
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let response = self
            .authorize(self.client.delete(self.url(&format!("/v1/memories/{}", id))))
            .send()
            .await
            .map_err(|e| Error::memory(format!("delete request failed: {}", e)))?;

        let status = response.status();
        if !(status == 200 || status == 204) {
            return Err(Error::memory(format!("delete returned status {}", status)));
        }

        Ok(())
    }

    async fn check_health(&self) -> Result<()> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| Error::memory(format!("health check failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::memory(format!(
                "health check returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// One search hit as the service encodes it: memory text under a `memory`
/// key, relevance as `score`/`distance`.
#[derive(Debug, Default, Deserialize)]
struct WireSearchEntry {
    #[serde(default)]
    id: String,
    #[serde(default, rename = "memory")]
    content: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    score: f64,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    created_at: String,
}

#[derive(Debug, Default, Deserialize)]
struct WireMemory {
    #[serde(default)]
    id: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    user_id: String,
    #[serde(default)]
    metadata: Metadata,
    #[serde(default)]
    created_at: String,
}

/// Pull the entry array out of either response shape: a bare top-level
/// list or a `{"results": [...]}` envelope. Which one arrives depends on
/// the backend version, so both are accepted.
fn extract_entries(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("results") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

fn parse_search_response(body: Value) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = extract_entries(body)
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<WireSearchEntry>(entry).ok())
        .map(|entry| SearchResult {
            memory: Memory {
                id: entry.id,
                content: entry.content,
                user_id: entry.user_id,
                metadata: entry.metadata,
                created_at: parse_time(&entry.created_at),
            },
            score: entry.score,
            distance: entry.distance,
        })
        .collect();

    // Callers rely on best-match-first ordering
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results
}

fn parse_memory_list(body: Value) -> Vec<Memory> {
    extract_entries(body)
        .into_iter()
        .filter_map(|entry| serde_json::from_value::<WireMemory>(entry).ok())
        .map(|entry| Memory {
            id: entry.id,
            content: entry.content,
            user_id: entry.user_id,
            metadata: entry.metadata,
            created_at: parse_time(&entry.created_at),
        })
        .collect()
}

fn parse_time(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
