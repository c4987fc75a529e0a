use crate::types::{Memory, Metadata, SearchResult};
use async_trait::async_trait;
use glimpse_core::Result;

/// Memory store operations used by the pipeline and the enhancer.
///
/// `search` returns results ordered by non-increasing score and an empty
/// vector (never an error) when the backend has no matches.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Store a new memory; returns the stored record with the backend's id
    /// when the backend assigns one.
    async fn add(&self, content: &str, metadata: Metadata) -> Result<Memory>;

    /// Retrieve memories relevant to `query`, best match first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>>;

    /// List the most recent memories, newest first. Ordering is
    /// best-effort; the backend may not preserve it strictly.
    async fn get_recent(&self, limit: usize) -> Result<Vec<Memory>>;

    /// Delete a memory by id.
    async fn delete(&self, id: &str) -> Result<()>;

    /// Probe the backend's health endpoint.
    async fn check_health(&self) -> Result<()>;
}
