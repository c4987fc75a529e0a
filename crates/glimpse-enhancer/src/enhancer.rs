use crate::strategy::{build_enhancement, EnhancementResult};
use chrono::{DateTime, Utc};
use glimpse_core::Result;
use glimpse_memory::MemoryStore;
use serde::Serialize;
use std::sync::{Arc, RwLock};

/// A simplified memory record for the browser extension.
#[derive(Debug, Clone, Serialize)]
pub struct MemoryInfo {
    pub id: String,
    pub content: String,
    pub context: String,
    pub score: f64,
    pub date: DateTime<Utc>,
}

/// Per-process enhancement counters, reported by the status endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnhancerStats {
    pub enhancements_made: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_enhancement: Option<DateTime<Utc>>,
}

/// Enhances prompts with relevant stored memories.
pub struct Enhancer {
    store: Arc<dyn MemoryStore>,
    stats: RwLock<EnhancerStats>,
}

impl Enhancer {
    pub fn new(store: Arc<dyn MemoryStore>) -> Self {
        Self {
            store,
            stats: RwLock::new(EnhancerStats::default()),
        }
    }

    /// Enhance `prompt` with up to `max_memories` retrieved memories.
    ///
    /// Never fails on an empty store: with no matches the prompt passes
    /// through unchanged with type `none`.
    pub async fn enhance(
        &self,
        prompt: &str,
        page_context: &str,
        max_memories: usize,
    ) -> Result<EnhancementResult> {
        let results = self.store.search(prompt, max_memories).await?;
        tracing::debug!(
            count = results.len(),
            page_context,
            "retrieved memories for enhancement"
        );

        let result = build_enhancement(prompt, &results);

        if let Ok(mut stats) = self.stats.write() {
            stats.enhancements_made += 1;
            stats.last_enhancement = Some(Utc::now());
        }

        tracing::debug!(
            memories = result.memories_used.len(),
            enhancement_type = %result.enhancement_type,
            "enhanced prompt"
        );

        Ok(result)
    }

    /// One-shot enhancement for short prompts: three memories, enhanced
    /// text only.
    pub async fn quick_enhance(&self, prompt: &str) -> Result<String> {
        let result = self.enhance(prompt, "", 3).await?;
        Ok(result.enhanced_prompt)
    }

    /// Search memories without enhancing, in the simplified extension
    /// shape.
    pub async fn search_memories(&self, query: &str, limit: usize) -> Result<Vec<MemoryInfo>> {
        let results = self.store.search(query, limit).await?;
        Ok(results
            .into_iter()
            .map(|r| MemoryInfo {
                id: r.memory.id,
                content: r.memory.content,
                context: r.memory.metadata.context,
                score: r.score,
                date: r.memory.created_at,
            })
            .collect())
    }

    /// List the most recent memories in the simplified extension shape.
    pub async fn recent_memories(&self, limit: usize) -> Result<Vec<MemoryInfo>> {
        let memories = self.store.get_recent(limit).await?;
        Ok(memories
            .into_iter()
            .map(|m| MemoryInfo {
                id: m.id,
                content: m.content,
                context: m.metadata.context,
                score: 0.0,
                date: m.created_at,
            })
            .collect())
    }

    /// Snapshot of the per-process counters.
    pub fn stats(&self) -> EnhancerStats {
        self.stats
            .read()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::EnhancementType;
    use async_trait::async_trait;
    use glimpse_memory::{Memory, Metadata, SearchResult};

    struct FixedStore {
        results: Vec<SearchResult>,
    }

    #[async_trait]
    impl MemoryStore for FixedStore {
        async fn add(&self, content: &str, metadata: Metadata) -> Result<Memory> {
            Ok(Memory {
                id: "new".to_string(),
                content: content.to_string(),
                user_id: "u".to_string(),
                metadata,
                created_at: Utc::now(),
            })
        }

        async fn search(&self, _query: &str, limit: usize) -> Result<Vec<SearchResult>> {
            Ok(self.results.iter().take(limit).cloned().collect())
        }

        async fn get_recent(&self, limit: usize) -> Result<Vec<Memory>> {
            Ok(self
                .results
                .iter()
                .take(limit)
                .map(|r| r.memory.clone())
                .collect())
        }

        async fn delete(&self, _id: &str) -> Result<()> {
            Ok(())
        }

        async fn check_health(&self) -> Result<()> {
            Ok(())
        }
    }

    fn seeded(results: Vec<(f64, &str)>) -> Enhancer {
        let results = results
            .into_iter()
            .map(|(score, content)| SearchResult {
                memory: Memory {
                    id: String::new(),
                    content: content.to_string(),
                    user_id: "u".to_string(),
                    metadata: Metadata::default(),
                    created_at: Utc::now(),
                },
                score,
                distance: 1.0 - score,
            })
            .collect();
        Enhancer::new(Arc::new(FixedStore { results }))
    }

    #[tokio::test]
    async fn test_enhance_empty_store() {
        let enhancer = seeded(vec![]);
        let out = enhancer.enhance("q", "", 5).await.unwrap();
        assert_eq!(out.enhanced_prompt, "q");
        assert_eq!(out.enhancement_type, EnhancementType::None);
        assert!(out.memories_used.is_empty());
    }

    #[tokio::test]
    async fn test_enhance_single_strong_match() {
        let enhancer = seeded(vec![(0.9, "You prefer British spelling.")]);
        let out = enhancer.enhance("write a paragraph", "", 5).await.unwrap();
        assert_eq!(out.enhancement_type, EnhancementType::Contextual);
        assert!(out
            .enhanced_prompt
            .contains("- You prefer British spelling.\n"));
        assert_eq!(out.memories_used.len(), 1);
    }

    #[tokio::test]
    async fn test_stats_track_enhancements() {
        let enhancer = seeded(vec![(0.9, "A")]);
        assert_eq!(enhancer.stats().enhancements_made, 0);
        assert!(enhancer.stats().last_enhancement.is_none());

        enhancer.enhance("q", "", 5).await.unwrap();
        enhancer.enhance("q", "", 5).await.unwrap();

        let stats = enhancer.stats();
        assert_eq!(stats.enhancements_made, 2);
        assert!(stats.last_enhancement.is_some());
    }

    #[tokio::test]
    async fn test_quick_enhance_returns_text() {
        let enhancer = seeded(vec![(0.4, "X")]);
        let text = enhancer.quick_enhance("q").await.unwrap();
        assert!(text.starts_with("q"));
        assert!(text.contains("[Note: Consider previous context: X]"));
    }

    #[tokio::test]
    async fn test_search_memories_shape() {
        let enhancer = seeded(vec![(0.8, "remembered")]);
        let memories = enhancer.search_memories("q", 5).await.unwrap();
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0].content, "remembered");
        assert_eq!(memories[0].score, 0.8);
    }

    #[tokio::test]
    async fn test_recent_memories_shape() {
        let enhancer = seeded(vec![(0.8, "latest")]);
        let memories = enhancer.recent_memories(5).await.unwrap();
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0].content, "latest");
    }
}
