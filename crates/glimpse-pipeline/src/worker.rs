use glimpse_capture::Capture;
use glimpse_memory::{MemoryStore, Metadata};
use glimpse_model::Llm;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// State shared between the ticker, the in-flight job and status readers.
#[derive(Default)]
pub(crate) struct SharedState {
    pub captures_taken: AtomicU64,
    pub ticks_dropped: AtomicU64,
    pub last_state: Mutex<String>,
}

impl SharedState {
    pub fn last_state(&self) -> String {
        self.last_state
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    pub fn set_last_state(&self, summary: &str) {
        if let Ok(mut state) = self.last_state.lock() {
            *state = summary.to_string();
        }
    }
}

/// The analyse-and-store job body. One instance is shared by every spawned
/// job; the busy flag in the pipeline guarantees only one runs at a time.
pub(crate) struct Worker {
    pub llm: Arc<dyn Llm>,
    pub store: Arc<dyn MemoryStore>,
    pub shared: Arc<SharedState>,
    pub memory_window: usize,
}

impl Worker {
    /// Process one capture: rolling context → analysis → stored memory.
    /// Every failure drops the capture; nothing here is fatal.
    pub async fn process(&self, capture: Capture) {
        let previous_context = match self.store.get_recent(self.memory_window).await {
            Ok(memories) => memories
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join(" "),
            Err(e) => {
                tracing::debug!("failed to get recent memories: {}", e);
                String::new()
            }
        };

        let result = match self.llm.analyze(&capture.jpeg, &previous_context).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!("analysis failed: {}", e);
                return;
            }
        };

        let content = format!(
            "{} | Context: {} | Intent: {}",
            result.summary, result.context, result.user_intent
        );

        let metadata = Metadata {
            timestamp: capture.timestamp.to_rfc3339(),
            context: result.context.clone(),
            activities: result.activities.clone(),
            key_elements: result.key_elements.clone(),
            user_intent: result.user_intent.clone(),
            display_num: capture.display_num,
        };

        if let Err(e) = self.store.add(&content, metadata).await {
            tracing::debug!("failed to store memory: {}", e);
            return;
        }

        self.shared.set_last_state(&result.summary);
        self.shared.captures_taken.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("memory stored: {}", result.summary);
    }
}
