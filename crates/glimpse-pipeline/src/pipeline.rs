use crate::worker::{SharedState, Worker};
use glimpse_capture::{platform, Capture, Capturer};
use glimpse_core::{Config, Error, Result};
use glimpse_memory::MemoryStore;
use glimpse_model::Llm;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Snapshot of the orchestrator for status displays.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub running: bool,
    pub platform: &'static str,
    pub last_state: String,
    pub capture_interval: u64,
    pub capture_enabled: bool,
    pub captures_stored: u64,
}

/// Orchestrates the capture → analyse → store pipeline and exposes the
/// conversational entry point.
pub struct Pipeline {
    config: Config,
    capturer: Capturer,
    llm: Arc<dyn Llm>,
    store: Arc<dyn MemoryStore>,
    shared: Arc<SharedState>,
    running: AtomicBool,
    /// Set while an analyse/store job is in flight; ticks arriving then
    /// are dropped
    busy: Arc<AtomicBool>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        capturer: Capturer,
        llm: Arc<dyn Llm>,
        store: Arc<dyn MemoryStore>,
    ) -> Self {
        Self {
            config,
            capturer,
            llm,
            store,
            shared: Arc::new(SharedState::default()),
            running: AtomicBool::new(false),
            busy: Arc::new(AtomicBool::new(false)),
            in_flight: Mutex::new(None),
        }
    }

    /// Verify both external dependencies answer before starting the loop.
    pub async fn check_dependencies(&self) -> Result<()> {
        self.llm.check_health().await.map_err(|e| {
            Error::llm(format!(
                "LLM not available at {}: {}",
                self.config.llm.base_url, e
            ))
        })?;
        tracing::info!("LLM connected");

        self.store.check_health().await.map_err(|e| {
            Error::memory(format!(
                "memory service not available at {}: {}",
                self.config.memory.base_url, e
            ))
        })?;
        tracing::info!("memory service connected");

        Ok(())
    }

    /// Run the pipeline until `token` is cancelled. Health checks failing
    /// abort startup; everything after that is best-effort.
    pub async fn run(&self, token: CancellationToken) -> Result<()> {
        self.check_dependencies().await?;

        tracing::info!(
            interval = self.config.capture.interval_seconds,
            platform = platform(),
            "pipeline started"
        );
        self.running.store(true, Ordering::Release);

        if self.config.capture.enabled {
            self.capture_loop(&token).await;
        } else {
            token.cancelled().await;
        }

        // Join the in-flight job before reporting shutdown
        let handle = self.in_flight.lock().ok().and_then(|mut h| h.take());
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        self.running.store(false, Ordering::Release);
        tracing::info!("pipeline stopped");
        Ok(())
    }

    /// Periodic capture loop. The first tick fires immediately, then on the
    /// configured interval (floored at 1 s).
    async fn capture_loop(&self, token: &CancellationToken) {
        let period = Duration::from_secs(self.config.capture.interval_seconds.max(1));
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick(token);
                }
                _ = token.cancelled() => {
                    tracing::debug!("capture loop shutting down");
                    break;
                }
            }
        }
    }

    /// Grab one capture and hand it to the worker. Called on the ticker's
    /// scheduling slot; the grab itself may block on the window server for
    /// tens of milliseconds, which the multi-threaded runtime absorbs.
    fn on_tick(&self, token: &CancellationToken) {
        let capture = match self.capturer.capture_primary() {
            Ok(capture) => capture,
            Err(e) => {
                tracing::debug!("capture failed: {}", e);
                return;
            }
        };

        tracing::debug!(
            display = capture.display_num,
            bytes = capture.jpeg.len(),
            "captured display"
        );

        if !self.config.app.process_on_capture {
            return;
        }

        self.dispatch(capture, token);
    }

    /// Spawn the analyse/store job unless one is already in flight. A tick
    /// arriving while the worker is busy is dropped rather than queued.
    /// Returns whether the job was dispatched.
    pub(crate) fn dispatch(&self, capture: Capture, token: &CancellationToken) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.shared.ticks_dropped.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("analysis busy, dropping tick");
            return false;
        }

        let worker = Worker {
            llm: Arc::clone(&self.llm),
            store: Arc::clone(&self.store),
            shared: Arc::clone(&self.shared),
            memory_window: self.config.app.memory_window,
        };
        let busy = Arc::clone(&self.busy);
        let token = token.clone();

        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = worker.process(capture) => {}
                _ = token.cancelled() => {
                    tracing::debug!("in-flight job cancelled");
                }
            }
            busy.store(false, Ordering::Release);
        });

        if let Ok(mut in_flight) = self.in_flight.lock() {
            *in_flight = Some(handle);
        }
        true
    }

    /// Answer a question from memory: retrieve relevant contents, then
    /// generate grounded text.
    pub async fn chat(&self, message: &str) -> Result<String> {
        let memories = match self
            .store
            .search(message, self.config.app.memory_window)
            .await
        {
            Ok(results) => results
                .into_iter()
                .map(|r| r.memory.content)
                .collect::<Vec<_>>(),
            Err(e) => {
                tracing::debug!("memory search failed: {}", e);
                Vec::new()
            }
        };

        self.llm.generate(message, &memories).await
    }

    pub fn status(&self) -> Status {
        Status {
            running: self.running.load(Ordering::Acquire),
            platform: platform(),
            last_state: self.shared.last_state(),
            capture_interval: self.config.capture.interval_seconds,
            capture_enabled: self.config.capture.enabled,
            captures_stored: self.shared.captures_taken.load(Ordering::Relaxed),
        }
    }

    #[cfg(test)]
    pub(crate) fn ticks_dropped(&self) -> u64 {
        self.shared.ticks_dropped.load(Ordering::Relaxed)
    }
}
