use anyhow::Context;
use glimpse_capture::Capturer;
use glimpse_core::{Clipboard, Config, HotkeyRegistrar, KeySynth, Overlay, ScreenGrabber};
use glimpse_enhancer::Enhancer;
use glimpse_memory::{MemoryClient, MemoryStore};
use glimpse_model::LlmClient;
use glimpse_pipeline::Pipeline;
use glimpse_quick::QuickEnhance;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The five OS capability implementations injected by the host shell.
pub struct HostCapabilities {
    pub grabber: Arc<dyn ScreenGrabber>,
    pub clipboard: Arc<dyn Clipboard>,
    pub keys: Arc<dyn KeySynth>,
    pub registrar: Arc<dyn HotkeyRegistrar>,
    pub overlay: Arc<dyn Overlay>,
}

/// Composition root: owns the pipeline, the enhancer and both request
/// surfaces, and sequences startup and shutdown.
pub struct App {
    config: Config,
    pipeline: Arc<Pipeline>,
    enhancer: Arc<Enhancer>,
    quick: Arc<QuickEnhance>,
}

impl App {
    pub fn new(config: Config, caps: HostCapabilities) -> Self {
        let store: Arc<dyn MemoryStore> = Arc::new(MemoryClient::new(config.memory.clone()));
        let llm = Arc::new(LlmClient::new(&config.llm));
        let capturer = Capturer::new(config.capture.clone(), caps.grabber);

        let pipeline = Arc::new(Pipeline::new(
            config.clone(),
            capturer,
            llm,
            Arc::clone(&store),
        ));

        let enhancer = Arc::new(Enhancer::new(store));
        let quick = QuickEnhance::new(
            Arc::clone(&enhancer),
            caps.clipboard,
            caps.keys,
            caps.registrar,
            caps.overlay,
        );

        Self {
            config,
            pipeline,
            enhancer,
            quick,
        }
    }

    /// Run until interrupted. Startup aborts when the pipeline's dependency
    /// checks fail; a missing hotkey only costs the quick-enhance surface.
    pub async fn run(&self) -> anyhow::Result<()> {
        let token = CancellationToken::new();

        // Extension API for the browser extension
        let mut server_task = None;
        if self.config.extension.enabled {
            let enhancer = Arc::clone(&self.enhancer);
            let extension = self.config.extension.clone();
            let server_token = token.clone();
            server_task = Some(tokio::spawn(async move {
                if let Err(e) = glimpse_server::serve(enhancer, extension, server_token).await {
                    tracing::error!("extension API server failed: {}", e);
                }
            }));
        }

        // Quick enhance: selections arrive on a channel; without a desktop
        // shell attached we can only log the result
        let mut selections = self.quick.start(token.clone());
        let selection_quick = Arc::clone(&self.quick);
        let selection_task = tokio::spawn(async move {
            while let Some(text) = selections.recv().await {
                tracing::info!(chars = text.len(), "selection captured for enhancement");
                match selection_quick.enhance_prompt(&text).await {
                    Ok(result) => {
                        tracing::info!(
                            enhancement_type = %result.enhancement_type,
                            memories = result.memories_used.len(),
                            "selection enhanced"
                        );
                    }
                    Err(e) => tracing::warn!("quick enhancement failed: {}", e),
                }
                selection_quick.hide_overlay();
            }
        });

        let pipeline = Arc::clone(&self.pipeline);
        let pipeline_token = token.clone();
        let mut pipeline_task = tokio::spawn(async move { pipeline.run(pipeline_token).await });

        let run_result = tokio::select! {
            result = &mut pipeline_task => {
                // The pipeline only returns early when startup fails
                match result {
                    Ok(inner) => inner.context("pipeline failed"),
                    Err(join) => Err(anyhow::anyhow!("pipeline task panicked: {}", join)),
                }
            }
            _ = tokio::signal::ctrl_c() => Ok(()),
        };

        tracing::info!("shutting down");
        token.cancel();

        if !pipeline_task.is_finished() {
            if let Ok(Err(e)) = pipeline_task.await {
                tracing::error!("pipeline exited with error: {}", e);
            }
        }
        if let Some(task) = server_task {
            let _ = task.await;
        }
        selection_task.abort();

        run_result
    }
}
