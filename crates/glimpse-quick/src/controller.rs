use glimpse_core::{
    Clipboard, Error, HotkeyCombo, HotkeyHandle, HotkeyModifier, HotkeyRegistrar, KeySynth,
    Overlay, Result,
};
use glimpse_enhancer::{EnhancementResult, Enhancer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio_util::sync::CancellationToken;

/// Foreground apps need a moment to service the copy chord before the
/// clipboard holds the selection.
const COPY_SETTLE: Duration = Duration::from_millis(100);
const CLIPBOARD_CLEAR_SETTLE: Duration = Duration::from_millis(20);
const PRE_CHORD_SETTLE: Duration = Duration::from_millis(50);
/// How long the grabbed/enhanced text stays on the clipboard before the
/// user's original content is restored.
const RESTORE_AFTER_COPY: Duration = Duration::from_millis(200);
const RESTORE_AFTER_PASTE: Duration = Duration::from_millis(500);

const ENHANCE_DEADLINE: Duration = Duration::from_secs(10);
const QUICK_MAX_MEMORIES: usize = 5;

/// Drives the hotkey → selection → enhance → paste flow.
pub struct QuickEnhance {
    enhancer: Arc<Enhancer>,
    clipboard: Arc<dyn Clipboard>,
    keys: Arc<dyn KeySynth>,
    registrar: Arc<dyn HotkeyRegistrar>,
    overlay: Arc<dyn Overlay>,
    /// The clipboard save→use→restore sequence must never interleave;
    /// overlapping invocations are dropped
    busy: AtomicBool,
}

impl QuickEnhance {
    pub fn new(
        enhancer: Arc<Enhancer>,
        clipboard: Arc<dyn Clipboard>,
        keys: Arc<dyn KeySynth>,
        registrar: Arc<dyn HotkeyRegistrar>,
        overlay: Arc<dyn Overlay>,
    ) -> Arc<Self> {
        Arc::new(Self {
            enhancer,
            clipboard,
            keys,
            registrar,
            overlay,
            busy: AtomicBool::new(false),
        })
    }

    /// Register the global hotkey and start forwarding captured selections.
    ///
    /// Each hotkey press (or overlay click) produces one message on the
    /// returned channel: the selected text, possibly empty. The host UI
    /// takes it from there. When neither hotkey combo can be registered the
    /// controller logs a warning and still starts, leaving the HTTP and UI
    /// paths working.
    pub fn start(self: &Arc<Self>, token: CancellationToken) -> UnboundedReceiver<String> {
        let (tx, rx) = unbounded_channel();

        match self.register_hotkey() {
            Ok(handle) => {
                if let Some(mut events) = self.registrar.events() {
                    let this = Arc::clone(self);
                    let tx = tx.clone();
                    let token = token.clone();
                    tokio::spawn(async move {
                        loop {
                            tokio::select! {
                                event = events.recv() => {
                                    let Some(event) = event else { break };
                                    let text = this.capture_selection().await.unwrap_or_default();
                                    if let Err(e) = this.overlay.show_at(event.cursor_x, event.cursor_y) {
                                        tracing::debug!("overlay show failed: {}", e);
                                    }
                                    let _ = tx.send(text);
                                }
                                _ = token.cancelled() => break,
                            }
                        }
                        let _ = this.registrar.unregister(handle);
                    });
                }
            }
            Err(e) => {
                tracing::warn!("quick enhance hotkey unavailable: {}", e);
            }
        }

        if let Some(mut clicks) = self.overlay.clicks() {
            let tx = tx.clone();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        click = clicks.recv() => {
                            if click.is_none() {
                                break;
                            }
                            let _ = tx.send(String::new());
                        }
                        _ = token.cancelled() => break,
                    }
                }
            });
        }

        rx
    }

    fn register_hotkey(&self) -> Result<HotkeyHandle> {
        let primary = HotkeyCombo::new(vec![HotkeyModifier::Ctrl, HotkeyModifier::Alt], 'E');
        if let Ok(handle) = self.registrar.register(&primary) {
            tracing::info!("quick enhance hotkey registered: {}", primary);
            return Ok(handle);
        }

        let fallback = HotkeyCombo::new(vec![HotkeyModifier::Super, HotkeyModifier::Shift], 'E');
        match self.registrar.register(&fallback) {
            Ok(handle) => {
                tracing::info!("quick enhance hotkey registered: {}", fallback);
                Ok(handle)
            }
            Err(e) => Err(Error::Hotkey(format!(
                "neither {} nor {} could be registered: {}",
                primary, fallback, e
            ))),
        }
    }

    /// Grab the current OS selection by round-tripping it through the
    /// clipboard. Returns `None` when another invocation is already in
    /// flight. The user's clipboard is restored shortly afterwards.
    pub async fn capture_selection(&self) -> Option<String> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("quick enhance already in progress, dropping");
            return None;
        }

        let saved = self.clipboard.read_text().unwrap_or_default();
        tokio::time::sleep(PRE_CHORD_SETTLE).await;

        if let Err(e) = self.clipboard.write_text("") {
            tracing::debug!("clipboard clear failed: {}", e);
        }
        tokio::time::sleep(CLIPBOARD_CLEAR_SETTLE).await;

        if let Err(e) = self.keys.send_copy() {
            tracing::debug!("copy chord failed: {}", e);
        }
        tokio::time::sleep(COPY_SETTLE).await;

        let text = self.clipboard.read_text().unwrap_or_default();

        self.schedule_restore(saved, RESTORE_AFTER_COPY);
        self.busy.store(false, Ordering::Release);

        Some(text)
    }

    /// Enhance a captured prompt. Hotkey-initiated enhancements run under a
    /// 10 s deadline.
    pub async fn enhance_prompt(&self, prompt: &str) -> Result<EnhancementResult> {
        match tokio::time::timeout(
            ENHANCE_DEADLINE,
            self.enhancer.enhance(prompt, "", QUICK_MAX_MEMORIES),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::memory("quick enhancement timed out")),
        }
    }

    /// Put the enhanced text on the clipboard, paste it into the foreground
    /// app, then restore the user's clipboard.
    pub async fn paste_enhanced(&self, text: &str) -> Result<()> {
        let saved = self.clipboard.read_text().unwrap_or_default();

        self.clipboard.write_text(text)?;
        tokio::time::sleep(PRE_CHORD_SETTLE).await;
        self.keys.send_paste()?;

        self.schedule_restore(saved, RESTORE_AFTER_PASTE);
        Ok(())
    }

    pub fn hide_overlay(&self) {
        if let Err(e) = self.overlay.hide() {
            tracing::debug!("overlay hide failed: {}", e);
        }
    }

    fn schedule_restore(&self, saved: String, delay: Duration) {
        let clipboard = Arc::clone(&self.clipboard);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(e) = clipboard.write_text(&saved) {
                tracing::debug!("clipboard restore failed: {}", e);
            }
        });
    }
}
