//! Headless host capabilities.
//!
//! Concrete OS integrations (window-server grab, clipboard, key synthesis,
//! global hotkeys, the overlay window) belong to the desktop shell that
//! embeds this service. When the service runs standalone there is no shell,
//! so this module provides a headless set: capture reports no displays and
//! is skipped by the loop, hotkey registration fails with a startup warning,
//! and the HTTP and chat paths work normally. A desktop shell substitutes
//! its own implementations through [`crate::app::HostCapabilities`].

use glimpse_core::{
    Clipboard, DisplayBounds, Error, HotkeyCombo, HotkeyEvent, HotkeyHandle, HotkeyRegistrar,
    KeySynth, Overlay, RawFrame, Result, ScreenGrabber,
};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::HostCapabilities;

struct HeadlessGrabber;

impl ScreenGrabber for HeadlessGrabber {
    fn count_displays(&self) -> usize {
        0
    }

    fn bounds(&self, _display: usize) -> Result<DisplayBounds> {
        Err(Error::NoDisplay)
    }

    fn grab(&self, _bounds: &DisplayBounds) -> Result<RawFrame> {
        Err(Error::NoDisplay)
    }
}

struct HeadlessClipboard;

impl Clipboard for HeadlessClipboard {
    fn read_text(&self) -> Result<String> {
        Err(Error::Clipboard("no host shell attached".to_string()))
    }

    fn write_text(&self, _text: &str) -> Result<()> {
        Err(Error::Clipboard("no host shell attached".to_string()))
    }
}

struct HeadlessKeySynth;

impl KeySynth for HeadlessKeySynth {
    fn send_copy(&self) -> Result<()> {
        Err(Error::Clipboard("no host shell attached".to_string()))
    }

    fn send_paste(&self) -> Result<()> {
        Err(Error::Clipboard("no host shell attached".to_string()))
    }
}

struct HeadlessRegistrar;

impl HotkeyRegistrar for HeadlessRegistrar {
    fn register(&self, combo: &HotkeyCombo) -> Result<HotkeyHandle> {
        Err(Error::Hotkey(format!("no host shell to register {}", combo)))
    }

    fn unregister(&self, _handle: HotkeyHandle) -> Result<()> {
        Ok(())
    }

    fn events(&self) -> Option<UnboundedReceiver<HotkeyEvent>> {
        None
    }
}

struct HeadlessOverlay;

impl Overlay for HeadlessOverlay {
    fn show_at(&self, _x: i32, _y: i32) -> Result<()> {
        Ok(())
    }

    fn hide(&self) -> Result<()> {
        Ok(())
    }

    fn clicks(&self) -> Option<UnboundedReceiver<()>> {
        None
    }
}

pub fn headless_capabilities() -> HostCapabilities {
    HostCapabilities {
        grabber: Arc::new(HeadlessGrabber),
        clipboard: Arc::new(HeadlessClipboard),
        keys: Arc::new(HeadlessKeySynth),
        registrar: Arc::new(HeadlessRegistrar),
        overlay: Arc::new(HeadlessOverlay),
    }
}
