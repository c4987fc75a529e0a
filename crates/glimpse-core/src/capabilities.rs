//! OS capability traits
//!
//! The pipeline never touches the window server, clipboard, or keyboard
//! directly. Each platform primitive is a trait with exactly one method set;
//! concrete implementations live in the host shell and are injected at
//! startup. Tests substitute in-process mocks.

use crate::error::Result;
use tokio::sync::mpsc::UnboundedReceiver;

/// Pixel bounds of one display in the virtual screen space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// A raw RGBA8 frame as returned by the OS grab.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA rows, `width * height * 4` bytes
    pub pixels: Vec<u8>,
}

/// Screen grab primitive. Grabbing may block on the OS window server for
/// tens of milliseconds; callers keep it off latency-sensitive tasks.
pub trait ScreenGrabber: Send + Sync {
    fn count_displays(&self) -> usize;

    fn bounds(&self, display: usize) -> Result<DisplayBounds>;

    fn grab(&self, bounds: &DisplayBounds) -> Result<RawFrame>;
}

/// Text clipboard access.
pub trait Clipboard: Send + Sync {
    fn read_text(&self) -> Result<String>;

    fn write_text(&self, text: &str) -> Result<()>;
}

/// Synthetic key-chord injection into the foreground application.
pub trait KeySynth: Send + Sync {
    fn send_copy(&self) -> Result<()>;

    fn send_paste(&self) -> Result<()>;
}

/// Modifier keys for a global hotkey combo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyModifier {
    Ctrl,
    Alt,
    Shift,
    Super,
}

/// A global hotkey combination, e.g. Ctrl+Alt+E.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotkeyCombo {
    pub modifiers: Vec<HotkeyModifier>,
    pub key: char,
}

impl HotkeyCombo {
    pub fn new(modifiers: Vec<HotkeyModifier>, key: char) -> Self {
        Self { modifiers, key }
    }
}

impl std::fmt::Display for HotkeyCombo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for m in &self.modifiers {
            let name = match m {
                HotkeyModifier::Ctrl => "Ctrl",
                HotkeyModifier::Alt => "Alt",
                HotkeyModifier::Shift => "Shift",
                HotkeyModifier::Super => "Super",
            };
            write!(f, "{}+", name)?;
        }
        write!(f, "{}", self.key)
    }
}

/// Opaque handle to a registered hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HotkeyHandle(pub u32);

/// One hotkey press, with the cursor position at press time. The platform
/// message loop runs on its own OS thread and forwards events over the
/// registrar's channel into the async runtime.
#[derive(Debug, Clone, Copy)]
pub struct HotkeyEvent {
    pub handle: HotkeyHandle,
    pub cursor_x: i32,
    pub cursor_y: i32,
}

/// Global hotkey registration plus the event stream it feeds.
pub trait HotkeyRegistrar: Send + Sync {
    fn register(&self, combo: &HotkeyCombo) -> Result<HotkeyHandle>;

    fn unregister(&self, handle: HotkeyHandle) -> Result<()>;

    /// Take the press-event stream. Yields `None` after the stream has
    /// already been taken once.
    fn events(&self) -> Option<UnboundedReceiver<HotkeyEvent>>;
}

/// Floating overlay cue shown near the cursor while a quick-enhance is
/// pending. Clicks are forwarded over a channel like hotkey presses.
pub trait Overlay: Send + Sync {
    fn show_at(&self, x: i32, y: i32) -> Result<()>;

    fn hide(&self) -> Result<()>;

    /// Take the click-event stream. Yields `None` after the stream has
    /// already been taken once.
    fn clicks(&self) -> Option<UnboundedReceiver<()>>;
}
