//! Core types for glimpse
//!
//! This crate provides the shared foundations of the ambient-memory agent:
//! the error taxonomy, the persisted configuration, and the OS capability
//! traits that keep platform specifics out of the pipeline.

pub mod capabilities;
pub mod config;
pub mod error;

// Re-exports
pub use capabilities::{
    Clipboard, DisplayBounds, HotkeyCombo, HotkeyEvent, HotkeyHandle, HotkeyModifier,
    HotkeyRegistrar, KeySynth, Overlay, RawFrame, ScreenGrabber,
};
pub use config::{
    AppConfig, CaptureConfig, Config, Dialect, ExtensionConfig, LlmConfig, MemoryConfig,
};
pub use error::{Error, Result};
