//! Screen capture for glimpse
//!
//! Turns one OS grab of the primary display into a timestamped, resized,
//! JPEG-compressed [`Capture`] ready for vision analysis. The grab itself
//! goes through the [`ScreenGrabber`] capability trait so this crate stays
//! platform-free.

mod capturer;

pub use capturer::{Capture, Capturer};

/// Name of the platform the process is running on.
pub fn platform() -> &'static str {
    std::env::consts::OS
}
