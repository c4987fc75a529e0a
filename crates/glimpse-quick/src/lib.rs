//! Quick enhance for glimpse
//!
//! Lets the user enhance selected text anywhere on the OS without leaving
//! the target app: a global hotkey grabs the selection through the
//! clipboard, the host UI confirms, and the enhanced text is pasted back.
//! All platform access goes through the capability traits in
//! `glimpse-core`; this crate only sequences them.

mod controller;

pub use controller::QuickEnhance;
