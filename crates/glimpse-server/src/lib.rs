//! Extension HTTP API for glimpse
//!
//! A loopback-only axum server used by the browser extension embedded in
//! third-party chat sites. Exposes health, prompt enhancement, memory
//! search and status. Cross-origin access is limited to browser-extension
//! origins plus an explicit allow-list.

mod rest;
mod types;

pub use rest::{create_router, serve};
pub use types::*;
