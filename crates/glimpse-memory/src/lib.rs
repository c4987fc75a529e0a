//! Memory store client for glimpse
//!
//! Talks to the external vector memory service over HTTP. The backend
//! speaks one of two wire dialects (`message` or `content`); both hide
//! behind [`MemoryClient`], with the dialect fixed once at construction.
//! The [`MemoryStore`] trait is the seam the pipeline and enhancer depend
//! on, so tests can substitute in-process stores.

mod client;
mod service;
mod types;

pub use client::MemoryClient;
pub use service::MemoryStore;
pub use types::{Memory, Metadata, SearchResult};
