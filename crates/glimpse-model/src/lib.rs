//! LLM clients for glimpse
//!
//! One OpenAI-compatible chat-completions client serves both roles the
//! pipeline needs: vision analysis of screen captures and text-only
//! generation over memory context. The two roles may address the same
//! endpoint or two distinct ones; only base URL, key and model name differ.

mod analysis;
mod client;
mod types;

pub use analysis::{parse_analysis, AnalysisResult};
pub use client::{Llm, LlmClient};
pub use types::*;
