//! Prompt enhancement for glimpse
//!
//! Expands a user prompt with context retrieved from the memory store. The
//! amount of injected context scales with retrieval confidence: several
//! high-score matches produce a full context block, weak matches a single
//! hedged note, and an empty store leaves the prompt untouched.

mod enhancer;
mod strategy;

pub use enhancer::{Enhancer, EnhancerStats, MemoryInfo};
pub use strategy::{EnhancementResult, EnhancementType};
