//! Pipeline orchestrator for glimpse
//!
//! Owns the capture ticker and drives capture → analyse → store without
//! blocking the tick. Analysis is best-effort: at most one job is in
//! flight, and a tick that arrives while the worker is busy is dropped so
//! memory freshness never trades off against queue growth.

mod pipeline;
mod worker;

pub use pipeline::{Pipeline, Status};
