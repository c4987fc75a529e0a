//! Logging setup for glimpse
//!
//! Structured logging through `tracing`. The verbose config flag raises the
//! glimpse crates to debug so individual capture failures become visible;
//! `RUST_LOG` overrides everything when set.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const VERBOSE_FILTER: &str = "info,glimpse_capture=debug,glimpse_model=debug,\
                              glimpse_memory=debug,glimpse_enhancer=debug,\
                              glimpse_pipeline=debug,glimpse_server=debug,\
                              glimpse_quick=debug";

/// Initialize the global tracing subscriber. Call once at startup.
pub fn init_telemetry(verbose: bool) {
    let default_filter = if verbose { VERBOSE_FILTER } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_filter_parses() {
        // A typo in the directive list would silently disable logging
        assert!(EnvFilter::builder().parse(VERBOSE_FILTER).is_ok());
    }
}
