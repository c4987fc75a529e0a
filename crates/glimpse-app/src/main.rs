//! glimpse, an ambient screen-memory agent.
//!
//! Captures the primary display on a timer, summarizes each capture with a
//! vision model, stores the summaries in a vector memory, and uses that
//! memory to enhance prompts on demand via a global hotkey or the browser
//! extension API.

mod app;
mod host;

use anyhow::Context;
use app::App;
use glimpse_core::Config;
use glimpse_telemetry::init_telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;
    init_telemetry(config.app.verbose);

    tracing::info!(
        interval = config.capture.interval_seconds,
        model = %config.llm.model,
        "starting glimpse"
    );

    let app = App::new(config, host::headless_capabilities());
    app.run().await
}
