//! Stream workers
//!
//! A worker owns exactly one stream inside its own process. It starts the
//! stream's pipeline, reacts to engine events, and restarts the pipeline
//! after a fixed backoff whenever it fails. Only a shutdown signal ends it.

pub mod assignment;
pub mod runner;
pub mod signal;
pub mod state;

use tracing::Instrument;

use crate::config::{RelayConfig, StreamSpec};
use crate::engine::GstLaunchEngine;
use crate::error::Result;

pub use assignment::{assignment_env, assignment_from_env, INDEX_ENV, RECORD_ENV};
pub use runner::StreamWorker;
pub use signal::ShutdownSignal;
pub use state::{Disposition, LifecycleState, StreamRuntimeState};

/// Body of a worker process
///
/// Runs `spec` on a single-threaded runtime until SIGINT or SIGTERM.
pub fn run_worker_process(spec: StreamSpec, config: &RelayConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let span = tracing::info_span!("stream", index = spec.index);

    runtime.block_on(
        async move {
            // Handlers go in before the first pipeline exists
            let shutdown = ShutdownSignal::install()?;
            let engine = GstLaunchEngine::from_config(config);
            let mut worker = StreamWorker::new(spec, engine, config.restart_backoff);
            worker.run_until(shutdown.recv()).await
        }
        .instrument(span),
    )
}
