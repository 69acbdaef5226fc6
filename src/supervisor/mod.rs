//! Process supervision
//!
//! The supervisor is a lifecycle container: it launches one worker process
//! per stream spec and reaps them as they exit. It never touches the
//! pipeline engine and never respawns a dead context.
//!
//! ```text
//!                    ProcessSupervisor
//!               live: HashMap<pid, ExecutionContext>
//!                           │
//!        ┌──────────────────┼──────────────────┐
//!        ▼                  ▼                  ▼
//!   [worker 0]         [worker 1]         [worker N]
//!   StreamWorker       StreamWorker       StreamWorker
//!        │                  │                  │
//!   gst-launch         gst-launch         gst-launch
//! ```

pub mod context;
pub mod launcher;
pub mod process;

use crate::config::{load_streams, RelayConfig};
use crate::worker::ShutdownSignal;

pub use context::{ContextExit, ExecutionContext};
pub use launcher::{ContextLauncher, SelfExecLauncher};
pub use process::{ProcessSupervisor, SUPERVISOR_EXIT_CODE};

/// Body of the supervisor process
///
/// Loads the stream file, launches a worker per stream and returns the
/// process exit status once every worker has exited.
pub fn run_supervisor_process(config: &RelayConfig) -> u8 {
    let parsed = load_streams(&config.config_dir);
    tracing::info!(
        dir = %config.config_dir.display(),
        accepted = parsed.specs.len(),
        rejected = parsed.rejected.len(),
        "Stream config loaded"
    );

    let launcher = match SelfExecLauncher::current() {
        Ok(launcher) => launcher,
        Err(e) => {
            tracing::error!(error = %e, "Cannot locate own executable");
            return SUPERVISOR_EXIT_CODE;
        }
    };
    tracing::debug!(program = %launcher.program().display(), "Worker executable");

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build runtime");
            return SUPERVISOR_EXIT_CODE;
        }
    };

    let mut supervisor = ProcessSupervisor::new(launcher);
    runtime.block_on(async {
        // Handlers go in before the first context is launched
        let shutdown = match ShutdownSignal::install() {
            Ok(shutdown) => shutdown,
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handlers");
                return SUPERVISOR_EXIT_CODE;
            }
        };
        supervisor.run_until(&parsed.specs, shutdown.recv()).await
    })
}
