//! polystream: relay RTSP streams to UDP destinations
//!
//! Without a worker assignment in the environment the process is the
//! supervisor: it reads the config directory and launches one worker
//! process per stream. With an assignment it is that worker.

use std::process::ExitCode;

use polystream::config::load_global;
use polystream::supervisor::run_supervisor_process;
use polystream::worker::{assignment_from_env, run_worker_process};
use polystream::RelayConfig;

/// Exit status of a worker handed an unusable assignment
const BAD_ASSIGNMENT_EXIT_CODE: u8 = 2;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "polystream=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn main() -> ExitCode {
    init_tracing();
    let config = RelayConfig::from_env();

    match assignment_from_env() {
        Some(Ok(spec)) => match run_worker_process(spec, &config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "Worker failed");
                ExitCode::FAILURE
            }
        },
        Some(Err(e)) => {
            tracing::error!(error = %e, "Worker not started");
            ExitCode::from(BAD_ASSIGNMENT_EXIT_CODE)
        }
        None => {
            tracing::info!(version = env!("CARGO_PKG_VERSION"), "polystream starting");
            let global = load_global(&config.config_dir);
            tracing::info!(monitors = global.monitor_count, "Global config loaded");

            ExitCode::from(run_supervisor_process(&config))
        }
    }
}
