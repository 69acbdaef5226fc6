//! Process supervisor
//!
//! Launches one execution context per stream spec, then does nothing but
//! wait for contexts to exit and reap them. A context that exits is not
//! respawned; stream recovery happens inside the context.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::io;
use std::process::ExitStatus;

use tokio::task::JoinSet;

use crate::config::StreamSpec;
use crate::stats::SupervisorStats;

use super::context::{ContextExit, ExecutionContext};
use super::launcher::ContextLauncher;

/// Exit status of the supervisor once every context is gone
pub const SUPERVISOR_EXIT_CODE: u8 = 1;

type ContextExitResult = (u32, io::Result<ExitStatus>);

/// Lifecycle container for execution contexts
pub struct ProcessSupervisor<L: ContextLauncher> {
    launcher: L,
    live: HashMap<u32, ExecutionContext>,
    stats: SupervisorStats,
}

impl<L: ContextLauncher> ProcessSupervisor<L> {
    pub fn new(launcher: L) -> Self {
        Self {
            launcher,
            live: HashMap::new(),
            stats: SupervisorStats::new(),
        }
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    pub fn stats(&self) -> &SupervisorStats {
        &self.stats
    }

    /// Contexts launched and not yet reaped
    pub fn live_contexts(&self) -> impl Iterator<Item = &ExecutionContext> {
        self.live.values()
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Run contexts for `specs` until all of them have exited
    pub async fn run(&mut self, specs: &[StreamSpec]) -> u8 {
        self.run_until(specs, std::future::pending()).await
    }

    /// Run contexts for `specs` until all of them have exited
    ///
    /// When `shutdown` resolves every live context is asked to terminate;
    /// the supervisor still waits for each of them to exit.
    pub async fn run_until<F>(&mut self, specs: &[StreamSpec], shutdown: F) -> u8
    where
        F: Future<Output = ()>,
    {
        let mut exits = JoinSet::new();
        self.launch_all(specs, &mut exits);

        tokio::pin!(shutdown);
        let mut shutting_down = false;

        loop {
            tokio::select! {
                _ = &mut shutdown, if !shutting_down => {
                    shutting_down = true;
                    tracing::info!(live = self.stats.live(), "Shutdown requested, terminating contexts");
                    for ctx in self.live_contexts() {
                        tracing::debug!(index = ctx.spec_index, pid = ctx.context_id, "Sending SIGTERM");
                        ctx.terminate();
                    }
                }
                joined = exits.join_next() => match joined {
                    Some(Ok((pid, status))) => self.reap(pid, status),
                    Some(Err(e)) => tracing::error!(error = %e, "Context waiter failed"),
                    None => break,
                },
            }
        }

        if !self.live.is_empty() {
            // Only possible if a waiter task failed
            tracing::warn!(lost = self.live.len(), "Contexts lost track of");
            self.live.clear();
        }

        tracing::info!(stats = %self.stats, "All contexts exited");
        SUPERVISOR_EXIT_CODE
    }

    fn launch_all(&mut self, specs: &[StreamSpec], exits: &mut JoinSet<ContextExitResult>) {
        let mut served = HashSet::with_capacity(specs.len());

        for spec in specs {
            if !served.insert(spec.index) {
                tracing::error!(index = spec.index, "Duplicate stream index, not launched");
                continue;
            }

            let mut child = match self.launcher.launch(spec) {
                Ok(child) => child,
                Err(e) => {
                    self.stats.launch_failures += 1;
                    tracing::error!(index = spec.index, error = %e, "Failed to launch context");
                    continue;
                }
            };

            let Some(pid) = child.id() else {
                tracing::warn!(index = spec.index, "Context exited before it was tracked");
                continue;
            };

            self.live.insert(pid, ExecutionContext::new(pid, spec.index));
            self.stats.launched += 1;
            tracing::info!(
                index = spec.index,
                pid = pid,
                source = %spec.source_uri,
                dest = %spec.destination(),
                "Context launched"
            );

            exits.spawn(async move {
                let status = child.wait().await;
                (pid, status)
            });
        }
    }

    fn reap(&mut self, pid: u32, status: io::Result<ExitStatus>) {
        let exit = match status {
            Ok(status) => ContextExit::from_status(status),
            Err(e) => {
                tracing::warn!(pid = pid, error = %e, "Failed to collect exit status");
                ContextExit::Unknown
            }
        };

        let Some(ctx) = self.live.remove(&pid) else {
            tracing::warn!(pid = pid, "Reaped unknown context");
            return;
        };

        self.stats.reaped += 1;
        if exit.is_success() {
            tracing::info!(
                index = ctx.spec_index,
                pid = pid,
                uptime_secs = ctx.uptime().as_secs(),
                "Context exited"
            );
        } else {
            self.stats.abnormal_exits += 1;
            tracing::error!(
                index = ctx.spec_index,
                pid = pid,
                exit = %exit,
                uptime_secs = ctx.uptime().as_secs(),
                "Context died, stream will not be restarted"
            );
        }
    }
}
