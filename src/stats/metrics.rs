//! Statistics for stream workers and the supervisor

use std::fmt;
use std::time::{Duration, Instant};

/// Per-stream counters kept by a worker
#[derive(Debug, Clone)]
pub struct WorkerStats {
    /// When the worker was created
    pub created_at: Instant,
    /// Pipelines started (initial start plus restarts)
    pub starts: u64,
    /// Restarts scheduled after a failure
    pub restarts: u64,
    /// Warnings reported by the engine
    pub warnings: u64,
    /// Failures (end of stream, error, source timeout)
    pub failures: u64,
    /// Description of the most recent failure
    pub last_failure: Option<String>,
    /// When the current pipeline was confirmed running
    pub running_since: Option<Instant>,
}

impl Default for WorkerStats {
    fn default() -> Self {
        Self {
            created_at: Instant::now(),
            starts: 0,
            restarts: 0,
            warnings: 0,
            failures: 0,
            last_failure: None,
            running_since: None,
        }
    }
}

impl WorkerStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline was started
    pub fn record_start(&mut self) {
        self.starts += 1;
        self.running_since = None;
    }

    /// The engine confirmed the pipeline is running
    pub fn record_running(&mut self) {
        self.running_since = Some(Instant::now());
    }

    /// A failure ended the current pipeline and a restart was scheduled
    pub fn record_failure(&mut self, reason: impl Into<String>) {
        self.failures += 1;
        self.restarts += 1;
        self.last_failure = Some(reason.into());
        self.running_since = None;
    }

    pub fn record_warning(&mut self) {
        self.warnings += 1;
    }

    /// Time the current pipeline has been running, if it is
    pub fn healthy_for(&self) -> Option<Duration> {
        self.running_since.map(|t| t.elapsed())
    }

    /// Time since the worker was created
    pub fn uptime(&self) -> Duration {
        self.created_at.elapsed()
    }
}

impl fmt::Display for WorkerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "starts={} restarts={} failures={} warnings={} uptime={}s",
            self.starts,
            self.restarts,
            self.failures,
            self.warnings,
            self.uptime().as_secs()
        )?;
        match self.healthy_for() {
            Some(healthy) => write!(f, " healthy_for={}s", healthy.as_secs())?,
            None => write!(f, " healthy_for=-")?,
        }
        match &self.last_failure {
            Some(reason) => write!(f, " last_failure=\"{}\"", reason),
            None => write!(f, " last_failure=-"),
        }
    }
}

/// Counters kept by the process supervisor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SupervisorStats {
    /// Contexts successfully launched
    pub launched: u64,
    /// Specs whose context could not be launched
    pub launch_failures: u64,
    /// Contexts reaped after exiting
    pub reaped: u64,
    /// Reaped contexts that did not exit successfully
    pub abnormal_exits: u64,
}

impl SupervisorStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contexts launched but not yet reaped
    pub fn live(&self) -> u64 {
        self.launched.saturating_sub(self.reaped)
    }
}

impl fmt::Display for SupervisorStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "launched={} launch_failures={} reaped={} abnormal_exits={}",
            self.launched, self.launch_failures, self.reaped, self.abnormal_exits
        )
    }
}
