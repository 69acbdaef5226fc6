//! Execution contexts
//!
//! An execution context is the OS process hosting one stream worker. The
//! supervisor only knows its process id, which stream it serves and when it
//! was launched.

use std::fmt;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

/// One live worker process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    /// OS process id
    pub context_id: u32,

    /// Index of the stream it serves
    pub spec_index: u8,

    /// Launch time
    pub launched_at: Instant,
}

impl ExecutionContext {
    pub fn new(context_id: u32, spec_index: u8) -> Self {
        Self {
            context_id,
            spec_index,
            launched_at: Instant::now(),
        }
    }

    /// Time since launch
    pub fn uptime(&self) -> Duration {
        self.launched_at.elapsed()
    }

    /// Ask the context to shut down (SIGTERM)
    #[cfg(unix)]
    pub fn terminate(&self) {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        if let Err(e) = kill(Pid::from_raw(self.context_id as i32), Signal::SIGTERM) {
            tracing::debug!(pid = self.context_id, error = %e, "SIGTERM not delivered");
        }
    }

    #[cfg(not(unix))]
    pub fn terminate(&self) {}
}

/// How a context ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextExit {
    /// Exited with a status code
    Code(i32),
    /// Killed by a signal
    Signal(i32),
    /// Exit status could not be collected
    Unknown,
}

impl ContextExit {
    pub fn from_status(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ContextExit::Code(code);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return ContextExit::Signal(signal);
            }
        }
        ContextExit::Unknown
    }

    pub fn is_success(&self) -> bool {
        *self == ContextExit::Code(0)
    }
}

impl fmt::Display for ContextExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextExit::Code(code) => write!(f, "exit code {}", code),
            ContextExit::Signal(signal) => write!(f, "signal {}", signal),
            ContextExit::Unknown => write!(f, "unknown"),
        }
    }
}
