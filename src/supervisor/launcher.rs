//! Context launchers
//!
//! A launcher turns a stream spec into a running child process. The
//! production launcher re-executes the current binary in worker mode.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::{Child, Command};

use crate::config::StreamSpec;
use crate::worker::assignment_env;

/// Starts the process hosting one stream
pub trait ContextLauncher {
    /// Spawn a context serving `spec`
    fn launch(&mut self, spec: &StreamSpec) -> io::Result<Child>;
}

/// Launches workers by re-executing a program with a worker assignment
#[derive(Debug, Clone)]
pub struct SelfExecLauncher {
    program: PathBuf,
}

impl SelfExecLauncher {
    /// Launcher for the running executable
    pub fn current() -> io::Result<Self> {
        Ok(Self::new(std::env::current_exe()?))
    }

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &PathBuf {
        &self.program
    }
}

impl ContextLauncher for SelfExecLauncher {
    fn launch(&mut self, spec: &StreamSpec) -> io::Result<Child> {
        Command::new(&self.program)
            .envs(assignment_env(spec))
            .stdin(Stdio::null())
            .spawn()
    }
}
