//! Shutdown signal handling
//!
//! Handlers are registered when a [`ShutdownSignal`] is installed, not when
//! it is first awaited. A signal that arrives between installation and the
//! first poll is kept and reported by [`ShutdownSignal::recv`].

use std::io;

/// Registered SIGINT and SIGTERM handlers
pub struct ShutdownSignal {
    #[cfg(unix)]
    interrupt: tokio::signal::unix::Signal,
    #[cfg(unix)]
    terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignal {
    /// Register the handlers; must be called inside a runtime
    #[cfg(unix)]
    pub fn install() -> io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    #[cfg(not(unix))]
    pub fn install() -> io::Result<Self> {
        Ok(Self {})
    }

    /// Resolves on the first SIGINT or SIGTERM
    #[cfg(unix)]
    pub async fn recv(mut self) {
        tokio::select! {
            _ = self.interrupt.recv() => tracing::info!(signal = "SIGINT", "Signal received"),
            _ = self.terminate.recv() => tracing::info!(signal = "SIGTERM", "Signal received"),
        }
    }

    #[cfg(not(unix))]
    pub async fn recv(self) {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
}
