//! Stream worker
//!
//! Owns one stream for the lifetime of its process. The worker waits on
//! two event sources, engine notifications and the restart timer, and
//! turns every failure into a stop, a fixed backoff and a fresh start.
//! Restarts never give up.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::StreamSpec;
use crate::engine::{EngineEvent, MediaEngine, Notification};
use crate::error::{Error, Result};
use crate::stats::WorkerStats;

use super::state::{Disposition, LifecycleState, StreamRuntimeState};

/// One turn of the worker loop
enum Step {
    Shutdown,
    Notified(Option<Notification>),
    RestartDue,
}

/// Supervises one stream's pipeline through a [`MediaEngine`]
pub struct StreamWorker<E: MediaEngine> {
    engine: E,
    state: StreamRuntimeState,
    backoff: Duration,
    stats: WorkerStats,
}

impl<E: MediaEngine> StreamWorker<E> {
    /// Create a worker; nothing is started until [`launch`](Self::launch)
    pub fn new(spec: StreamSpec, engine: E, backoff: Duration) -> Self {
        Self {
            engine,
            state: StreamRuntimeState::new(spec),
            backoff,
            stats: WorkerStats::new(),
        }
    }

    pub fn state(&self) -> &StreamRuntimeState {
        &self.state
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state.lifecycle_state()
    }

    pub fn stats(&self) -> &WorkerStats {
        &self.stats
    }

    /// Start the first pipeline
    pub fn launch(&mut self) {
        if self.state.lifecycle_state() != LifecycleState::Created {
            tracing::warn!(
                index = self.state.spec().index,
                state = ?self.state.lifecycle_state(),
                "Launch ignored, already launched"
            );
            return;
        }
        self.start_pipeline();
    }

    /// Apply one engine notification
    pub fn handle_notification(&mut self, notification: Notification) {
        let Notification { pipeline, event } = notification;
        let index = self.state.spec().index;

        match self.state.classify(pipeline, &event) {
            Disposition::Healthy => {
                self.state.confirm_started();
                self.stats.record_running();
                tracing::info!(
                    index = index,
                    pipeline = %pipeline,
                    source = %self.state.spec().source_uri,
                    "Stream running"
                );
            }
            Disposition::Warn => {
                self.stats.record_warning();
                tracing::warn!(index = index, pipeline = %pipeline, event = %event, "Stream warning");
            }
            Disposition::Fail => self.fail(&event),
            Disposition::Stale => {
                tracing::debug!(index = index, pipeline = %pipeline, event = %event, "Stale event ignored");
            }
            Disposition::Ignore => {
                tracing::debug!(
                    index = index,
                    pipeline = %pipeline,
                    event = %event,
                    state = ?self.state.lifecycle_state(),
                    "Event ignored"
                );
            }
        }
    }

    /// Restart after the backoff elapsed
    ///
    /// The stopped pipeline is destroyed before the new one is started.
    pub async fn restart(&mut self) {
        if !self.state.restart_due(Instant::now()) {
            return;
        }

        if let Some(old) = self.state.take_pipeline() {
            self.engine.destroy(old).await;
        }

        tracing::info!(
            index = self.state.spec().index,
            attempt = self.state.restart_attempts(),
            "Restarting stream"
        );
        self.start_pipeline();
    }

    /// Tear the stream down for good
    ///
    /// Stops and destroys the current pipeline, if any, and waits for the
    /// engine to release it.
    pub async fn shutdown(&mut self) {
        if self.state.is_terminated() {
            return;
        }

        if let Some(pipeline) = self.state.take_pipeline() {
            self.state.begin_stop();
            tracing::info!(index = self.state.spec().index, pipeline = %pipeline, "Stopping stream");
            self.engine.stop(pipeline);
            self.engine.destroy(pipeline).await;
        }

        self.state.terminate();
        tracing::info!(index = self.state.spec().index, stats = %self.stats, "Stream terminated");
    }

    /// Run the stream until `shutdown` resolves
    ///
    /// Launches the stream if needed. Returns an error only if the engine
    /// stops delivering notifications.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        if self.state.lifecycle_state() == LifecycleState::Created {
            self.launch();
        }

        loop {
            let deadline = self.state.pending_restart_deadline();

            let step = tokio::select! {
                biased;
                _ = &mut shutdown => Step::Shutdown,
                notification = self.engine.next_notification() => Step::Notified(notification),
                _ = restart_timer(deadline) => Step::RestartDue,
            };

            match step {
                Step::Shutdown => {
                    tracing::info!(index = self.state.spec().index, "Shutdown requested");
                    self.shutdown().await;
                    return Ok(());
                }
                Step::Notified(Some(notification)) => self.handle_notification(notification),
                Step::Notified(None) => {
                    tracing::error!(index = self.state.spec().index, "Engine notifications closed");
                    return Err(Error::EngineClosed);
                }
                Step::RestartDue => self.restart().await,
            }
        }
    }

    fn start_pipeline(&mut self) {
        let pipeline = self.engine.start(self.state.spec());
        self.state.begin_start(pipeline);
        self.stats.record_start();

        let spec = self.state.spec();
        tracing::info!(
            index = spec.index,
            pipeline = %pipeline,
            source = %spec.source_uri,
            encoding = %spec.encoding,
            dest = %spec.destination(),
            "Starting stream"
        );
    }

    fn fail(&mut self, event: &EngineEvent) {
        let Some(pipeline) = self.state.pipeline() else {
            return;
        };
        let index = self.state.spec().index;

        tracing::error!(index = index, pipeline = %pipeline, event = %event, "Stream failed");

        self.state.begin_stop();
        tracing::info!(index = index, pipeline = %pipeline, "Stopping stream");
        self.engine.stop(pipeline);

        self.state.schedule_restart(Instant::now(), self.backoff);
        self.stats.record_failure(event.to_string());

        tracing::info!(
            index = index,
            attempt = self.state.restart_attempts(),
            delay_ms = self.backoff.as_millis() as u64,
            "Restart scheduled"
        );
    }
}

async fn restart_timer(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
