//! Engine backed by `gst-launch-1.0` child processes
//!
//! Each pipeline is one launcher process. Its stdout and stderr are read
//! line by line and translated into notifications; the process exiting on
//! its own is reported as an error.

use std::collections::HashMap;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;

use crate::config::{RelayConfig, StreamSpec};

use super::adapter::{classify_line, describe_pipeline, PipelineSettings};
use super::{EngineEvent, MediaEngine, Notification, PipelineId};

/// Pipeline engine running one launcher process per pipeline
pub struct GstLaunchEngine {
    settings: PipelineSettings,
    next_id: u64,
    children: HashMap<PipelineId, Child>,
    events_tx: mpsc::UnboundedSender<Notification>,
    events_rx: mpsc::UnboundedReceiver<Notification>,
}

impl GstLaunchEngine {
    /// Create an engine with the given settings
    pub fn new(settings: PipelineSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Self {
            settings,
            next_id: 1,
            children: HashMap::new(),
            events_tx,
            events_rx,
        }
    }

    /// Create an engine from relay settings
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new(PipelineSettings::from(config))
    }

    /// Number of pipelines not yet destroyed
    pub fn pipeline_count(&self) -> usize {
        self.children.len()
    }

    fn raise(&self, pipeline: PipelineId, event: EngineEvent) {
        // The receiver lives in self, so this cannot fail while we exist
        let _ = self.events_tx.send(Notification::new(pipeline, event));
    }

    fn spawn(&self, args: &[String]) -> std::io::Result<Child> {
        Command::new(&self.settings.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
    }
}

impl MediaEngine for GstLaunchEngine {
    fn start(&mut self, spec: &StreamSpec) -> PipelineId {
        let pipeline = PipelineId(self.next_id);
        self.next_id += 1;

        let args = match describe_pipeline(spec, &self.settings) {
            Ok(args) => args,
            Err(msg) => {
                self.raise(pipeline, EngineEvent::Error(msg));
                return pipeline;
            }
        };

        tracing::debug!(pipeline = %pipeline, args = %args.join(" "), "Launching pipeline");

        match self.spawn(&args) {
            Ok(mut child) => {
                if let Some(stdout) = child.stdout.take() {
                    tokio::spawn(forward_lines(pipeline, stdout, self.events_tx.clone(), true));
                }
                if let Some(stderr) = child.stderr.take() {
                    tokio::spawn(forward_lines(pipeline, stderr, self.events_tx.clone(), false));
                }
                self.children.insert(pipeline, child);
            }
            Err(e) => {
                self.raise(
                    pipeline,
                    EngineEvent::Error(format!(
                        "Failed to run {}: {}",
                        self.settings.program.display(),
                        e
                    )),
                );
            }
        }

        pipeline
    }

    fn stop(&mut self, pipeline: PipelineId) {
        if let Some(child) = self.children.get_mut(&pipeline) {
            if let Err(e) = child.start_kill() {
                // Already exited
                tracing::debug!(pipeline = %pipeline, error = %e, "Stop on exited pipeline");
            }
        }
    }

    async fn destroy(&mut self, pipeline: PipelineId) {
        let Some(mut child) = self.children.remove(&pipeline) else {
            return;
        };

        let _ = child.start_kill();
        match child.wait().await {
            Ok(status) => tracing::debug!(pipeline = %pipeline, status = %status, "Pipeline reaped"),
            Err(e) => tracing::warn!(pipeline = %pipeline, error = %e, "Failed to reap pipeline"),
        }
    }

    async fn next_notification(&mut self) -> Option<Notification> {
        self.events_rx.recv().await
    }
}

async fn forward_lines<R>(
    pipeline: PipelineId,
    reader: R,
    tx: mpsc::UnboundedSender<Notification>,
    report_exit: bool,
) where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                tracing::trace!(pipeline = %pipeline, line = %line, "Launcher output");
                if let Some(event) = classify_line(&line) {
                    if tx.send(Notification::new(pipeline, event)).is_err() {
                        return;
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(pipeline = %pipeline, error = %e, "Launcher output unreadable");
                break;
            }
        }
    }

    if report_exit {
        let _ = tx.send(Notification::new(
            pipeline,
            EngineEvent::Error("Pipeline process exited".into()),
        ));
    }
}
