//! Media pipeline engine interface
//!
//! The relay never builds media graphs itself. It drives an engine through
//! four operations (`start`, `stop`, `destroy` and a notification stream)
//! and reacts to the lifecycle events the engine reports.
//!
//! # Handles
//!
//! Every `start` returns a fresh [`PipelineId`]. Notifications carry the id
//! of the pipeline that raised them, so a worker can tell events of its live
//! pipeline apart from late events of one it already tore down.
//!
//! # Implementations
//!
//! - [`GstLaunchEngine`]: one `gst-launch-1.0` child process per pipeline
//! - `ScriptedEngine`: in-memory engine whose events are injected by hand,
//!   available in tests and with the `test-util` feature

pub mod adapter;
pub mod gst_launch;
#[cfg(any(test, feature = "test-util"))]
pub mod scripted;

use std::fmt;

use crate::config::StreamSpec;

pub use adapter::PipelineSettings;
pub use gst_launch::GstLaunchEngine;
#[cfg(any(test, feature = "test-util"))]
pub use scripted::{EngineCall, ScriptHandle, ScriptedEngine};

/// Opaque handle of one pipeline instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineId(pub u64);

impl fmt::Display for PipelineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Lifecycle event raised by the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Pipeline finished starting and is flowing
    Started,
    /// Non-fatal problem
    Warning(String),
    /// Pipeline failed
    Error(String),
    /// Source ended the stream
    EndOfStream,
    /// Source went silent
    SourceTimeout,
}

impl EngineEvent {
    /// Whether this event means the pipeline is no longer usable
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            EngineEvent::Error(_) | EngineEvent::EndOfStream | EngineEvent::SourceTimeout
        )
    }
}

impl fmt::Display for EngineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineEvent::Started => write!(f, "started"),
            EngineEvent::Warning(msg) => write!(f, "warning: {}", msg),
            EngineEvent::Error(msg) => write!(f, "error: {}", msg),
            EngineEvent::EndOfStream => write!(f, "end of stream"),
            EngineEvent::SourceTimeout => write!(f, "source timeout"),
        }
    }
}

/// An event tagged with the pipeline that raised it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub pipeline: PipelineId,
    pub event: EngineEvent,
}

impl Notification {
    pub fn new(pipeline: PipelineId, event: EngineEvent) -> Self {
        Self { pipeline, event }
    }
}

/// Driver for media pipelines
///
/// `start` must not fail synchronously: a pipeline that cannot be built
/// reports an [`EngineEvent::Error`] through the notification stream.
/// `stop` is idempotent. `destroy` returns once every resource of the
/// pipeline is released.
#[allow(async_fn_in_trait)]
pub trait MediaEngine {
    /// Build and start a pipeline for `spec`
    fn start(&mut self, spec: &StreamSpec) -> PipelineId;

    /// Stop a pipeline
    fn stop(&mut self, pipeline: PipelineId);

    /// Release a pipeline
    async fn destroy(&mut self, pipeline: PipelineId);

    /// Next notification, or `None` once the engine can raise no more
    async fn next_notification(&mut self) -> Option<Notification>;
}
