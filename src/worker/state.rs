//! Stream lifecycle state machine
//!
//! Tracks one stream from its first start through any number of
//! failure/restart cycles until an explicit shutdown.
//!
//! ```text
//! Created ─► Starting ─► Running ─► Stopping ─► AwaitingRestart ─┐
//!               ▲                                                │
//!               └──────────────── restart due ───────────────────┘
//!
//! any ── shutdown ──► Terminated
//! ```

use std::time::Duration;

use tokio::time::Instant;

use crate::config::StreamSpec;
use crate::engine::{EngineEvent, PipelineId};

/// Stream lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Not launched yet
    Created,
    /// Pipeline started, waiting for the engine to confirm
    Starting,
    /// Pipeline confirmed running
    Running,
    /// Pipeline is being stopped
    Stopping,
    /// Pipeline stopped, restart timer armed
    AwaitingRestart,
    /// Shut down; no further events are processed
    Terminated,
}

/// What a notification means for the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Raised by a pipeline other than the current one
    Stale,
    /// No effect in the current state
    Ignore,
    /// Startup confirmed
    Healthy,
    /// Log only
    Warn,
    /// Tear down and schedule a restart
    Fail,
}

/// Runtime state of one stream
#[derive(Debug)]
pub struct StreamRuntimeState {
    spec: StreamSpec,
    pipeline: Option<PipelineId>,
    state: LifecycleState,
    restart_attempts: u64,
    pending_restart_deadline: Option<Instant>,
}

impl StreamRuntimeState {
    pub fn new(spec: StreamSpec) -> Self {
        Self {
            spec,
            pipeline: None,
            state: LifecycleState::Created,
            restart_attempts: 0,
            pending_restart_deadline: None,
        }
    }

    pub fn spec(&self) -> &StreamSpec {
        &self.spec
    }

    pub fn pipeline(&self) -> Option<PipelineId> {
        self.pipeline
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.state
    }

    /// Restarts scheduled so far; never reset
    pub fn restart_attempts(&self) -> u64 {
        self.restart_attempts
    }

    pub fn pending_restart_deadline(&self) -> Option<Instant> {
        self.pending_restart_deadline
    }

    pub fn is_terminated(&self) -> bool {
        self.state == LifecycleState::Terminated
    }

    /// Classify a notification against the current state
    pub fn classify(&self, pipeline: PipelineId, event: &EngineEvent) -> Disposition {
        if self.is_terminated() {
            return Disposition::Ignore;
        }
        if self.pipeline != Some(pipeline) {
            return Disposition::Stale;
        }

        match (self.state, event) {
            (_, EngineEvent::Warning(_)) => Disposition::Warn,
            (LifecycleState::Starting, EngineEvent::Started) => Disposition::Healthy,
            (LifecycleState::Starting | LifecycleState::Running, e) if e.is_failure() => {
                Disposition::Fail
            }
            _ => Disposition::Ignore,
        }
    }

    /// A new pipeline was started
    ///
    /// The previous pipeline must already have been taken.
    pub fn begin_start(&mut self, pipeline: PipelineId) {
        debug_assert!(self.pipeline.is_none(), "previous pipeline not released");
        self.pipeline = Some(pipeline);
        self.pending_restart_deadline = None;
        self.state = LifecycleState::Starting;
    }

    /// Engine confirmed startup
    pub fn confirm_started(&mut self) -> bool {
        if self.state == LifecycleState::Starting {
            self.state = LifecycleState::Running;
            true
        } else {
            false
        }
    }

    pub fn begin_stop(&mut self) {
        self.state = LifecycleState::Stopping;
    }

    /// Arm the restart timer; returns the deadline
    pub fn schedule_restart(&mut self, now: Instant, backoff: Duration) -> Instant {
        let deadline = now + backoff;
        self.restart_attempts += 1;
        self.pending_restart_deadline = Some(deadline);
        self.state = LifecycleState::AwaitingRestart;
        deadline
    }

    /// Whether the restart timer has elapsed
    pub fn restart_due(&self, now: Instant) -> bool {
        self.state == LifecycleState::AwaitingRestart
            && self.pending_restart_deadline.map_or(false, |d| d <= now)
    }

    /// Release the pipeline handle
    pub fn take_pipeline(&mut self) -> Option<PipelineId> {
        self.pipeline.take()
    }

    pub fn terminate(&mut self) {
        self.pipeline = None;
        self.pending_restart_deadline = None;
        self.state = LifecycleState::Terminated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> StreamRuntimeState {
        StreamRuntimeState::new(StreamSpec::from_record(0, "rtsp://cam\tH264\th\t1").unwrap())
    }

    #[test]
    fn test_lifecycle() {
        let mut st = state();
        assert_eq!(st.lifecycle_state(), LifecycleState::Created);

        st.begin_start(PipelineId(1));
        assert_eq!(st.lifecycle_state(), LifecycleState::Starting);
        assert_eq!(st.pipeline(), Some(PipelineId(1)));

        assert!(st.confirm_started());
        assert_eq!(st.lifecycle_state(), LifecycleState::Running);
        assert!(!st.confirm_started());

        st.begin_stop();
        assert_eq!(st.lifecycle_state(), LifecycleState::Stopping);

        let now = Instant::now();
        let deadline = st.schedule_restart(now, Duration::from_secs(5));
        assert_eq!(deadline, now + Duration::from_secs(5));
        assert_eq!(st.lifecycle_state(), LifecycleState::AwaitingRestart);
        assert_eq!(st.restart_attempts(), 1);

        assert!(!st.restart_due(now));
        assert!(st.restart_due(deadline));

        assert_eq!(st.take_pipeline(), Some(PipelineId(1)));
        st.begin_start(PipelineId(2));
        assert_eq!(st.lifecycle_state(), LifecycleState::Starting);
        assert!(st.pending_restart_deadline().is_none());
        // Counter survives the restart
        assert_eq!(st.restart_attempts(), 1);
    }

    #[test]
    fn test_classify_running() {
        let mut st = state();
        st.begin_start(PipelineId(1));
        st.confirm_started();
        let p = PipelineId(1);

        assert_eq!(st.classify(p, &EngineEvent::EndOfStream), Disposition::Fail);
        assert_eq!(st.classify(p, &EngineEvent::Error("x".into())), Disposition::Fail);
        assert_eq!(st.classify(p, &EngineEvent::SourceTimeout), Disposition::Fail);
        assert_eq!(st.classify(p, &EngineEvent::Warning("x".into())), Disposition::Warn);
        assert_eq!(st.classify(p, &EngineEvent::Started), Disposition::Ignore);
    }

    #[test]
    fn test_classify_starting() {
        let mut st = state();
        st.begin_start(PipelineId(1));
        let p = PipelineId(1);

        assert_eq!(st.classify(p, &EngineEvent::Started), Disposition::Healthy);
        // A pipeline that never comes up still has to be retried
        assert_eq!(st.classify(p, &EngineEvent::Error("x".into())), Disposition::Fail);
    }

    #[test]
    fn test_classify_stale_pipeline() {
        let mut st = state();
        st.begin_start(PipelineId(2));

        assert_eq!(
            st.classify(PipelineId(1), &EngineEvent::Error("late".into())),
            Disposition::Stale
        );
        assert_eq!(st.classify(PipelineId(1), &EngineEvent::Started), Disposition::Stale);
    }

    #[test]
    fn test_classify_awaiting_restart() {
        let mut st = state();
        st.begin_start(PipelineId(1));
        st.confirm_started();
        st.begin_stop();
        st.schedule_restart(Instant::now(), Duration::from_secs(1));
        let p = PipelineId(1);

        // Trailing events of the stopped pipeline change nothing
        assert_eq!(st.classify(p, &EngineEvent::Error("x".into())), Disposition::Ignore);
        assert_eq!(st.classify(p, &EngineEvent::EndOfStream), Disposition::Ignore);
        assert_eq!(st.classify(p, &EngineEvent::Started), Disposition::Ignore);
    }

    #[test]
    fn test_terminated_ignores_everything() {
        let mut st = state();
        st.begin_start(PipelineId(1));
        st.terminate();

        assert!(st.is_terminated());
        assert!(st.pipeline().is_none());
        assert_eq!(
            st.classify(PipelineId(1), &EngineEvent::Error("x".into())),
            Disposition::Ignore
        );
        assert!(!st.restart_due(Instant::now()));
    }
}
