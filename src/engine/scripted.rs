//! In-memory engine driven by hand
//!
//! [`ScriptedEngine`] records every call it receives and delivers only the
//! notifications injected through its [`ScriptHandle`]. It lets a worker's
//! recovery behaviour be exercised without any media framework.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::config::StreamSpec;

use super::{EngineEvent, MediaEngine, Notification, PipelineId};

/// A call received by the scripted engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `start` with the spec it was given
    Start {
        pipeline: PipelineId,
        spec: StreamSpec,
        at: Instant,
    },
    /// `stop`
    Stop(PipelineId),
    /// `destroy`
    Destroy(PipelineId),
}

#[derive(Debug, Default)]
struct Journal {
    calls: Vec<EngineCall>,
}

/// Engine whose events come from a [`ScriptHandle`]
pub struct ScriptedEngine {
    journal: Arc<Mutex<Journal>>,
    next_id: u64,
    events_rx: mpsc::UnboundedReceiver<Notification>,
}

/// Test-side handle of a [`ScriptedEngine`]
///
/// Dropping every handle closes the engine's notification stream.
#[derive(Clone)]
pub struct ScriptHandle {
    journal: Arc<Mutex<Journal>>,
    events_tx: mpsc::UnboundedSender<Notification>,
}

impl ScriptedEngine {
    /// Create an engine and its handle
    pub fn new() -> (Self, ScriptHandle) {
        let journal = Arc::new(Mutex::new(Journal::default()));
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        let engine = Self {
            journal: Arc::clone(&journal),
            next_id: 1,
            events_rx,
        };
        let handle = ScriptHandle { journal, events_tx };

        (engine, handle)
    }

    fn record(&self, call: EngineCall) {
        lock(&self.journal).calls.push(call);
    }
}

impl MediaEngine for ScriptedEngine {
    fn start(&mut self, spec: &StreamSpec) -> PipelineId {
        let pipeline = PipelineId(self.next_id);
        self.next_id += 1;
        self.record(EngineCall::Start {
            pipeline,
            spec: spec.clone(),
            at: Instant::now(),
        });
        pipeline
    }

    fn stop(&mut self, pipeline: PipelineId) {
        self.record(EngineCall::Stop(pipeline));
    }

    async fn destroy(&mut self, pipeline: PipelineId) {
        self.record(EngineCall::Destroy(pipeline));
    }

    async fn next_notification(&mut self) -> Option<Notification> {
        self.events_rx.recv().await
    }
}

impl ScriptHandle {
    /// Inject an event for `pipeline`
    ///
    /// Returns false once the engine is gone.
    pub fn notify(&self, pipeline: PipelineId, event: EngineEvent) -> bool {
        self.events_tx
            .send(Notification::new(pipeline, event))
            .is_ok()
    }

    /// Every call so far, oldest first
    pub fn calls(&self) -> Vec<EngineCall> {
        lock(&self.journal).calls.clone()
    }

    /// Only the `start` calls, oldest first
    pub fn starts(&self) -> Vec<(PipelineId, StreamSpec, Instant)> {
        lock(&self.journal)
            .calls
            .iter()
            .filter_map(|call| match call {
                EngineCall::Start { pipeline, spec, at } => Some((*pipeline, spec.clone(), *at)),
                _ => None,
            })
            .collect()
    }

    /// Number of `stop` calls
    pub fn stop_count(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::Stop(_)))
    }

    /// Number of `destroy` calls
    pub fn destroy_count(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::Destroy(_)))
    }

    /// Wait until at least `n` pipelines were started, returning the `n`th
    pub async fn wait_for_start(&self, n: usize) -> PipelineId {
        loop {
            if let Some((pipeline, _, _)) = self.starts().get(n.saturating_sub(1)) {
                return *pipeline;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    fn count<F>(&self, pred: F) -> usize
    where
        F: Fn(&EngineCall) -> bool,
    {
        lock(&self.journal).calls.iter().filter(|c| pred(c)).count()
    }
}

fn lock(journal: &Mutex<Journal>) -> MutexGuard<'_, Journal> {
    journal.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
