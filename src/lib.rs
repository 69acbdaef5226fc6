//! Supervised multi-stream media relay
//!
//! Relays any number of RTSP camera streams to fixed UDP destinations and
//! keeps every one of them alive without operator intervention.
//!
//! # Architecture
//!
//! ```text
//! config files ──► config::parse_streams ──► [StreamSpec; N]
//!                                                  │
//!                                       supervisor::ProcessSupervisor
//!                                       (one OS process per stream)
//!                                                  │
//!                                         worker::StreamWorker
//!                              Created ─► Starting ─► Running
//!                                            ▲           │ EOS / error / timeout
//!                                            │           ▼
//!                                      AwaitingRestart ◄─ Stopping
//!                                                  │
//!                                        engine::MediaEngine
//! ```
//!
//! Failures never cross a process boundary: a stream that fails is stopped
//! and restarted after a fixed backoff inside its own process, forever.
//! The supervisor only launches processes and reaps the ones that exit.

pub mod config;
pub mod engine;
pub mod error;
pub mod stats;
pub mod supervisor;
pub mod worker;

pub use config::{Encoding, GlobalConfig, RelayConfig, StreamSpec};
pub use engine::{EngineEvent, MediaEngine, Notification, PipelineId};
pub use error::{Error, Result};
pub use supervisor::{ProcessSupervisor, SUPERVISOR_EXIT_CODE};
pub use worker::{LifecycleState, StreamWorker};
