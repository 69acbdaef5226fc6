//! Worker and supervisor statistics

pub mod metrics;

pub use metrics::{SupervisorStats, WorkerStats};
