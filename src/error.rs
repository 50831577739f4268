//! Engine error types

use thiserror::Error;

use crate::task::{AgentId, TaskId, TaskState};
use crate::transport::TransportError;

/// Errors raised by the routing engine
///
/// Soft non-matches (missing fields, unmatched conditions, exhausted
/// sequences, absent dynamic routers) are absorbed internally and never
/// surface here; the task simply stays where it is.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Task created at an agent outside the configured entry points
    #[error("agent {0} is not a configured entry point")]
    InvalidEntryPoint(AgentId),

    /// Task id is not tracked by this orchestrator
    #[error("unknown task: {0}")]
    UnknownTask(TaskId),

    /// Task is already in a terminal state
    #[error("task {task_id} already terminated ({state:?})")]
    TaskTerminated { task_id: TaskId, state: TaskState },

    /// Routing the task further would exceed the configured depth cap;
    /// the task is failed with its last good position preserved
    #[error("routing depth exceeded for task {task_id} after {depth} hops")]
    RoutingDepthExceeded { task_id: TaskId, depth: usize },

    /// Surfaced from the transport without mutating routing state
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Chain helper used before `start_chain`
    #[error("sequential chain has not been started")]
    ChainNotStarted,

    /// Invalid orchestration configuration
    #[error("configuration error: {0}")]
    Config(String),
}
