//! Transport boundary - how the engine reaches an agent
//!
//! The engine routes between logical agent ids; actually invoking an
//! agent (wire protocol, endpoint resolution, retries) lives behind
//! [`AgentTransport`]. [`InProcessTransport`] is a handler-table
//! implementation for embedders and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::task::{AgentId, Message, Task};

/// Errors surfaced by a transport implementation
#[derive(Debug, Error)]
pub enum TransportError {
    /// No endpoint or handler known for the agent
    #[error("no endpoint for agent {0}")]
    Unresolvable(AgentId),

    /// The agent was reached but the invocation failed
    #[error("invoke failed for agent {agent}: {reason}")]
    InvokeFailed { agent: AgentId, reason: String },

    /// Anything else an implementation needs to surface
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// A resolved, reachable agent endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentEndpoint {
    pub agent: AgentId,
    pub url: String,
}

/// Abstracts the wire protocol to a remote or local agent.
///
/// `invoke` delivers `message` to `agent` in the context of `task` and
/// returns the agent's reply. The orchestrator is the only writer of
/// task state; transports never mutate the task they are shown.
#[async_trait]
pub trait AgentTransport: Send + Sync {
    async fn invoke(
        &self,
        agent: &AgentId,
        task: &Task,
        message: &Message,
    ) -> Result<Message, TransportError>;
}

/// Resolves logical agent ids to reachable endpoints.
///
/// Consumed by transport implementations, not by the orchestrator.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn resolve(&self, agent: &AgentId) -> Result<AgentEndpoint, TransportError>;
}

/// Handler signature for [`InProcessTransport`]; an `Err` becomes
/// [`TransportError::InvokeFailed`].
pub type LocalHandler = Arc<dyn Fn(&Task, &Message) -> Result<Message, String> + Send + Sync>;

/// Transport backed by an in-process handler table
#[derive(Default)]
pub struct InProcessTransport {
    handlers: RwLock<HashMap<AgentId, LocalHandler>>,
}

impl InProcessTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the handler for an agent.
    pub fn register<F>(&self, agent: impl Into<AgentId>, handler: F)
    where
        F: Fn(&Task, &Message) -> Result<Message, String> + Send + Sync + 'static,
    {
        let agent = agent.into();
        debug!(agent = %agent, "registering in-process handler");
        self.handlers.write().insert(agent, Arc::new(handler));
    }

    /// Convenience: an agent that echoes the inbound text back.
    pub fn register_echo(&self, agent: impl Into<AgentId>) {
        self.register(agent, |_task, message| {
            Ok(Message::agent_reply(message.text()))
        });
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }
}

#[async_trait]
impl AgentTransport for InProcessTransport {
    async fn invoke(
        &self,
        agent: &AgentId,
        task: &Task,
        message: &Message,
    ) -> Result<Message, TransportError> {
        let handler = self
            .handlers
            .read()
            .get(agent)
            .cloned()
            .ok_or_else(|| TransportError::Unresolvable(agent.clone()))?;

        handler(task, message).map_err(|reason| TransportError::InvokeFailed {
            agent: agent.clone(),
            reason,
        })
    }
}
