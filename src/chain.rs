//! Sequential chain helper - linear start/send/history API
//!
//! A thin ergonomic wrapper over an orchestrator whose route table
//! already links each agent in the chain to the next with `Sequential`
//! routes. The helper registers nothing itself.

use std::sync::Arc;

use tracing::info;

use crate::error::RoutingError;
use crate::orchestrator::Orchestrator;
use crate::task::{AgentId, Message, Role, Task, TaskHandler, TaskId};

/// One flattened entry of a chain's conversation history
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTurn {
    /// The agent this message was exchanged with
    pub agent: Option<AgentId>,
    pub role: Role,
    pub content: String,
}

/// Drives one task down a fixed list of agents
pub struct SequentialChain {
    orchestrator: Arc<Orchestrator>,
    sequence: Vec<AgentId>,
    task_id: Option<TaskId>,
}

impl SequentialChain {
    pub fn new(orchestrator: Arc<Orchestrator>, sequence: Vec<AgentId>) -> Self {
        Self {
            orchestrator,
            sequence,
            task_id: None,
        }
    }

    /// Create the chain's task at the first agent in the sequence.
    pub fn start_chain(&mut self) -> Result<TaskHandler, RoutingError> {
        let first = self
            .sequence
            .first()
            .cloned()
            .ok_or_else(|| RoutingError::Config("chain sequence is empty".into()))?;

        let handler = self.orchestrator.create_task(first)?;
        info!(task_id = %handler.task_id, agents = self.sequence.len(), "chain started");
        self.task_id = Some(handler.task_id);
        Ok(handler)
    }

    pub fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    pub fn sequence(&self) -> &[AgentId] {
        &self.sequence
    }

    /// Forward a message to the chain's task.
    pub async fn send_message(&self, message: Message) -> Result<Task, RoutingError> {
        let task_id = self.task_id.ok_or(RoutingError::ChainNotStarted)?;
        self.orchestrator.send_message(task_id, message).await
    }

    /// Current tracking record for the chain's task.
    pub async fn handler(&self) -> Result<TaskHandler, RoutingError> {
        let task_id = self.task_id.ok_or(RoutingError::ChainNotStarted)?;
        self.orchestrator.get_task_handler(task_id).await
    }

    /// Every message exchanged along the chain, in order, tagged with
    /// the agent it was exchanged with.
    pub async fn get_conversation_history(&self) -> Result<Vec<ChainTurn>, RoutingError> {
        let task_id = self.task_id.ok_or(RoutingError::ChainNotStarted)?;
        let task = self.orchestrator.get_task(task_id).await?;

        Ok(task
            .messages
            .iter()
            .map(|message| ChainTurn {
                agent: message.agent.clone(),
                role: message.role,
                content: message.text(),
            })
            .collect())
    }
}
