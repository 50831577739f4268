//! Core task data model - tasks, messages, and the per-task tracking record

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical agent identifier ("general", "calculator", ...)
///
/// Route destinations are logical names; resolving a name to a reachable
/// endpoint is the transport layer's job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for AgentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Unique task identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
    System,
}

/// One content fragment of a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Part {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: None,
        }
    }
}

/// A single message exchanged with an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub parts: Vec<Part>,
    /// Attribution written by the engine: the agent a user message was
    /// delivered to, or the agent a reply came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentId>,
}

impl Message {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            role,
            parts,
            agent: None,
        }
    }

    /// Single-part user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(content)])
    }

    /// Single-part agent message
    pub fn agent_reply(content: impl Into<String>) -> Self {
        Self::new(Role::Agent, vec![Part::text(content)])
    }

    /// All part contents joined with a space
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.content.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Task lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Created,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }
}

/// A unit of work routed between agents
///
/// Owned exclusively by the orchestrator once created; mutated only
/// through orchestrator operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub messages: Vec<Message>,
    pub state: TaskState,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    pub fn new(id: TaskId) -> Self {
        Self {
            id,
            messages: Vec::new(),
            state: TaskState::Created,
            metadata: serde_json::Map::new(),
        }
    }

    /// Most recent message, if any
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// One entry in a task's routing audit trail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteHop {
    pub from: AgentId,
    pub to: AgentId,
    pub at: DateTime<Utc>,
}

/// The orchestrator's tracking record for one task
///
/// Invariants: `history` is never empty, its last element is always
/// `current_agent`, and its length never exceeds the configured
/// maximum routing depth plus one (the entry agent).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskHandler {
    pub task_id: TaskId,
    pub current_agent: AgentId,
    pub history: Vec<AgentId>,
    pub status: TaskState,
    pub routing_history: Vec<RouteHop>,
    /// Remaining stops of an active multi-destination sequential
    /// route; consumed one per invocation, ahead of the route table.
    #[serde(default)]
    pub(crate) pending_sequence: VecDeque<AgentId>,
}

impl TaskHandler {
    pub fn new(task_id: TaskId, entry_agent: AgentId) -> Self {
        Self {
            task_id,
            current_agent: entry_agent.clone(),
            history: vec![entry_agent],
            status: TaskState::Running,
            routing_history: Vec::new(),
            pending_sequence: VecDeque::new(),
        }
    }

    /// Number of hops taken so far (entry agent is hop zero)
    pub fn depth(&self) -> usize {
        self.history.len().saturating_sub(1)
    }

    /// Move the task to `destination`, appending to both the hop
    /// history and the audit trail.
    pub(crate) fn record_hop(&mut self, destination: AgentId) {
        self.routing_history.push(RouteHop {
            from: self.current_agent.clone(),
            to: destination.clone(),
            at: Utc::now(),
        });
        self.history.push(destination.clone());
        self.current_agent = destination;
    }
}
