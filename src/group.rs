//! Parallel group helper - fan a message out to independent tasks
//!
//! Creates one task per target agent and dispatches concurrently. One
//! branch's failure never blocks collection of the others; the failed
//! branch's entry carries an error marker instead.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::error::RoutingError;
use crate::orchestrator::Orchestrator;
use crate::route::RouteDefinition;
use crate::task::{AgentId, Message, TaskHandler, TaskId};

/// Terminal per-branch outcome of a parallel dispatch
#[derive(Debug, Clone, PartialEq)]
pub enum BranchOutcome {
    /// The branch's full message history after the dispatch
    Completed(Vec<Message>),
    /// Error marker for an isolated branch failure
    Failed(String),
}

/// Fans one message out to a set of agents, each on its own task
pub struct ParallelGroup {
    orchestrator: Arc<Orchestrator>,
    members: Vec<(AgentId, TaskId)>,
    inflight: JoinSet<(AgentId, Result<Vec<Message>, RoutingError>)>,
}

impl ParallelGroup {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            orchestrator,
            members: Vec::new(),
            inflight: JoinSet::new(),
        }
    }

    /// Build a group from a `Parallel` route definition's destinations.
    pub fn from_route(
        orchestrator: Arc<Orchestrator>,
        route: &RouteDefinition,
    ) -> Result<Self, RoutingError> {
        let RouteDefinition::Parallel { destinations, .. } = route else {
            return Err(RoutingError::Config(
                "parallel group requires a parallel route".into(),
            ));
        };
        let mut group = Self::new(orchestrator);
        group.create_tasks(destinations)?;
        Ok(group)
    }

    /// Create one independent task per agent. Agents must be configured
    /// entry points; agent ids within one group must be distinct, since
    /// collected results are keyed by agent id.
    pub fn create_tasks(&mut self, agents: &[AgentId]) -> Result<Vec<TaskHandler>, RoutingError> {
        for agent in agents {
            let duplicated = agents.iter().filter(|a| *a == agent).count() > 1
                || self.members.iter().any(|(member, _)| member == agent);
            if duplicated {
                return Err(RoutingError::Config(format!(
                    "duplicate agent {agent} in parallel group"
                )));
            }
        }

        let mut handlers = Vec::with_capacity(agents.len());
        for agent in agents {
            let handler = self.orchestrator.create_task(agent.clone())?;
            self.members.push((agent.clone(), handler.task_id));
            handlers.push(handler);
        }
        info!(branches = self.members.len(), "parallel group ready");
        Ok(handlers)
    }

    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.members.iter().map(|(agent, _)| agent.clone()).collect()
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.members.iter().map(|(_, task_id)| *task_id).collect()
    }

    /// Dispatch `message` to every branch concurrently. Outcomes are
    /// gathered by [`collect_results`](Self::collect_results).
    pub fn send_message_to_all(&mut self, message: &Message) {
        for (agent, task_id) in &self.members {
            let orchestrator = Arc::clone(&self.orchestrator);
            let agent = agent.clone();
            let task_id = *task_id;
            let message = message.clone();

            debug!(agent = %agent, task_id = %task_id, "dispatching branch");
            self.inflight.spawn(async move {
                let result = orchestrator
                    .send_message(task_id, message)
                    .await
                    .map(|task| task.messages);
                (agent, result)
            });
        }
    }

    /// Await every outstanding branch and return one entry per agent.
    ///
    /// Branches that were never dispatched (or whose dispatch already
    /// completed in an earlier collection) report their task's current
    /// messages, so the map always has exactly one key per member.
    pub async fn collect_results(&mut self) -> HashMap<AgentId, BranchOutcome> {
        let mut results = HashMap::new();

        while let Some(joined) = self.inflight.join_next().await {
            match joined {
                Ok((agent, Ok(messages))) => {
                    results.insert(agent, BranchOutcome::Completed(messages));
                }
                Ok((agent, Err(err))) => {
                    warn!(agent = %agent, error = %err, "branch failed");
                    results.insert(agent, BranchOutcome::Failed(err.to_string()));
                }
                Err(join_err) => {
                    // A panicked branch is isolated like any other
                    // failure, but we no longer know which agent it
                    // was; it is filled in from the members list below.
                    warn!(error = %join_err, "branch join error");
                }
            }
        }

        for (agent, task_id) in &self.members {
            if results.contains_key(agent) {
                continue;
            }
            let outcome = match self.orchestrator.get_task(*task_id).await {
                Ok(task) => BranchOutcome::Completed(task.messages),
                Err(err) => BranchOutcome::Failed(err.to_string()),
            };
            results.insert(agent.clone(), outcome);
        }

        results
    }
}
