//! Main orchestrator - routes tasks between agents

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::error::RoutingError;
use crate::route::{OrchestrationConfig, RouteDefinition};
use crate::task::{AgentId, Message, Task, TaskHandler, TaskId, TaskState};
use crate::transport::AgentTransport;

/// A caller-registered routing function: given the task, compute the
/// next destination, or `None` to leave the task where it is.
pub type DynamicRouter = Arc<dyn Fn(&Task) -> Option<AgentId> + Send + Sync>;

/// Task plus its tracking record, serialized behind one per-task lock
struct TrackedTask {
    task: Task,
    handler: TaskHandler,
}

/// The routing engine
///
/// Owns the route table, the task-handler map, and the dynamic-router
/// registry; the sole component that calls out to the agent transport.
///
/// Operations on the same task id are strictly serialized by a
/// per-task async mutex (held across the transport call); operations on
/// different task ids proceed concurrently. The task map and router
/// registry are guarded by short, non-awaiting `RwLock` sections.
pub struct Orchestrator {
    config: OrchestrationConfig,
    transport: Arc<dyn AgentTransport>,
    /// Tracked tasks, one lock per task
    tasks: RwLock<HashMap<TaskId, Arc<Mutex<TrackedTask>>>>,
    /// Named routing functions, scoped to this instance
    routers: RwLock<HashMap<String, DynamicRouter>>,
}

impl Orchestrator {
    /// Create an orchestrator over a validated configuration.
    pub fn new(
        config: OrchestrationConfig,
        transport: Arc<dyn AgentTransport>,
    ) -> Result<Self, RoutingError> {
        config.validate()?;
        info!(
            routes = config.routes.len(),
            entry_points = config.entry_points.len(),
            max_routing_depth = config.max_routing_depth,
            "creating orchestrator"
        );
        Ok(Self {
            config,
            transport,
            tasks: RwLock::new(HashMap::new()),
            routers: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &OrchestrationConfig {
        &self.config
    }

    /// Create a new task at an entry-point agent.
    pub fn create_task(&self, entry_agent: impl Into<AgentId>) -> Result<TaskHandler, RoutingError> {
        let entry_agent = entry_agent.into();
        if !self.config.entry_points.contains(&entry_agent) {
            return Err(RoutingError::InvalidEntryPoint(entry_agent));
        }

        let task_id = TaskId::new();
        let mut task = Task::new(task_id);
        task.state = TaskState::Running;
        let handler = TaskHandler::new(task_id, entry_agent.clone());

        self.tasks.write().insert(
            task_id,
            Arc::new(Mutex::new(TrackedTask {
                task,
                handler: handler.clone(),
            })),
        );

        info!(task_id = %task_id, entry = %entry_agent, "created task");
        Ok(handler)
    }

    /// Register (or replace) a named dynamic router. Last registration
    /// wins.
    pub fn register_dynamic_router<F>(&self, name: impl Into<String>, router: F)
    where
        F: Fn(&Task) -> Option<AgentId> + Send + Sync + 'static,
    {
        let name = name.into();
        debug!(router = %name, "registering dynamic router");
        self.routers.write().insert(name, Arc::new(router));
    }

    /// Deliver a message to the task's current agent and apply the
    /// routing rule registered for that agent to the response.
    ///
    /// The transport call is the only suspension point. A transport
    /// error is returned without touching `current_agent`/`history`
    /// (the inbound message stays appended). Exceeding the depth cap
    /// fails the task and preserves its last good position.
    #[instrument(skip(self, message), fields(task_id = %task_id))]
    pub async fn send_message(
        &self,
        task_id: TaskId,
        message: Message,
    ) -> Result<Task, RoutingError> {
        let entry = self
            .tasks
            .read()
            .get(&task_id)
            .cloned()
            .ok_or(RoutingError::UnknownTask(task_id))?;

        let mut tracked = entry.lock().await;
        if tracked.handler.status.is_terminal() {
            return Err(RoutingError::TaskTerminated {
                task_id,
                state: tracked.handler.status,
            });
        }

        let current = tracked.handler.current_agent.clone();

        let mut message = message;
        message.agent = Some(current.clone());
        tracked.task.messages.push(message.clone());

        debug!(agent = %current, "invoking agent");
        let mut reply = self
            .transport
            .invoke(&current, &tracked.task, &message)
            .await?;
        reply.agent = Some(current.clone());
        tracked.task.messages.push(reply);

        if let Some(destination) = self.resolve_destination(&mut tracked) {
            // +1 for the pending hop, +1 for the entry agent.
            if tracked.handler.history.len() + 1 > self.config.max_routing_depth + 1 {
                tracked.handler.status = TaskState::Failed;
                tracked.task.state = TaskState::Failed;
                warn!(
                    task_id = %task_id,
                    depth = tracked.handler.depth(),
                    "routing depth exceeded, failing task"
                );
                return Err(RoutingError::RoutingDepthExceeded {
                    task_id,
                    depth: tracked.handler.depth(),
                });
            }
            info!(from = %current, to = %destination, "routing task");
            tracked.handler.record_hop(destination);
        }

        Ok(tracked.task.clone())
    }

    /// Resolve the next destination for the task's current agent, or
    /// `None` when the task stays put (no route, no condition matched,
    /// sequence exhausted, parallel route, absent or declining dynamic
    /// router).
    ///
    /// An active sequential itinerary takes precedence over the route
    /// table: firing a `Sequential` route commits the task to visiting
    /// the whole destination list, one stop per invocation.
    fn resolve_destination(&self, tracked: &mut TrackedTask) -> Option<AgentId> {
        if let Some(next) = tracked.handler.pending_sequence.pop_front() {
            debug!(to = %next, "following sequential itinerary");
            return Some(next);
        }

        let current = tracked.handler.current_agent.clone();
        let route = self.config.route_for(&current)?;

        match route {
            RouteDefinition::Conditional { .. } => {
                let doc = serde_json::to_value(&tracked.task).ok()?;
                route.first_match(&doc).cloned()
            }
            RouteDefinition::Sequential { destinations, .. } => {
                let mut stops = destinations.iter().cloned();
                let first = stops.next();
                if first.is_none() {
                    debug!("sequential route has no destinations, task stays");
                }
                tracked.handler.pending_sequence = stops.collect();
                first
            }
            RouteDefinition::Parallel { .. } => {
                // One handler models one linear path; fan-out goes
                // through ParallelGroup.
                warn!(agent = %current, "parallel route hit via send_message, task stays");
                None
            }
            RouteDefinition::Dynamic { router, .. } => {
                let func = self.routers.read().get(router).cloned();
                match func {
                    Some(func) => func(&tracked.task),
                    None => {
                        debug!(router = %router, "dynamic router not registered, task stays");
                        None
                    }
                }
            }
        }
    }

    /// Read-only snapshot of a task's tracking record.
    pub async fn get_task_handler(&self, task_id: TaskId) -> Result<TaskHandler, RoutingError> {
        let entry = self
            .tasks
            .read()
            .get(&task_id)
            .cloned()
            .ok_or(RoutingError::UnknownTask(task_id))?;
        let tracked = entry.lock().await;
        Ok(tracked.handler.clone())
    }

    /// Snapshot of the task itself.
    pub async fn get_task(&self, task_id: TaskId) -> Result<Task, RoutingError> {
        let entry = self
            .tasks
            .read()
            .get(&task_id)
            .cloned()
            .ok_or(RoutingError::UnknownTask(task_id))?;
        let tracked = entry.lock().await;
        Ok(tracked.task.clone())
    }

    /// Move a task to `Cancelled`. Blocks future routing only; an
    /// in-flight transport call is not interrupted.
    pub async fn cancel_task(&self, task_id: TaskId) -> Result<(), RoutingError> {
        self.finish_task(task_id, TaskState::Cancelled).await
    }

    /// Move a task to `Completed`.
    pub async fn complete_task(&self, task_id: TaskId) -> Result<(), RoutingError> {
        self.finish_task(task_id, TaskState::Completed).await
    }

    async fn finish_task(&self, task_id: TaskId, state: TaskState) -> Result<(), RoutingError> {
        let entry = self
            .tasks
            .read()
            .get(&task_id)
            .cloned()
            .ok_or(RoutingError::UnknownTask(task_id))?;

        let mut tracked = entry.lock().await;
        if tracked.handler.status.is_terminal() {
            return Err(RoutingError::TaskTerminated {
                task_id,
                state: tracked.handler.status,
            });
        }
        tracked.handler.status = state;
        tracked.task.state = state;
        info!(task_id = %task_id, state = ?state, "task finished");
        Ok(())
    }

    /// Remove handlers for tasks in a terminal state, returning how
    /// many were dropped. Tasks with an operation in flight are kept.
    pub fn purge_finished(&self) -> usize {
        let mut tasks = self.tasks.write();
        let before = tasks.len();
        tasks.retain(|_, entry| match entry.try_lock() {
            Ok(tracked) => !tracked.handler.status.is_terminal(),
            Err(_) => true,
        });
        let purged = before - tasks.len();
        if purged > 0 {
            info!(purged, "purged finished tasks");
        }
        purged
    }

    pub fn task_ids(&self) -> Vec<TaskId> {
        self.tasks.read().keys().copied().collect()
    }

    pub fn task_count(&self) -> usize {
        self.tasks.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::{ConditionOp, RouteCondition};
    use crate::transport::InProcessTransport;
    use serde_json::json;
    use tokio_test::assert_ok;

    fn echo_transport(agents: &[&str]) -> Arc<InProcessTransport> {
        let transport = Arc::new(InProcessTransport::new());
        for agent in agents {
            transport.register_echo(*agent);
        }
        transport
    }

    fn conditional_route() -> RouteDefinition {
        RouteDefinition::Conditional {
            source: "general".into(),
            conditions: vec![
                RouteCondition {
                    field: "messages[-1].parts[0].content".into(),
                    op: ConditionOp::Contains,
                    value: json!("calculate"),
                    destination: "calculator".into(),
                },
                RouteCondition {
                    field: "messages[-1].parts[0].content".into(),
                    op: ConditionOp::Contains,
                    value: json!("lookup"),
                    destination: "search".into(),
                },
            ],
        }
    }

    fn conditional_orchestrator() -> Orchestrator {
        let config = OrchestrationConfig::new(5)
            .with_entry_point("general")
            .with_route(conditional_route());
        let transport = echo_transport(&["general", "calculator", "search"]);
        Orchestrator::new(config, transport).unwrap()
    }

    // === Task creation ===

    #[test]
    fn test_create_task_at_entry_point() {
        let orchestrator = conditional_orchestrator();
        let handler = orchestrator.create_task("general").unwrap();
        assert_eq!(handler.current_agent, AgentId::from("general"));
        assert_eq!(handler.history, vec![AgentId::from("general")]);
        assert_eq!(handler.status, TaskState::Running);
        assert_eq!(orchestrator.task_count(), 1);
    }

    #[test]
    fn test_create_task_rejects_non_entry_agent() {
        let orchestrator = conditional_orchestrator();
        let err = orchestrator.create_task("calculator").unwrap_err();
        assert!(matches!(err, RoutingError::InvalidEntryPoint(_)));
        assert_eq!(orchestrator.task_count(), 0);
    }

    // === send_message ===

    #[tokio::test]
    async fn test_send_message_unknown_task() {
        let orchestrator = conditional_orchestrator();
        let err = orchestrator
            .send_message(TaskId::new(), Message::user("hi"))
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::UnknownTask(_)));
    }

    #[tokio::test]
    async fn test_conditional_routing_moves_task() {
        let orchestrator = conditional_orchestrator();
        let handler = orchestrator.create_task("general").unwrap();

        let task = orchestrator
            .send_message(handler.task_id, Message::user("please calculate 2+2"))
            .await
            .unwrap();

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(handler.current_agent, AgentId::from("calculator"));
        assert_eq!(
            handler.history,
            vec![AgentId::from("general"), AgentId::from("calculator")]
        );
        assert_eq!(handler.routing_history.len(), 1);
        // user message + echoed reply
        assert_eq!(task.messages.len(), 2);
        assert_eq!(task.messages[1].agent, Some(AgentId::from("general")));
    }

    #[tokio::test]
    async fn test_conditional_tie_break_first_declared_wins() {
        let orchestrator = conditional_orchestrator();
        let handler = orchestrator.create_task("general").unwrap();

        // Matches both "calculate" and "lookup"; first declared wins.
        orchestrator
            .send_message(handler.task_id, Message::user("calculate then lookup"))
            .await
            .unwrap();

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(handler.current_agent, AgentId::from("calculator"));
    }

    #[tokio::test]
    async fn test_no_condition_match_task_stays() {
        let orchestrator = conditional_orchestrator();
        let handler = orchestrator.create_task("general").unwrap();

        orchestrator
            .send_message(handler.task_id, Message::user("just chatting"))
            .await
            .unwrap();

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(handler.current_agent, AgentId::from("general"));
        assert_eq!(handler.history.len(), 1);
        assert!(handler.routing_history.is_empty());
    }

    #[tokio::test]
    async fn test_no_route_for_agent_task_stays() {
        let config = OrchestrationConfig::new(5).with_entry_point("general");
        let transport = echo_transport(&["general"]);
        let orchestrator = Orchestrator::new(config, transport).unwrap();

        let handler = orchestrator.create_task("general").unwrap();
        orchestrator
            .send_message(handler.task_id, Message::user("hello"))
            .await
            .unwrap();

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(handler.current_agent, AgentId::from("general"));
    }

    // === Transport errors ===

    #[tokio::test]
    async fn test_transport_error_preserves_routing_state() {
        let config = OrchestrationConfig::new(5)
            .with_entry_point("general")
            .with_route(conditional_route());
        let transport = Arc::new(InProcessTransport::new());
        transport.register("general", |_t, _m| Err("wire down".into()));
        let orchestrator = Orchestrator::new(config, transport).unwrap();

        let handler = orchestrator.create_task("general").unwrap();
        let err = orchestrator
            .send_message(handler.task_id, Message::user("calculate"))
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::Transport(_)));

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(handler.current_agent, AgentId::from("general"));
        assert_eq!(handler.history.len(), 1);
        assert_eq!(handler.status, TaskState::Running);
    }

    // === Sequential routes ===

    #[tokio::test]
    async fn test_sequential_chain_advances_in_order() {
        let config = OrchestrationConfig::new(5)
            .with_entry_point("intake")
            .with_route(RouteDefinition::Sequential {
                source: "intake".into(),
                destinations: vec!["research".into()],
            })
            .with_route(RouteDefinition::Sequential {
                source: "research".into(),
                destinations: vec!["summary".into()],
            });
        let transport = echo_transport(&["intake", "research", "summary"]);
        let orchestrator = Orchestrator::new(config, transport).unwrap();

        let handler = orchestrator.create_task("intake").unwrap();
        for _ in 0..3 {
            assert_ok!(
                orchestrator
                    .send_message(handler.task_id, Message::user("next"))
                    .await
            );
        }

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(
            handler.history,
            vec![
                AgentId::from("intake"),
                AgentId::from("research"),
                AgentId::from("summary"),
            ]
        );
        // Third send hit "summary", which has no route: sequence
        // exhausted, not an error.
        assert_eq!(handler.current_agent, AgentId::from("summary"));
    }

    #[tokio::test]
    async fn test_sequential_multi_destination_itinerary() {
        // One route whose list spans several hops: each invocation
        // advances one position, even though "a" has no route of its
        // own.
        let config = OrchestrationConfig::new(5)
            .with_entry_point("hub")
            .with_route(RouteDefinition::Sequential {
                source: "hub".into(),
                destinations: vec!["a".into(), "b".into()],
            });
        let transport = echo_transport(&["hub", "a", "b"]);
        let orchestrator = Orchestrator::new(config, transport).unwrap();

        let handler = orchestrator.create_task("hub").unwrap();
        // hub -> a, a -> b, then exhausted: stays at b.
        for _ in 0..3 {
            orchestrator
                .send_message(handler.task_id, Message::user("go"))
                .await
                .unwrap();
        }

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(
            handler.history,
            vec![
                AgentId::from("hub"),
                AgentId::from("a"),
                AgentId::from("b"),
            ]
        );
        assert_eq!(handler.current_agent, AgentId::from("b"));
    }

    #[tokio::test]
    async fn test_itinerary_precedes_route_table() {
        // While the hub's itinerary is active, the conditional route
        // registered for "a" is not consulted.
        let config = OrchestrationConfig::new(5)
            .with_entry_point("hub")
            .with_route(RouteDefinition::Sequential {
                source: "hub".into(),
                destinations: vec!["a".into(), "b".into()],
            })
            .with_route(RouteDefinition::Conditional {
                source: "a".into(),
                conditions: vec![RouteCondition {
                    field: "state".into(),
                    op: ConditionOp::Eq,
                    value: json!("running"),
                    destination: "elsewhere".into(),
                }],
            });
        let transport = echo_transport(&["hub", "a", "b", "elsewhere"]);
        let orchestrator = Orchestrator::new(config, transport).unwrap();

        let handler = orchestrator.create_task("hub").unwrap();
        for _ in 0..2 {
            orchestrator
                .send_message(handler.task_id, Message::user("go"))
                .await
                .unwrap();
        }

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(handler.current_agent, AgentId::from("b"));
    }

    // === Dynamic routes ===

    #[tokio::test]
    async fn test_dynamic_router_routes_task() {
        let config = OrchestrationConfig::new(5)
            .with_entry_point("general")
            .with_route(RouteDefinition::Dynamic {
                source: "general".into(),
                router: "keyword".into(),
            });
        let transport = echo_transport(&["general", "calculator"]);
        let orchestrator = Orchestrator::new(config, transport).unwrap();

        orchestrator.register_dynamic_router("keyword", |task: &Task| {
            task.last_message()
                .filter(|m| m.text().contains("math"))
                .map(|_| AgentId::from("calculator"))
        });

        let handler = orchestrator.create_task("general").unwrap();
        orchestrator
            .send_message(handler.task_id, Message::user("math please"))
            .await
            .unwrap();

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(handler.current_agent, AgentId::from("calculator"));
    }

    #[tokio::test]
    async fn test_dynamic_router_returning_none_task_stays() {
        let config = OrchestrationConfig::new(5)
            .with_entry_point("general")
            .with_route(RouteDefinition::Dynamic {
                source: "general".into(),
                router: "never".into(),
            });
        let transport = echo_transport(&["general"]);
        let orchestrator = Orchestrator::new(config, transport).unwrap();
        orchestrator.register_dynamic_router("never", |_task: &Task| None);

        let handler = orchestrator.create_task("general").unwrap();
        orchestrator
            .send_message(handler.task_id, Message::user("hello"))
            .await
            .unwrap();

        let after = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(after.current_agent, handler.current_agent);
        assert_eq!(after.history, handler.history);
    }

    #[tokio::test]
    async fn test_unregistered_dynamic_router_is_soft() {
        let config = OrchestrationConfig::new(5)
            .with_entry_point("general")
            .with_route(RouteDefinition::Dynamic {
                source: "general".into(),
                router: "missing".into(),
            });
        let transport = echo_transport(&["general"]);
        let orchestrator = Orchestrator::new(config, transport).unwrap();

        let handler = orchestrator.create_task("general").unwrap();
        // Must not error even though "missing" was never registered.
        orchestrator
            .send_message(handler.task_id, Message::user("hello"))
            .await
            .unwrap();

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(handler.current_agent, AgentId::from("general"));
    }

    #[tokio::test]
    async fn test_register_dynamic_router_last_wins() {
        let config = OrchestrationConfig::new(5)
            .with_entry_point("general")
            .with_route(RouteDefinition::Dynamic {
                source: "general".into(),
                router: "pick".into(),
            });
        let transport = echo_transport(&["general", "a", "b"]);
        let orchestrator = Orchestrator::new(config, transport).unwrap();

        orchestrator.register_dynamic_router("pick", |_task: &Task| Some(AgentId::from("a")));
        orchestrator.register_dynamic_router("pick", |_task: &Task| Some(AgentId::from("b")));

        let handler = orchestrator.create_task("general").unwrap();
        orchestrator
            .send_message(handler.task_id, Message::user("go"))
            .await
            .unwrap();

        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(handler.current_agent, AgentId::from("b"));
    }

    // === Depth enforcement ===

    #[tokio::test]
    async fn test_routing_depth_exceeded_fails_task() {
        // Two agents that route to each other forever.
        let config = OrchestrationConfig::new(1)
            .with_entry_point("general")
            .with_route(RouteDefinition::Sequential {
                source: "general".into(),
                destinations: vec!["calculator".into()],
            })
            .with_route(RouteDefinition::Sequential {
                source: "calculator".into(),
                destinations: vec!["general".into()],
            });
        let transport = echo_transport(&["general", "calculator"]);
        let orchestrator = Orchestrator::new(config, transport).unwrap();

        let handler = orchestrator.create_task("general").unwrap();

        // First hop fits within max_routing_depth = 1.
        orchestrator
            .send_message(handler.task_id, Message::user("one"))
            .await
            .unwrap();

        // Second hop would exceed the cap.
        let err = orchestrator
            .send_message(handler.task_id, Message::user("two"))
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::RoutingDepthExceeded { .. }));

        // Last good state preserved for diagnostics.
        let handler = orchestrator.get_task_handler(handler.task_id).await.unwrap();
        assert_eq!(handler.status, TaskState::Failed);
        assert_eq!(handler.history.len(), 2);
        assert_eq!(handler.current_agent, AgentId::from("calculator"));
    }

    // === Lifecycle ===

    #[tokio::test]
    async fn test_terminated_task_rejects_send() {
        let orchestrator = conditional_orchestrator();
        let handler = orchestrator.create_task("general").unwrap();

        orchestrator.cancel_task(handler.task_id).await.unwrap();
        let err = orchestrator
            .send_message(handler.task_id, Message::user("hi"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RoutingError::TaskTerminated {
                state: TaskState::Cancelled,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_complete_then_cancel_rejected() {
        let orchestrator = conditional_orchestrator();
        let handler = orchestrator.create_task("general").unwrap();

        orchestrator.complete_task(handler.task_id).await.unwrap();
        let err = orchestrator.cancel_task(handler.task_id).await.unwrap_err();
        assert!(matches!(err, RoutingError::TaskTerminated { .. }));
    }

    #[tokio::test]
    async fn test_purge_finished_drops_terminal_only() {
        let orchestrator = conditional_orchestrator();
        let done = orchestrator.create_task("general").unwrap();
        let live = orchestrator.create_task("general").unwrap();

        orchestrator.complete_task(done.task_id).await.unwrap();
        assert_eq!(orchestrator.purge_finished(), 1);

        assert!(matches!(
            orchestrator.get_task_handler(done.task_id).await,
            Err(RoutingError::UnknownTask(_))
        ));
        assert!(orchestrator.get_task_handler(live.task_id).await.is_ok());
    }

    // === Invariants ===

    #[tokio::test]
    async fn test_history_never_exceeds_depth_plus_one() {
        let config = OrchestrationConfig::new(2)
            .with_entry_point("a")
            .with_route(RouteDefinition::Sequential {
                source: "a".into(),
                destinations: vec!["b".into()],
            })
            .with_route(RouteDefinition::Sequential {
                source: "b".into(),
                destinations: vec!["a".into()],
            });
        let transport = echo_transport(&["a", "b"]);
        let orchestrator = Orchestrator::new(config, transport).unwrap();

        let handler = orchestrator.create_task("a").unwrap();
        for _ in 0..5 {
            let _ = orchestrator
                .send_message(handler.task_id, Message::user("ping"))
                .await;
            let snapshot = orchestrator.get_task_handler(handler.task_id).await.unwrap();
            assert!(snapshot.history.len() <= 3);
            assert_eq!(snapshot.history.last(), Some(&snapshot.current_agent));
        }
    }
}
