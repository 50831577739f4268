//! # Switchboard
//!
//! Multi-agent task routing and orchestration engine.
//!
//! A task is a unit of work with an ordered message history. The
//! orchestrator moves it between independently addressable agent
//! endpoints according to declarative and programmatic rules, tracking
//! the path taken and bounding the total number of hops.
//!
//! ## Architecture
//!
//! ```text
//!  caller
//!    │ create_task / send_message
//!    ▼
//!  ┌─────────────────────────────────────────────────────┐
//!  │                   ORCHESTRATOR                      │
//!  │  ┌───────────┐ ┌──────────────┐ ┌────────────────┐  │
//!  │  │route table│ │ task handlers│ │dynamic routers │  │
//!  │  └─────┬─────┘ └──────────────┘ └────────────────┘  │
//!  └────────┼────────────────────────────────────────────┘
//!           │ conditional │ sequential │ parallel │ dynamic
//!           ▼
//!  ┌──────────────────┐      ┌──────────────────┐
//!  │  AgentTransport  │─────▶│  remote / local  │
//!  │  (wire protocol) │      │      agents      │
//!  └──────────────────┘      └──────────────────┘
//! ```
//!
//! ## Key concepts
//!
//! - **Task**: a unit of work with an ordered message history, routed
//!   between agents
//! - **Task handler**: the orchestrator's tracking record for one
//!   task's position and routing history
//! - **Route definition**: a rule describing how a task at a given
//!   agent moves next (conditional, sequential, parallel, or dynamic)
//! - **Routing depth**: the number of hops a task has taken, bounded
//!   to prevent infinite routing loops
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde_json::json;
//! use switchboard::{
//!     ConditionOp, InProcessTransport, Message, OrchestrationConfig, Orchestrator,
//!     RouteCondition, RouteDefinition,
//! };
//!
//! # async fn run() -> Result<(), switchboard::RoutingError> {
//! let config = OrchestrationConfig::new(5)
//!     .with_entry_point("general")
//!     .with_route(RouteDefinition::Conditional {
//!         source: "general".into(),
//!         conditions: vec![RouteCondition {
//!             field: "messages[-1].parts[0].content".into(),
//!             op: ConditionOp::Contains,
//!             value: json!("calculate"),
//!             destination: "calculator".into(),
//!         }],
//!     });
//!
//! let transport = Arc::new(InProcessTransport::new());
//! transport.register_echo("general");
//! transport.register_echo("calculator");
//!
//! let orchestrator = Orchestrator::new(config, transport)?;
//! let handler = orchestrator.create_task("general")?;
//! orchestrator
//!     .send_message(handler.task_id, Message::user("please calculate 2+2"))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod chain;
pub mod error;
pub mod extract;
pub mod group;
pub mod orchestrator;
pub mod route;
pub mod task;
pub mod transport;

pub use chain::{ChainTurn, SequentialChain};
pub use error::RoutingError;
pub use extract::{extract, parse_path, PathSegment};
pub use group::{BranchOutcome, ParallelGroup};
pub use orchestrator::{DynamicRouter, Orchestrator};
pub use route::{ConditionOp, OrchestrationConfig, RouteCondition, RouteDefinition};
pub use task::{
    AgentId, Message, Part, Role, RouteHop, Task, TaskHandler, TaskId, TaskState,
};
pub use transport::{
    AgentEndpoint, AgentTransport, InProcessTransport, LocalHandler, RegistryClient,
    TransportError,
};
