//! Route definitions, condition evaluation, and orchestration config

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::RoutingError;
use crate::extract::extract;
use crate::task::{AgentId, Task};

/// Comparison operator for a route condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionOp {
    Eq,
    Neq,
    /// Substring match for strings, membership for sequences
    Contains,
    Gt,
    Lt,
    Gte,
    Lte,
}

/// One condition in a conditional route: compare the field at
/// `field` against `value` and, on a match, send the task to
/// `destination`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCondition {
    pub field: String,
    pub op: ConditionOp,
    pub value: Value,
    pub destination: AgentId,
}

impl RouteCondition {
    /// Evaluate against a task. Pure; type mismatches and missing
    /// fields evaluate to false rather than erroring.
    pub fn matches(&self, task: &Task) -> bool {
        let doc = match serde_json::to_value(task) {
            Ok(doc) => doc,
            Err(_) => return false,
        };
        self.matches_value(&doc)
    }

    /// Evaluate against an already-serialized task document.
    pub fn matches_value(&self, doc: &Value) -> bool {
        let Some(field) = extract(doc, &self.field) else {
            return false;
        };

        match self.op {
            ConditionOp::Eq => field == &self.value,
            ConditionOp::Neq => field != &self.value,
            ConditionOp::Contains => contains(field, &self.value),
            ConditionOp::Gt => compare(field, &self.value, |o| o == std::cmp::Ordering::Greater),
            ConditionOp::Lt => compare(field, &self.value, |o| o == std::cmp::Ordering::Less),
            ConditionOp::Gte => compare(field, &self.value, |o| o != std::cmp::Ordering::Less),
            ConditionOp::Lte => compare(field, &self.value, |o| o != std::cmp::Ordering::Greater),
        }
    }
}

fn contains(field: &Value, target: &Value) -> bool {
    match (field, target) {
        (Value::String(haystack), Value::String(needle)) => haystack.contains(needle.as_str()),
        (Value::Array(items), needle) => items.contains(needle),
        _ => false,
    }
}

/// Ordered comparison over numbers or strings; anything else is a
/// type mismatch and never matches.
fn compare(field: &Value, target: &Value, accept: fn(std::cmp::Ordering) -> bool) -> bool {
    match (field, target) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a.partial_cmp(&b).map(accept).unwrap_or(false),
            _ => false,
        },
        (Value::String(a), Value::String(b)) => accept(a.as_str().cmp(b.as_str())),
        _ => false,
    }
}

/// How a task currently at `source` moves next
///
/// A tagged sum type: each strategy carries only its own payload, so
/// invalid combinations (a conditional route with a destination list,
/// say) are unrepresentable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteDefinition {
    /// First matching condition wins; no match means the task stays.
    Conditional {
        source: AgentId,
        conditions: Vec<RouteCondition>,
    },
    /// Fixed destinations visited unconditionally, one per invocation.
    Sequential {
        source: AgentId,
        destinations: Vec<AgentId>,
    },
    /// Every destination receives an independent copy of the task;
    /// driven through [`crate::ParallelGroup`].
    Parallel {
        source: AgentId,
        destinations: Vec<AgentId>,
    },
    /// Destination computed by a named, registered routing function.
    Dynamic { source: AgentId, router: String },
}

impl RouteDefinition {
    /// The agent this rule applies to
    pub fn source(&self) -> &AgentId {
        match self {
            RouteDefinition::Conditional { source, .. }
            | RouteDefinition::Sequential { source, .. }
            | RouteDefinition::Parallel { source, .. }
            | RouteDefinition::Dynamic { source, .. } => source,
        }
    }

    /// For a conditional route, the destination of the first condition
    /// matching `doc` (declaration order, later conditions skipped).
    pub(crate) fn first_match(&self, doc: &Value) -> Option<&AgentId> {
        let RouteDefinition::Conditional { conditions, .. } = self else {
            return None;
        };
        for condition in conditions {
            if condition.matches_value(doc) {
                debug!(
                    field = %condition.field,
                    destination = %condition.destination,
                    "condition matched"
                );
                return Some(&condition.destination);
            }
        }
        None
    }
}

/// Static routing configuration for an orchestrator
///
/// At most one route per source agent; a route added for a source that
/// already has one replaces it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestrationConfig {
    #[serde(default)]
    pub routes: Vec<RouteDefinition>,
    #[serde(default)]
    pub entry_points: HashSet<AgentId>,
    pub max_routing_depth: usize,
}

impl OrchestrationConfig {
    pub fn new(max_routing_depth: usize) -> Self {
        Self {
            routes: Vec::new(),
            entry_points: HashSet::new(),
            max_routing_depth,
        }
    }

    pub fn with_entry_point(mut self, agent: impl Into<AgentId>) -> Self {
        self.entry_points.insert(agent.into());
        self
    }

    pub fn with_route(mut self, route: RouteDefinition) -> Self {
        self.routes.retain(|r| r.source() != route.source());
        self.routes.push(route);
        self
    }

    /// The route registered for `agent`, if any. Duplicate sources
    /// (possible when deserialized from config) resolve to the last
    /// declaration.
    pub fn route_for(&self, agent: &AgentId) -> Option<&RouteDefinition> {
        self.routes.iter().rev().find(|r| r.source() == agent)
    }

    pub(crate) fn validate(&self) -> Result<(), RoutingError> {
        if self.max_routing_depth == 0 {
            return Err(RoutingError::Config(
                "max_routing_depth must be positive".into(),
            ));
        }
        if self.entry_points.is_empty() {
            return Err(RoutingError::Config(
                "at least one entry point is required".into(),
            ));
        }
        Ok(())
    }
}
