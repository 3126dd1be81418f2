//! Sequential execution strategy.
//!
//! Drives a node set through one aggregated run: validate, resolve,
//! reset, then execute in topological order. A node that cannot be
//! scheduled is skipped and the run continues; a node that fails during
//! execution stops the rest of the run, since downstream nodes would
//! otherwise operate on stale or missing data. Cancellation is a
//! distinct outcome, never counted as a failure.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::context::ExecutionContext;
use crate::error::GraphError;
use crate::graph::NodeGraph;
use crate::node::{Node, NodeExecutionResult};
use crate::resolver;
use crate::types::NodeId;

/// A node-scoped error carried in a run result
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeError {
    /// Id of the offending node
    pub node_id: NodeId,
    /// Display name of the offending node
    pub node_name: String,
    /// What went wrong
    pub message: String,
}

impl NodeError {
    pub fn new(
        node_id: impl Into<String>,
        node_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_name: node_name.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.node_name, self.message)
    }
}

/// Aggregated outcome of one graph run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphExecutionResult {
    /// True iff zero nodes failed and at least one executed
    pub success: bool,
    /// Whether the run was interrupted by cancellation
    pub cancelled: bool,
    /// Number of nodes that executed successfully
    pub nodes_executed: usize,
    /// Number of nodes that failed (including skipped nodes)
    pub nodes_failed: usize,
    /// Number of nodes skipped because they could not be scheduled
    pub nodes_skipped: usize,
    /// Total wall time in milliseconds
    pub execution_time_ms: u64,
    /// Ordered node-scoped errors
    pub errors: Vec<NodeError>,
    /// The resolved execution order (empty when resolution failed)
    pub order: Vec<NodeId>,
}

impl GraphExecutionResult {
    fn empty() -> Self {
        Self {
            success: false,
            cancelled: false,
            nodes_executed: 0,
            nodes_failed: 0,
            nodes_skipped: 0,
            execution_time_ms: 0,
            errors: Vec::new(),
            order: Vec::new(),
        }
    }

    /// A failed result carrying validation or resolution errors
    fn failed(errors: Vec<NodeError>, execution_time_ms: u64) -> Self {
        Self {
            errors,
            execution_time_ms,
            ..Self::empty()
        }
    }
}

/// Executes a node set strictly one node at a time.
///
/// Nodes never run concurrently within a graph: node outputs are
/// mutated in place on pins, and concurrent writers would race.
#[derive(Debug, Default)]
pub struct SequentialExecutor;

impl SequentialExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Execute every node in the graph
    pub async fn execute(
        &self,
        graph: &mut NodeGraph,
        ctx: &ExecutionContext,
    ) -> GraphExecutionResult {
        let node_ids = graph.node_ids();
        self.execute_set(graph, &node_ids, ctx).await
    }

    /// Execute the given working set of nodes
    pub async fn execute_set(
        &self,
        graph: &mut NodeGraph,
        node_ids: &[NodeId],
        ctx: &ExecutionContext,
    ) -> GraphExecutionResult {
        let started = Instant::now();
        log::debug!(
            "run {}: executing {} node(s) of graph '{}'",
            ctx.execution_id(),
            node_ids.len(),
            graph.id()
        );

        let dep_errors = resolver::validate_dependencies(graph, node_ids);
        if !dep_errors.is_empty() {
            let errors = dep_errors
                .into_iter()
                .map(|e| {
                    let node_id = e.node_id().to_string();
                    let node_name = graph
                        .node(&node_id)
                        .map(|n| n.base().name().to_string())
                        .unwrap_or_else(|| node_id.clone());
                    NodeError::new(node_id, node_name, e.to_string())
                })
                .collect();
            return GraphExecutionResult::failed(errors, elapsed_ms(started));
        }

        let order = match resolver::resolve_execution_order(graph, node_ids) {
            Ok(order) => order,
            Err(GraphError::CycleDetected { unresolved }) => {
                let errors = unresolved
                    .into_iter()
                    .map(|id| {
                        let name = graph
                            .node(&id)
                            .map(|n| n.base().name().to_string())
                            .unwrap_or_else(|| id.clone());
                        NodeError::new(id, name, "node is part of a dependency cycle")
                    })
                    .collect();
                return GraphExecutionResult::failed(errors, elapsed_ms(started));
            }
            Err(other) => {
                return GraphExecutionResult::failed(
                    vec![NodeError::new("", "", other.to_string())],
                    elapsed_ms(started),
                );
            }
        };

        // A fresh run never inherits stale outputs from a previous one
        for id in node_ids {
            if let Some(node) = graph.node_mut(id) {
                node.base_mut().reset();
            }
        }

        let mut result = GraphExecutionResult {
            order: order.clone(),
            ..GraphExecutionResult::empty()
        };
        let total = order.len();

        for (index, node_id) in order.iter().enumerate() {
            if ctx.is_cancelled() {
                log::debug!("run {}: cancelled before node '{}'", ctx.execution_id(), node_id);
                result.cancelled = true;
                break;
            }

            let node_name = graph
                .node(node_id)
                .map(|n| n.base().name().to_string())
                .unwrap_or_else(|| node_id.clone());
            ctx.report_progress(format!(
                "[{}/{}] Executing {}...",
                index + 1,
                total,
                node_name
            ));

            let ready = graph.node(node_id).map(|n| n.can_execute()).unwrap_or(false);
            if !ready {
                let issues = graph
                    .node(node_id)
                    .map(|n| n.validate_configuration().join("; "))
                    .unwrap_or_default();
                let message = if issues.is_empty() {
                    "node skipped: not ready to execute".to_string()
                } else {
                    format!("node skipped: {}", issues)
                };
                log::debug!("run {}: {}", ctx.execution_id(), message);
                result.errors.push(NodeError::new(node_id.clone(), node_name, message));
                result.nodes_skipped += 1;
                result.nodes_failed += 1;
                continue;
            }

            let upstream = graph.collect_input_transfers(node_id);
            let node_result = match graph.node_mut(node_id) {
                Some(node) => node.execute(ctx, upstream).await,
                None => NodeExecutionResult::failure(format!("unknown node '{}'", node_id), 0),
            };

            if node_result.cancelled {
                result.cancelled = true;
                break;
            }
            if node_result.success {
                result.nodes_executed += 1;
            } else {
                let message = node_result
                    .error
                    .unwrap_or_else(|| "execution failed".to_string());
                result
                    .errors
                    .push(NodeError::new(node_id.clone(), node_name, message));
                result.nodes_failed += 1;
                // first failure stops the run
                break;
            }
        }

        result.execution_time_ms = elapsed_ms(started);
        result.success =
            !result.cancelled && result.nodes_failed == 0 && result.nodes_executed > 0;

        log::debug!(
            "run {}: finished success={} executed={} failed={} skipped={} in {}ms",
            ctx.execution_id(),
            result.success,
            result.nodes_executed,
            result.nodes_failed,
            result.nodes_skipped,
            result.execution_time_ms
        );
        result
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::VecProgressSink;
    use crate::test_support::{AddNode, CancelNode, CollectNode, FailingNode, PickyNode, ValueNode};
    use crate::types::ExecutionState;
    use serde_json::json;
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    fn add_pipeline() -> (NodeGraph, NodeId, NodeId, NodeId) {
        let mut graph = NodeGraph::new("g", "G");
        let a = graph.add_node(Box::new(ValueNode::with_value(2.0))).unwrap();
        let b = graph.add_node(Box::new(ValueNode::with_value(3.0))).unwrap();
        let add = graph.add_node(Box::new(AddNode::new())).unwrap();
        graph.connect(&a, "out", &add, "a").unwrap();
        graph.connect(&b, "out", &add, "b").unwrap();
        (graph, a, b, add)
    }

    #[tokio::test]
    async fn test_successful_run() {
        let (mut graph, _, _, add) = add_pipeline();
        let ctx = ExecutionContext::new();

        let result = SequentialExecutor::new().execute(&mut graph, &ctx).await;
        assert!(result.success);
        assert_eq!(result.nodes_executed, 3);
        assert_eq!(result.nodes_failed, 0);
        assert_eq!(
            graph.node(&add).unwrap().base().output("sum").unwrap().value(),
            Some(&json!(5.0))
        );
    }

    #[tokio::test]
    async fn test_progress_messages_reported() {
        let (mut graph, _, _, _) = add_pipeline();
        let sink = Arc::new(VecProgressSink::new());
        let ctx = ExecutionContext::new().with_progress(sink.clone());

        SequentialExecutor::new().execute(&mut graph, &ctx).await;
        let messages = sink.messages();
        assert!(messages.iter().any(|m| m.starts_with("[1/3] Executing ")));
        assert!(messages.iter().any(|m| m.starts_with("[3/3] Executing ")));
    }

    #[tokio::test]
    async fn test_validation_failure_executes_nothing() {
        let mut graph = NodeGraph::new("g", "G");
        let add = graph.add_node(Box::new(AddNode::new())).unwrap();
        let ctx = ExecutionContext::new();

        let result = SequentialExecutor::new().execute(&mut graph, &ctx).await;
        assert!(!result.success);
        assert_eq!(result.nodes_executed, 0);
        assert_eq!(result.errors.len(), 2);
        assert_eq!(graph.node(&add).unwrap().base().state(), ExecutionState::Idle);
    }

    #[tokio::test]
    async fn test_cycle_failure_lists_all_members() {
        let mut graph = NodeGraph::new("g", "G");
        let x = graph.add_node(Box::new(CollectNode::new())).unwrap();
        let y = graph.add_node(Box::new(CollectNode::new())).unwrap();
        graph.connect(&x, "all", &y, "items").unwrap();
        graph.connect(&y, "all", &x, "items").unwrap();
        let ctx = ExecutionContext::new();

        let result = SequentialExecutor::new().execute(&mut graph, &ctx).await;
        assert!(!result.success);
        assert_eq!(result.nodes_executed, 0);
        let ids: Vec<&str> = result.errors.iter().map(|e| e.node_id.as_str()).collect();
        assert_eq!(ids, vec![x.as_str(), y.as_str()]);
    }

    #[tokio::test]
    async fn test_first_failure_stops_run() {
        let mut graph = NodeGraph::new("g", "G");
        let failing = graph.add_node(Box::new(FailingNode::new())).unwrap();
        let collect = graph.add_node(Box::new(CollectNode::new())).unwrap();
        graph.connect(&failing, "out", &collect, "items").unwrap();
        let ctx = ExecutionContext::new();

        let result = SequentialExecutor::new().execute(&mut graph, &ctx).await;
        assert!(!result.success);
        assert_eq!(result.nodes_executed, 0);
        assert_eq!(result.nodes_failed, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].message.contains("deliberate failure"));
        // downstream node never left Idle
        assert_eq!(
            graph.node(&collect).unwrap().base().state(),
            ExecutionState::Idle
        );
    }

    #[tokio::test]
    async fn test_skip_and_continue() {
        // a disabled node scheduled ahead of an independent node
        let mut graph = NodeGraph::new("g", "G");
        let picky = graph.add_node(Box::new(PickyNode::new(false))).unwrap();
        let value = graph.add_node(Box::new(ValueNode::with_value(1.0))).unwrap();
        let ctx = ExecutionContext::new();

        let result = SequentialExecutor::new().execute(&mut graph, &ctx).await;
        assert!(!result.success);
        assert_eq!(result.nodes_skipped, 1);
        assert_eq!(result.nodes_failed, 1);
        // the independent node still ran
        assert_eq!(result.nodes_executed, 1);
        assert_eq!(
            graph.node(&value).unwrap().base().state(),
            ExecutionState::Completed
        );
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].node_id, picky);
        assert!(result.errors[0].message.contains("node skipped"));
        assert!(result.errors[0].message.contains("disabled"));
    }

    #[tokio::test]
    async fn test_cancellation_before_start() {
        let (mut graph, _, _, _) = add_pipeline();
        let token = CancellationToken::new();
        token.cancel();
        let ctx = ExecutionContext::new().with_cancellation(token);

        let result = SequentialExecutor::new().execute(&mut graph, &ctx).await;
        assert!(!result.success);
        assert!(result.cancelled);
        assert_eq!(result.nodes_executed, 0);
        assert_eq!(result.nodes_failed, 0);
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_cancellation_mid_run() {
        let mut graph = NodeGraph::new("g", "G");
        let cancel = graph.add_node(Box::new(CancelNode::new())).unwrap();
        let collect = graph.add_node(Box::new(CollectNode::new())).unwrap();
        graph.connect(&cancel, "out", &collect, "items").unwrap();
        let ctx = ExecutionContext::new();

        let result = SequentialExecutor::new().execute(&mut graph, &ctx).await;
        assert!(result.cancelled);
        assert!(!result.success);
        assert_eq!(
            graph.node(&cancel).unwrap().base().state(),
            ExecutionState::Cancelled
        );
        assert_eq!(
            graph.node(&collect).unwrap().base().state(),
            ExecutionState::Idle
        );
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let (mut graph, _, _, add) = add_pipeline();
        let executor = SequentialExecutor::new();

        let first = executor.execute(&mut graph, &ExecutionContext::new()).await;
        let second = executor.execute(&mut graph, &ExecutionContext::new()).await;

        assert_eq!(first.order, second.order);
        assert_eq!(first.nodes_executed, second.nodes_executed);
        assert!(second.success);
        assert_eq!(
            graph.node(&add).unwrap().base().output("sum").unwrap().value(),
            Some(&json!(5.0))
        );
    }
}
