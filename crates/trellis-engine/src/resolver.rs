//! Dependency validation and topological execution ordering.
//!
//! Resolution orders an arbitrary working set of nodes so that every
//! node appears after all in-set nodes feeding one of its inputs.
//! Connections whose source lies outside the set are not counted as
//! dependencies; `validate_dependencies` is the separate, explicit
//! pass that catches those, so the engine cannot silently treat a
//! partial graph as runnable.

use std::collections::{HashMap, HashSet, VecDeque};

use thiserror::Error;

use crate::error::{GraphError, Result};
use crate::graph::NodeGraph;
use crate::node::Node;
use crate::types::NodeId;

/// A problem found while validating a working set before resolution
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DependencyError {
    /// A required input pin is unconnected and holds no value
    #[error("required input '{pin_id}' on node '{node_name}' is not connected and has no value")]
    MissingRequiredInput {
        node_id: String,
        node_name: String,
        pin_id: String,
    },

    /// An input connection's source node is not part of the working set
    #[error("node '{node_name}' depends on '{source_name}', which is not in the execution set")]
    MissingDependency {
        node_id: String,
        node_name: String,
        source_name: String,
    },

    /// A working-set id did not resolve to a node in the graph
    #[error("unknown node '{node_id}' in execution set")]
    UnknownNode { node_id: String },
}

impl DependencyError {
    /// The id of the node the error is about
    pub fn node_id(&self) -> &str {
        match self {
            DependencyError::MissingRequiredInput { node_id, .. } => node_id,
            DependencyError::MissingDependency { node_id, .. } => node_id,
            DependencyError::UnknownNode { node_id } => node_id,
        }
    }
}

/// Validate a working set before resolution.
///
/// Returns all problems found (not just the first): required inputs
/// that are neither connected nor pre-populated, and input connections
/// whose source node lies outside the set.
pub fn validate_dependencies(graph: &NodeGraph, node_ids: &[NodeId]) -> Vec<DependencyError> {
    let set: HashSet<&str> = node_ids.iter().map(|s| s.as_str()).collect();
    let mut errors = Vec::new();

    for node_id in node_ids {
        let node = match graph.node(node_id) {
            Some(n) => n,
            None => {
                errors.push(DependencyError::UnknownNode {
                    node_id: node_id.clone(),
                });
                continue;
            }
        };
        let node_name = node.base().name().to_string();

        for pin in node.base().inputs() {
            if pin.is_required() && !pin.is_connected() && pin.value().is_none() {
                errors.push(DependencyError::MissingRequiredInput {
                    node_id: node_id.clone(),
                    node_name: node_name.clone(),
                    pin_id: pin.id().to_string(),
                });
            }
        }

        for conn in graph.incoming_connections(node_id) {
            if !set.contains(conn.source_node.as_str()) {
                let source_name = graph
                    .node(&conn.source_node)
                    .map(|n| n.base().name().to_string())
                    .unwrap_or_else(|| conn.source_node.clone());
                errors.push(DependencyError::MissingDependency {
                    node_id: node_id.clone(),
                    node_name: node_name.clone(),
                    source_name,
                });
            }
        }
    }

    errors
}

/// Produce a topological execution order over the working set.
///
/// Kahn's algorithm; ties are broken by the set's input order so runs
/// are reproducible. On a cycle, fails with the full unresolved
/// remainder: every node that never reached in-degree zero, not just
/// one cycle member.
pub fn resolve_execution_order(graph: &NodeGraph, node_ids: &[NodeId]) -> Result<Vec<NodeId>> {
    let set: HashSet<&str> = node_ids.iter().map(|s| s.as_str()).collect();

    // Distinct in-set upstream ids per node
    let mut dependencies: HashMap<&str, HashSet<&str>> = node_ids
        .iter()
        .map(|id| (id.as_str(), HashSet::new()))
        .collect();
    for conn in graph.connections() {
        let source = conn.source_node.as_str();
        let target = conn.target_node.as_str();
        if source != target && set.contains(source) && set.contains(target) {
            if let Some(deps) = dependencies.get_mut(target) {
                deps.insert(source);
            }
        }
    }

    let mut in_degree: HashMap<&str, usize> = dependencies
        .iter()
        .map(|(id, deps)| (*id, deps.len()))
        .collect();

    // Downstream adjacency, built in input order for determinism
    let mut downstream: HashMap<&str, Vec<&str>> = HashMap::new();
    for node_id in node_ids {
        for dep in &dependencies[node_id.as_str()] {
            downstream.entry(*dep).or_default().push(node_id.as_str());
        }
    }

    let mut queue: VecDeque<&str> = node_ids
        .iter()
        .map(|id| id.as_str())
        .filter(|id| in_degree[id] == 0)
        .collect();

    let mut order: Vec<NodeId> = Vec::with_capacity(node_ids.len());
    while let Some(node_id) = queue.pop_front() {
        order.push(node_id.to_string());
        if let Some(targets) = downstream.get(node_id) {
            for target in targets {
                if let Some(degree) = in_degree.get_mut(target) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(*target);
                    }
                }
            }
        }
    }

    if order.len() < node_ids.len() {
        let resolved: HashSet<&str> = order.iter().map(|s| s.as_str()).collect();
        let unresolved: Vec<String> = node_ids
            .iter()
            .filter(|id| !resolved.contains(id.as_str()))
            .cloned()
            .collect();
        return Err(GraphError::CycleDetected { unresolved });
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::test_support::{AddNode, CollectNode, ValueNode};
    use serde_json::json;

    fn diamond() -> (NodeGraph, Vec<NodeId>) {
        // a --> add.a
        // b --> add.b,  add.sum --> collect.items
        let mut graph = NodeGraph::new("g", "G");
        let a = graph.add_node(Box::new(ValueNode::with_value(1.0))).unwrap();
        let b = graph.add_node(Box::new(ValueNode::with_value(2.0))).unwrap();
        let add = graph.add_node(Box::new(AddNode::new())).unwrap();
        let collect = graph.add_node(Box::new(CollectNode::new())).unwrap();
        graph.connect(&a, "out", &add, "a").unwrap();
        graph.connect(&b, "out", &add, "b").unwrap();
        graph.connect(&add, "sum", &collect, "items").unwrap();
        (graph, vec![a, b, add, collect])
    }

    fn index_of(order: &[NodeId], id: &str) -> usize {
        order.iter().position(|n| n == id).unwrap()
    }

    #[test]
    fn test_order_respects_dependencies() {
        let (graph, ids) = diamond();
        let order = resolve_execution_order(&graph, &ids).unwrap();

        assert_eq!(order.len(), 4);
        assert!(index_of(&order, &ids[0]) < index_of(&order, &ids[2]));
        assert!(index_of(&order, &ids[1]) < index_of(&order, &ids[2]));
        assert!(index_of(&order, &ids[2]) < index_of(&order, &ids[3]));
    }

    #[test]
    fn test_order_is_deterministic() {
        let (graph, ids) = diamond();
        let first = resolve_execution_order(&graph, &ids).unwrap();
        for _ in 0..10 {
            assert_eq!(resolve_execution_order(&graph, &ids).unwrap(), first);
        }
    }

    #[test]
    fn test_seed_ties_broken_by_input_order() {
        let mut graph = NodeGraph::new("g", "G");
        let a = graph.add_node(Box::new(ValueNode::with_value(1.0))).unwrap();
        let b = graph.add_node(Box::new(ValueNode::with_value(2.0))).unwrap();
        let c = graph.add_node(Box::new(ValueNode::with_value(3.0))).unwrap();

        let ids = vec![c.clone(), a.clone(), b.clone()];
        let order = resolve_execution_order(&graph, &ids).unwrap();
        assert_eq!(order, ids);
    }

    #[test]
    fn test_out_of_set_sources_are_not_dependencies() {
        let (graph, ids) = diamond();
        // resolve only {add, collect}: a and b are outside the set
        let subset = vec![ids[2].clone(), ids[3].clone()];
        let order = resolve_execution_order(&graph, &subset).unwrap();
        assert_eq!(order, subset);
    }

    #[test]
    fn test_validation_catches_out_of_set_sources() {
        let (graph, ids) = diamond();
        let subset = vec![ids[2].clone(), ids[3].clone()];
        let errors = validate_dependencies(&graph, &subset);

        let missing: Vec<_> = errors
            .iter()
            .filter(|e| matches!(e, DependencyError::MissingDependency { .. }))
            .collect();
        assert_eq!(missing.len(), 2);
        assert!(missing.iter().all(|e| e.node_id() == ids[2]));
    }

    #[test]
    fn test_validation_catches_unconnected_required_input() {
        let mut graph = NodeGraph::new("g", "G");
        let add = graph.add_node(Box::new(AddNode::new())).unwrap();
        let errors = validate_dependencies(&graph, &[add.clone()]);
        assert_eq!(errors.len(), 2); // both 'a' and 'b'
        assert!(errors
            .iter()
            .all(|e| matches!(e, DependencyError::MissingRequiredInput { .. })));

        // a standalone value satisfies the check without a connection
        graph
            .node_mut(&add)
            .unwrap()
            .base_mut()
            .input_mut("a")
            .unwrap()
            .set_value(json!(1.0));
        let errors = validate_dependencies(&graph, &[add]);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_cycle_reports_full_remainder() {
        // a feeds the cycle head; x -> y -> z -> x
        let mut graph = NodeGraph::new("g", "G");
        let a = graph.add_node(Box::new(ValueNode::with_value(1.0))).unwrap();
        let x = graph.add_node(Box::new(CollectNode::new())).unwrap();
        let y = graph.add_node(Box::new(CollectNode::new())).unwrap();
        let z = graph.add_node(Box::new(CollectNode::new())).unwrap();
        graph.connect(&a, "out", &x, "items").unwrap();
        graph.connect(&x, "all", &y, "items").unwrap();
        graph.connect(&y, "all", &z, "items").unwrap();
        graph.connect(&z, "all", &x, "items").unwrap();

        let ids = vec![a.clone(), x.clone(), y.clone(), z.clone()];
        let err = resolve_execution_order(&graph, &ids).unwrap_err();
        match err {
            GraphError::CycleDetected { unresolved } => {
                assert_eq!(unresolved, vec![x, y, z]);
            }
            other => panic!("expected CycleDetected, got {:?}", other),
        }
    }

    #[test]
    fn test_parallel_edges_count_once() {
        let mut graph = NodeGraph::new("g", "G");
        let a = graph.add_node(Box::new(ValueNode::with_value(1.0))).unwrap();
        let collect = graph.add_node(Box::new(CollectNode::new())).unwrap();
        graph.connect(&a, "out", &collect, "items").unwrap();
        graph.connect(&a, "out", &collect, "items").unwrap();

        let ids = vec![a.clone(), collect.clone()];
        let order = resolve_execution_order(&graph, &ids).unwrap();
        assert_eq!(order, vec![a, collect]);
    }
}
