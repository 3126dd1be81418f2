//! Directed edges between an output pin and an input pin.
//!
//! A `Connection` is a plain record; the graph's `connect` method is the
//! single place one can be created, which is also the single
//! compatibility gate.

use serde::{Deserialize, Serialize};

use crate::types::{ConnectionId, NodeId, PinId};

/// A directed edge from one node's output pin to another node's input pin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Unique identifier for this connection
    pub id: ConnectionId,
    /// Source node ID
    pub source_node: NodeId,
    /// Source (output) pin ID
    pub source_pin: PinId,
    /// Target node ID
    pub target_node: NodeId,
    /// Target (input) pin ID
    pub target_pin: PinId,
}

impl Connection {
    /// Create a connection record with a fresh id
    pub fn new(
        source_node: impl Into<NodeId>,
        source_pin: impl Into<PinId>,
        target_node: impl Into<NodeId>,
        target_pin: impl Into<PinId>,
    ) -> Self {
        Self::with_id(
            format!("conn-{}", uuid::Uuid::new_v4()),
            source_node,
            source_pin,
            target_node,
            target_pin,
        )
    }

    /// Create a connection record with an explicit id
    pub fn with_id(
        id: impl Into<ConnectionId>,
        source_node: impl Into<NodeId>,
        source_pin: impl Into<PinId>,
        target_node: impl Into<NodeId>,
        target_pin: impl Into<PinId>,
    ) -> Self {
        Self {
            id: id.into(),
            source_node: source_node.into(),
            source_pin: source_pin.into(),
            target_node: target_node.into(),
            target_pin: target_pin.into(),
        }
    }

    /// Whether this connection touches the given node
    pub fn touches_node(&self, node_id: &str) -> bool {
        self.source_node == node_id || self.target_node == node_id
    }
}
