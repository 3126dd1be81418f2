//! The live node/connection aggregate.
//!
//! `NodeGraph` exclusively owns its nodes (and through them their pins
//! and properties) and holds the connection records joining them.
//! `connect` is the single compatibility gate: there is no other way to
//! create an edge, so no edge can violate the connection rules.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::connection::Connection;
use crate::error::{GraphError, Result};
use crate::node::Node;
use crate::types::{ConnectionId, NodeId, PinId};

/// A named, timestamped collection of live nodes and connections
pub struct NodeGraph {
    id: String,
    name: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
    metadata: HashMap<String, Value>,
    nodes: Vec<Box<dyn Node>>,
    connections: Vec<Connection>,
}

impl NodeGraph {
    /// Create a new empty graph
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            name: name.into(),
            created_at: now,
            modified_at: now,
            metadata: HashMap::new(),
            nodes: Vec::new(),
            connections: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    pub(crate) fn set_timestamps(&mut self, created_at: DateTime<Utc>, modified_at: DateTime<Utc>) {
        self.created_at = created_at;
        self.modified_at = modified_at;
    }

    /// Free-form metadata attached to this graph
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut HashMap<String, Value> {
        self.modified_at = Utc::now();
        &mut self.metadata
    }

    fn touch(&mut self) {
        self.modified_at = Utc::now();
    }

    /// Number of nodes in the graph
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node ids in insertion order
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.base().id().to_string()).collect()
    }

    /// Iterate all nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &dyn Node> {
        self.nodes.iter().map(|b| b.as_ref())
    }

    /// Find a node by ID
    pub fn node(&self, node_id: &str) -> Option<&dyn Node> {
        self.nodes
            .iter()
            .find(|n| n.base().id() == node_id)
            .map(|b| b.as_ref())
    }

    /// Find a node by ID (mutable)
    pub fn node_mut(&mut self, node_id: &str) -> Option<&mut (dyn Node + 'static)> {
        self.nodes
            .iter_mut()
            .find(|n| n.base().id() == node_id)
            .map(|b| b.as_mut())
    }

    /// Add a node, taking ownership. The node id must be unique.
    pub fn add_node(&mut self, node: Box<dyn Node>) -> Result<NodeId> {
        let id = node.base().id().to_string();
        if self.node(&id).is_some() {
            return Err(GraphError::failed(format!(
                "a node with id '{}' already exists in graph '{}'",
                id, self.id
            )));
        }
        log::debug!("graph '{}': adding node '{}' ({})", self.id, id, node.type_name());
        self.nodes.push(node);
        self.touch();
        Ok(id)
    }

    /// Remove a node, first disconnecting every connection touching any
    /// of its pins. Returns the node so callers can keep or drop it.
    pub fn remove_node(&mut self, node_id: &str) -> Result<Box<dyn Node>> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.base().id() == node_id)
            .ok_or_else(|| GraphError::UnknownNode(node_id.to_string()))?;

        let touching: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|c| c.touches_node(node_id))
            .map(|c| c.id.clone())
            .collect();
        for conn_id in touching {
            self.disconnect(&conn_id);
        }

        let node = self.nodes.remove(index);
        self.touch();
        Ok(node)
    }

    /// All connection records
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Find a connection by ID
    pub fn connection(&self, connection_id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == connection_id)
    }

    /// Connections entering the given node
    pub fn incoming_connections<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.target_node == node_id)
    }

    /// Connections leaving the given node
    pub fn outgoing_connections<'a>(
        &'a self,
        node_id: &'a str,
    ) -> impl Iterator<Item = &'a Connection> + 'a {
        self.connections.iter().filter(move |c| c.source_node == node_id)
    }

    /// Whether a connection between the given pins would be accepted.
    ///
    /// The non-throwing counterpart to `connect`.
    pub fn can_connect(
        &self,
        source_node: &str,
        source_pin: &str,
        target_node: &str,
        target_pin: &str,
    ) -> bool {
        self.connection_rejection(source_node, source_pin, target_node, target_pin)
            .is_none()
    }

    fn connection_rejection(
        &self,
        source_node: &str,
        source_pin: &str,
        target_node: &str,
        target_pin: &str,
    ) -> Option<String> {
        let src_node = match self.node(source_node) {
            Some(n) => n,
            None => return Some(format!("unknown node '{}'", source_node)),
        };
        let dst_node = match self.node(target_node) {
            Some(n) => n,
            None => return Some(format!("unknown node '{}'", target_node)),
        };
        let src = match src_node.base().pin(source_pin) {
            Some(p) => p,
            None => return Some(format!("unknown pin '{}' on node '{}'", source_pin, source_node)),
        };
        let dst = match dst_node.base().pin(target_pin) {
            Some(p) => p,
            None => return Some(format!("unknown pin '{}' on node '{}'", target_pin, target_node)),
        };
        if !src.is_output() {
            return Some(format!("pin '{}' is not an output", source_pin));
        }
        if !dst.is_input() {
            return Some(format!("pin '{}' is not an input", target_pin));
        }
        src.connection_rejection(dst)
    }

    /// Create a connection from an output pin to an input pin.
    ///
    /// This is the single compatibility gate; it fails with
    /// `ConnectionRejected` when the pins cannot be joined and registers
    /// the connection with both pins on success.
    pub fn connect(
        &mut self,
        source_node: &str,
        source_pin: &str,
        target_node: &str,
        target_pin: &str,
    ) -> Result<ConnectionId> {
        self.connect_with_id(
            format!("conn-{}", uuid::Uuid::new_v4()),
            source_node,
            source_pin,
            target_node,
            target_pin,
        )
    }

    /// Create a connection with an explicit id (used when restoring a
    /// persisted graph).
    pub fn connect_with_id(
        &mut self,
        connection_id: impl Into<ConnectionId>,
        source_node: &str,
        source_pin: &str,
        target_node: &str,
        target_pin: &str,
    ) -> Result<ConnectionId> {
        if let Some(reason) =
            self.connection_rejection(source_node, source_pin, target_node, target_pin)
        {
            return Err(GraphError::ConnectionRejected(reason));
        }

        let connection = Connection::with_id(
            connection_id,
            source_node,
            source_pin,
            target_node,
            target_pin,
        );
        let id = connection.id.clone();

        if let Some(pin) = self
            .node_mut(source_node)
            .and_then(|n| n.base_mut().pin_mut(source_pin))
        {
            pin.register_connection(id.clone());
        }
        if let Some(pin) = self
            .node_mut(target_node)
            .and_then(|n| n.base_mut().pin_mut(target_pin))
        {
            pin.register_connection(id.clone());
        }

        log::debug!(
            "graph '{}': connected {}:{} -> {}:{}",
            self.id,
            source_node,
            source_pin,
            target_node,
            target_pin
        );
        self.connections.push(connection);
        self.touch();
        Ok(id)
    }

    /// Remove a connection from the graph and from both pins.
    ///
    /// Idempotent: removing an unknown id is a no-op. Returns whether a
    /// connection was removed.
    pub fn disconnect(&mut self, connection_id: &str) -> bool {
        let index = match self.connections.iter().position(|c| c.id == connection_id) {
            Some(i) => i,
            None => return false,
        };
        let conn = self.connections.remove(index);

        if let Some(pin) = self
            .node_mut(&conn.source_node)
            .and_then(|n| n.base_mut().pin_mut(&conn.source_pin))
        {
            pin.unregister_connection(&conn.id);
        }
        if let Some(pin) = self
            .node_mut(&conn.target_node)
            .and_then(|n| n.base_mut().pin_mut(&conn.target_pin))
        {
            pin.unregister_connection(&conn.id);
        }
        self.touch();
        true
    }

    /// Copy the source pin's current value onto the target pin.
    ///
    /// Overwrite, not merge: an empty source clears the target. No
    /// cascading; moving values further downstream is the engine's job.
    pub fn transfer_data(&mut self, connection_id: &str) -> Result<()> {
        let conn = self
            .connection(connection_id)
            .cloned()
            .ok_or_else(|| GraphError::failed(format!("unknown connection '{}'", connection_id)))?;

        let value = self
            .node(&conn.source_node)
            .and_then(|n| n.base().pin(&conn.source_pin))
            .and_then(|p| p.value().cloned());

        let target = self
            .node_mut(&conn.target_node)
            .and_then(|n| n.base_mut().pin_mut(&conn.target_pin))
            .ok_or_else(|| GraphError::UnknownPin {
                node: conn.target_node.clone(),
                pin: conn.target_pin.clone(),
            })?;

        match value {
            Some(v) => target.set_value(v),
            None => target.clear_value(),
        }
        Ok(())
    }

    /// Gather the values this node's connected input pins would receive.
    ///
    /// A single-connection input yields the upstream value as-is; a
    /// multi-connection input aggregates every available upstream value
    /// into an array in connection order. Pins with no upstream value
    /// are omitted.
    pub fn collect_input_transfers(&self, node_id: &str) -> Vec<(PinId, Value)> {
        let node = match self.node(node_id) {
            Some(n) => n,
            None => return Vec::new(),
        };

        let mut transfers = Vec::new();
        for pin in node.base().inputs() {
            if !pin.is_connected() {
                continue;
            }
            let mut values: Vec<Value> = Vec::new();
            for conn in self
                .connections
                .iter()
                .filter(|c| c.target_node == node_id && c.target_pin == pin.id())
            {
                let value = self
                    .node(&conn.source_node)
                    .and_then(|n| n.base().pin(&conn.source_pin))
                    .and_then(|p| p.value().cloned());
                if let Some(v) = value {
                    values.push(v);
                }
            }
            if values.is_empty() {
                continue;
            }
            if pin.allows_multiple() {
                transfers.push((pin.id().to_string(), Value::Array(values)));
            } else {
                transfers.push((pin.id().to_string(), values.remove(0)));
            }
        }
        transfers
    }

    /// Reset every node to `Idle`, clearing errors and output values
    pub fn reset_all(&mut self) {
        for node in &mut self.nodes {
            node.base_mut().reset();
        }
    }
}
