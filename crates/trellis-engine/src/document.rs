//! Serializable projection of a live graph.
//!
//! A `GraphDocument` is the persistence boundary: a named, versioned
//! document of node records (type name, display fields, position, a
//! property-value map) and connection records. Restoring goes back
//! through the registry and the validating connection gate, so a
//! round-trip reproduces an executable-equivalent graph.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::graph::NodeGraph;
use crate::node::Node;
use crate::registry::NodeRegistry;
use crate::types::{ConnectionId, NodeId, PinId};

/// Current document format version
pub const DOCUMENT_VERSION: &str = "1";

/// A serialized node
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Node instance id
    pub id: NodeId,
    /// Registered type name used to reconstruct the node
    pub node_type: String,
    /// Display name
    pub name: String,
    /// Display description
    #[serde(default)]
    pub description: String,
    /// Layout position (irrelevant to execution)
    pub position: (f64, f64),
    /// Property values keyed by property id
    #[serde(default)]
    pub properties: HashMap<String, Value>,
}

/// A serialized connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRecord {
    pub id: ConnectionId,
    pub source_node: NodeId,
    pub source_pin: PinId,
    pub target_node: NodeId,
    pub target_pin: PinId,
}

/// A complete serialized graph
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub id: String,
    pub name: String,
    /// Document format version
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub nodes: Vec<NodeRecord>,
    pub connections: Vec<ConnectionRecord>,
}

impl GraphDocument {
    /// Serialize to pretty-printed JSON
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json_string(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Capture the serializable projection of a live graph
pub fn snapshot(graph: &NodeGraph) -> GraphDocument {
    GraphDocument {
        id: graph.id().to_string(),
        name: graph.name().to_string(),
        version: DOCUMENT_VERSION.to_string(),
        created_at: graph.created_at(),
        modified_at: graph.modified_at(),
        metadata: graph.metadata().clone(),
        nodes: graph
            .nodes()
            .map(|node| NodeRecord {
                id: node.base().id().to_string(),
                node_type: node.type_name().to_string(),
                name: node.base().name().to_string(),
                description: node.base().description().to_string(),
                position: node.base().position(),
                properties: node.serialize_properties(),
            })
            .collect(),
        connections: graph
            .connections()
            .iter()
            .map(|conn| ConnectionRecord {
                id: conn.id.clone(),
                source_node: conn.source_node.clone(),
                source_pin: conn.source_pin.clone(),
                target_node: conn.target_node.clone(),
                target_pin: conn.target_pin.clone(),
            })
            .collect(),
    }
}

/// Rebuild a live graph from a document.
///
/// Nodes are constructed through the registry by type name, then their
/// ids, display fields, positions, and properties are restored (property
/// application re-runs change hooks, so retyped pins come back
/// identical). Connections are rewired through the validating gate.
pub fn restore(doc: &GraphDocument, registry: &NodeRegistry) -> Result<NodeGraph> {
    let mut graph = NodeGraph::new(doc.id.clone(), doc.name.clone());
    *graph.metadata_mut() = doc.metadata.clone();

    for record in &doc.nodes {
        let mut node = registry.create(&record.node_type)?;
        node.base_mut().set_id(record.id.clone());
        node.base_mut().set_name(record.name.clone());
        node.base_mut().set_description(record.description.clone());
        node.base_mut().set_position(record.position);
        node.deserialize_properties(&record.properties)?;
        graph.add_node(node)?;
    }

    for record in &doc.connections {
        graph.connect_with_id(
            record.id.clone(),
            &record.source_node,
            &record.source_pin,
            &record.target_node,
            &record.target_pin,
        )?;
    }

    graph.set_timestamps(doc.created_at, doc.modified_at);
    Ok(graph)
}
