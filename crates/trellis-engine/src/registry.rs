//! Node type registry.
//!
//! An explicit table mapping a type name to discovery metadata plus a
//! factory closure. Factories capture whatever dependencies their node
//! type needs; the engine only ever asks for "a node instance by type
//! name" and "the list of known types".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};
use crate::node::Node;
use crate::types::NodeCategory;

/// Discovery metadata for a registered node type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeTypeInfo {
    /// Unique type identifier (e.g. "arithmetic")
    pub type_name: String,
    /// Category for palette grouping
    pub category: NodeCategory,
    /// Human-readable label
    pub label: String,
    /// Description of what the node does
    pub description: String,
}

impl NodeTypeInfo {
    pub fn new(
        type_name: impl Into<String>,
        category: NodeCategory,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            category,
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Trait for node types that can describe themselves.
///
/// A single source of truth: the node implementation defines both its
/// behavior and its discovery metadata.
pub trait NodeDescriptor {
    /// Get the static metadata for this node type
    fn descriptor() -> NodeTypeInfo
    where
        Self: Sized;
}

type NodeFactory = Box<dyn Fn() -> Result<Box<dyn Node>> + Send + Sync>;

struct RegistryEntry {
    info: NodeTypeInfo,
    factory: NodeFactory,
}

/// Registry of constructible node types
pub struct NodeRegistry {
    entries: HashMap<String, RegistryEntry>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a node type with its metadata and factory.
    ///
    /// Re-registering a type name replaces the previous entry.
    pub fn register<F>(&mut self, info: NodeTypeInfo, factory: F)
    where
        F: Fn() -> Result<Box<dyn Node>> + Send + Sync + 'static,
    {
        self.entries.insert(
            info.type_name.clone(),
            RegistryEntry {
                info,
                factory: Box::new(factory),
            },
        );
    }

    /// Construct a node instance by type name
    pub fn create(&self, type_name: &str) -> Result<Box<dyn Node>> {
        let entry = self
            .entries
            .get(type_name)
            .ok_or_else(|| GraphError::NotRegistered(type_name.to_string()))?;
        (entry.factory)().map_err(|e| GraphError::ConstructionFailed {
            type_name: type_name.to_string(),
            message: e.to_string(),
        })
    }

    /// Check if a node type is registered
    pub fn has_type(&self, type_name: &str) -> bool {
        self.entries.contains_key(type_name)
    }

    /// Get metadata for a node type
    pub fn info(&self, type_name: &str) -> Option<&NodeTypeInfo> {
        self.entries.get(type_name).map(|e| &e.info)
    }

    /// Get all registered metadata
    pub fn all_info(&self) -> Vec<&NodeTypeInfo> {
        self.entries.values().map(|e| &e.info).collect()
    }

    /// Get metadata grouped by category
    pub fn info_by_category(&self) -> HashMap<NodeCategory, Vec<&NodeTypeInfo>> {
        let mut grouped: HashMap<NodeCategory, Vec<&NodeTypeInfo>> = HashMap::new();
        for entry in self.entries.values() {
            grouped.entry(entry.info.category).or_default().push(&entry.info);
        }
        grouped
    }

    /// List all registered type names
    pub fn type_names(&self) -> Vec<&str> {
        self.entries.keys().map(|s| s.as_str()).collect()
    }

    /// Merge another registry into this one.
    ///
    /// Entries from `other` override entries in `self` on a shared name.
    pub fn merge(&mut self, other: NodeRegistry) {
        self.entries.extend(other.entries);
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
