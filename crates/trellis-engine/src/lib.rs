//! Trellis Engine - typed node graph execution
//!
//! This crate provides the core of Trellis: a directed graph of typed
//! computation units ("nodes") connected by typed data ports ("pins"),
//! executed end-to-end with correct ordering, partial-failure
//! containment, and progress/cancellation reporting.
//!
//! # Architecture
//!
//! - `NodeGraph`: the live aggregate owning nodes and connections; its
//!   `connect` method is the single compatibility gate
//! - `resolver`: dependency validation and topological ordering
//!   (Kahn's algorithm with deterministic tie-breaking)
//! - `SequentialExecutor`: drives a resolved order one node at a time,
//!   skipping unschedulable nodes and stopping on the first failure
//! - `NodeRegistry`: explicit table mapping type names to factory
//!   closures
//! - `GraphDocument`: the serializable projection used at the
//!   persistence boundary
//!
//! # Example
//!
//! ```ignore
//! use trellis_engine::{ExecutionContext, NodeGraph, SequentialExecutor};
//!
//! let mut graph = NodeGraph::new("demo", "Demo");
//! let source = graph.add_node(registry.create("variable")?)?;
//! let sink = graph.add_node(registry.create("debug-print")?)?;
//! graph.connect(&source, "value", &sink, "value")?;
//!
//! let result = SequentialExecutor::new()
//!     .execute(&mut graph, &ExecutionContext::new())
//!     .await;
//! assert!(result.success);
//! ```

pub mod connection;
pub mod context;
pub mod document;
pub mod error;
pub mod executor;
pub mod graph;
pub mod node;
pub mod pin;
pub mod property;
pub mod registry;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export key types
pub use connection::Connection;
pub use context::{ExecutionContext, LogProgressSink, NullProgressSink, ProgressSink, VecProgressSink};
pub use document::{snapshot, restore, GraphDocument, DOCUMENT_VERSION};
pub use error::{GraphError, Result};
pub use executor::{GraphExecutionResult, NodeError, SequentialExecutor};
pub use graph::NodeGraph;
pub use node::{Node, NodeBase, NodeExecutionResult};
pub use pin::{Pin, PinObserver};
pub use property::{Property, PropertyKind, PropertyObserver};
pub use registry::{NodeDescriptor, NodeRegistry, NodeTypeInfo};
pub use resolver::{resolve_execution_order, validate_dependencies, DependencyError};
pub use types::{
    ConnectionId, DataType, ExecutionState, NodeCategory, NodeId, PinDirection, PinId,
};

// Re-export the cancellation token type consumers need
pub use tokio_util::sync::CancellationToken;
