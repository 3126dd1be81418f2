//! Error types for the graph engine

use thiserror::Error;

/// Result type alias using GraphError
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur in the graph engine
#[derive(Debug, Error)]
pub enum GraphError {
    /// A connection was rejected at creation time
    #[error("Connection rejected: {0}")]
    ConnectionRejected(String),

    /// A property value could not be coerced or validated
    #[error("Invalid value for property '{property}': {message}")]
    InvalidPropertyValue { property: String, message: String },

    /// The dependency resolver found at least one cycle
    #[error("Cycle detected; unresolved nodes: {}", .unresolved.join(", "))]
    CycleDetected { unresolved: Vec<String> },

    /// Node execution failed
    #[error("Node execution failed: {0}")]
    ExecutionFailed(String),

    /// The run was cancelled
    #[error("Execution cancelled")]
    Cancelled,

    /// A node type was requested that is not in the registry
    #[error("Node type '{0}' is not registered")]
    NotRegistered(String),

    /// A registered factory failed to produce a node
    #[error("Failed to construct node of type '{type_name}': {message}")]
    ConstructionFailed { type_name: String, message: String },

    /// A node id did not resolve to a node in the graph
    #[error("Unknown node: {0}")]
    UnknownNode(String),

    /// A pin id did not resolve to a pin on the named node
    #[error("Unknown pin '{pin}' on node '{node}'")]
    UnknownPin { node: String, pin: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GraphError {
    /// Create an execution failed error with a message
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create an invalid-property error with a message
    pub fn invalid_property(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPropertyValue {
            property: property.into(),
            message: message.into(),
        }
    }
}
