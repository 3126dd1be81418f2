//! Core identifier and type-system primitives for node graphs.
//!
//! These types define the vocabulary shared by pins, connections,
//! nodes, and the execution engine.

use serde::{Deserialize, Serialize};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for a pin (unique within its owning node)
pub type PinId = String;

/// Unique identifier for a connection
pub type ConnectionId = String;

/// The semantic kind of data a pin carries.
///
/// The variants form the process-wide registry of well-known types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    /// Accepts any type
    Any,
    /// Text string
    Text,
    /// Whole number
    Integer,
    /// Floating-point number
    Float,
    /// Boolean value
    Boolean,
    /// Path to a file on disk
    FilePath,
    /// Path to a directory on disk
    DirectoryPath,
    /// Opaque tensor handle
    Tensor,
    /// Reference to a loaded model
    ModelHandle,
}

impl DataType {
    /// All well-known data types.
    pub const ALL: [DataType; 9] = [
        DataType::Any,
        DataType::Text,
        DataType::Integer,
        DataType::Float,
        DataType::Boolean,
        DataType::FilePath,
        DataType::DirectoryPath,
        DataType::Tensor,
        DataType::ModelHandle,
    ];

    /// Check if this type can connect to another type.
    ///
    /// Compatible when the variants are identical, either side is `Any`,
    /// or a declared assignability pair holds.
    pub fn is_compatible_with(&self, other: &DataType) -> bool {
        // Any type is compatible with everything
        if matches!(self, DataType::Any) || matches!(other, DataType::Any) {
            return true;
        }

        // Integer and Float are mutually assignable
        if matches!(self, DataType::Integer) && matches!(other, DataType::Float) {
            return true;
        }
        if matches!(self, DataType::Float) && matches!(other, DataType::Integer) {
            return true;
        }

        // A file path is carried as text
        if matches!(self, DataType::FilePath) && matches!(other, DataType::Text) {
            return true;
        }
        if matches!(self, DataType::Text) && matches!(other, DataType::FilePath) {
            return true;
        }

        // Exact type match
        self == other
    }

    /// Human-readable name for this type.
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Any => "any",
            DataType::Text => "text",
            DataType::Integer => "integer",
            DataType::Float => "float",
            DataType::Boolean => "boolean",
            DataType::FilePath => "file_path",
            DataType::DirectoryPath => "directory_path",
            DataType::Tensor => "tensor",
            DataType::ModelHandle => "model_handle",
        }
    }
}

/// Direction of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinDirection {
    /// Receives a value from an upstream connection
    Input,
    /// Produces a value for downstream connections
    Output,
}

/// Execution lifecycle state of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    /// Not yet executed (or reset)
    #[default]
    Idle,
    /// Currently executing
    Executing,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Error,
    /// Interrupted by cancellation
    Cancelled,
}

impl ExecutionState {
    /// Whether this state is terminal (a finished run, good or bad).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Completed | ExecutionState::Error | ExecutionState::Cancelled
        )
    }
}

/// Category of a node, used for palette grouping and discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Data sources and sinks (variables, file loaders, etc.)
    Data,
    /// Model-related nodes (loaders, wrappers)
    Model,
    /// Math and transformation nodes
    Math,
    /// Utility nodes (debug output, scripting, etc.)
    Utility,
}
