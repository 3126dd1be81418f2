//! Built-in node implementations for the Trellis graph engine.
//!
//! Nodes are grouped by category:
//!
//! - `data`: value sources (variables, file readers)
//! - `math`: arithmetic and transformation
//! - `utility`: debug output and scripting
//!
//! `setup::register_builtin_nodes` registers everything that has no
//! external dependency; nodes that need a host capability (like the
//! script node) have their own registration functions taking that
//! capability.

pub mod data;
pub mod math;
pub mod setup;
pub mod utility;

pub use data::{TextFileNode, VariableNode};
pub use math::ArithmeticNode;
pub use setup::{register_builtin_nodes, register_script_node};
pub use utility::{DebugPrintNode, ScriptNode, ScriptRuntime};
