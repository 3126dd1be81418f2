//! Registration of built-in node types.

use std::sync::Arc;

use trellis_engine::{NodeDescriptor, NodeRegistry};

use crate::data::{TextFileNode, VariableNode};
use crate::math::ArithmeticNode;
use crate::utility::{DebugPrintNode, ScriptNode, ScriptRuntime};

/// Register every built-in node type that needs no host capability.
pub fn register_builtin_nodes(registry: &mut NodeRegistry) {
    registry.register(VariableNode::descriptor(), || {
        Ok(Box::new(VariableNode::new()))
    });
    registry.register(TextFileNode::descriptor(), || {
        Ok(Box::new(TextFileNode::new()))
    });
    registry.register(ArithmeticNode::descriptor(), || {
        Ok(Box::new(ArithmeticNode::new()))
    });
    registry.register(DebugPrintNode::descriptor(), || {
        Ok(Box::new(DebugPrintNode::new()))
    });
}

/// Register the script node, capturing the host's script runtime in its
/// factory.
pub fn register_script_node(registry: &mut NodeRegistry, runtime: Arc<dyn ScriptRuntime>) {
    registry.register(ScriptNode::descriptor(), move || {
        Ok(Box::new(ScriptNode::new(runtime.clone())))
    });
}
