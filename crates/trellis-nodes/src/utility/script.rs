//! Script node
//!
//! Runs a configured piece of code through an injected [`ScriptRuntime`].
//! The runtime is an opaque capability: the node neither knows nor
//! cares what language or interpreter sits behind it.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use trellis_engine::{
    DataType, ExecutionContext, GraphError, Node, NodeBase, NodeCategory, NodeDescriptor,
    NodeTypeInfo, Pin, Property, PropertyKind, Result,
};

/// Opaque asynchronous "execute code, get text output or error"
/// capability supplied by the host.
#[async_trait]
pub trait ScriptRuntime: Send + Sync {
    /// Run a piece of code, returning its text output or a text error.
    async fn run(&self, code: &str) -> std::result::Result<String, String>;
}

/// Executes configured code through the host's script runtime.
pub struct ScriptNode {
    base: NodeBase,
    runtime: Arc<dyn ScriptRuntime>,
}

impl ScriptNode {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "script";
    /// Property ID for the code to run
    pub const PROP_CODE: &'static str = "code";
    /// Port ID for the text output
    pub const PIN_OUTPUT: &'static str = "output";

    pub fn new(runtime: Arc<dyn ScriptRuntime>) -> Self {
        let base = NodeBase::new("Script", NodeCategory::Utility)
            .with_description("Runs code through the host script runtime")
            .with_outputs(vec![Pin::output(Self::PIN_OUTPUT, "Output", DataType::Text)])
            .with_properties(vec![Property::new(
                Self::PROP_CODE,
                "Code",
                PropertyKind::Text,
                Value::Null,
            )
            .required()]);
        Self { base, runtime }
    }

    fn code(&self) -> Option<String> {
        self.base
            .property(Self::PROP_CODE)
            .and_then(|p| p.value().as_str().map(|s| s.to_string()))
            .filter(|c| !c.is_empty())
    }
}

impl NodeDescriptor for ScriptNode {
    fn descriptor() -> NodeTypeInfo {
        NodeTypeInfo::new(
            Self::TYPE_NAME,
            NodeCategory::Utility,
            "Script",
            "Runs code through the host script runtime",
        )
    }
}

#[async_trait]
impl Node for ScriptNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn can_execute(&self) -> bool {
        self.code().is_some()
    }

    async fn compute(&mut self, ctx: &ExecutionContext) -> Result<HashMap<String, Value>> {
        let code = self
            .code()
            .ok_or_else(|| GraphError::failed("no code configured"))?;

        ctx.check_cancelled()?;

        let output = self
            .runtime
            .run(&code)
            .await
            .map_err(|e| GraphError::failed(format!("script error: {}", e)))?;

        let mut outputs = HashMap::new();
        outputs.insert(Self::PIN_OUTPUT.to_string(), json!(output));
        Ok(outputs)
    }
}
