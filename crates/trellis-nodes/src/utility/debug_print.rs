//! Debug print node

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use trellis_engine::{
    DataType, ExecutionContext, Node, NodeBase, NodeCategory, NodeDescriptor, NodeTypeInfo, Pin,
    Property, PropertyKind, Result,
};

/// Logs whatever arrives on its input and republishes the rendered text.
pub struct DebugPrintNode {
    base: NodeBase,
}

impl DebugPrintNode {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "debug-print";
    /// Port ID for the value input
    pub const PIN_VALUE: &'static str = "value";
    /// Port ID for the rendered text output
    pub const PIN_TEXT: &'static str = "text";
    /// Property ID for the optional message label
    pub const PROP_LABEL: &'static str = "label";

    pub fn new() -> Self {
        let base = NodeBase::new("Debug Print", NodeCategory::Utility)
            .with_description("Logs its input value")
            .with_inputs(vec![Pin::input(Self::PIN_VALUE, "Value", DataType::Any)])
            .with_outputs(vec![Pin::output(Self::PIN_TEXT, "Text", DataType::Text)])
            .with_properties(vec![Property::new(
                Self::PROP_LABEL,
                "Label",
                PropertyKind::Text,
                json!(""),
            )]);
        Self { base }
    }
}

impl Default for DebugPrintNode {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeDescriptor for DebugPrintNode {
    fn descriptor() -> NodeTypeInfo {
        NodeTypeInfo::new(
            Self::TYPE_NAME,
            NodeCategory::Utility,
            "Debug Print",
            "Logs its input value",
        )
    }
}

#[async_trait]
impl Node for DebugPrintNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    async fn compute(&mut self, _ctx: &ExecutionContext) -> Result<HashMap<String, Value>> {
        let value = self
            .base
            .input(Self::PIN_VALUE)
            .and_then(|p| p.value())
            .cloned()
            .unwrap_or(Value::Null);
        let rendered = match &value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };

        let label = self
            .base
            .property(Self::PROP_LABEL)
            .and_then(|p| p.value().as_str().map(|s| s.to_string()))
            .unwrap_or_default();
        if label.is_empty() {
            log::info!("{}", rendered);
        } else {
            log::info!("{}: {}", label, rendered);
        }

        let mut outputs = HashMap::new();
        outputs.insert(Self::PIN_TEXT.to_string(), json!(rendered));
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_renders_number() {
        let mut node = DebugPrintNode::new();
        let result = node
            .execute(
                &ExecutionContext::new(),
                vec![("value".to_string(), json!(15.7))],
            )
            .await;
        assert!(result.success);
        assert_eq!(result.data["text"], json!("15.7"));
    }

    #[tokio::test]
    async fn test_renders_string_unquoted() {
        let mut node = DebugPrintNode::new();
        let result = node
            .execute(
                &ExecutionContext::new(),
                vec![("value".to_string(), json!("hello"))],
            )
            .await;
        assert_eq!(result.data["text"], json!("hello"));
    }

    #[tokio::test]
    async fn test_requires_input() {
        let mut node = DebugPrintNode::new();
        let result = node.execute(&ExecutionContext::new(), Vec::new()).await;
        // required input neither connected nor populated
        assert!(!result.success);
    }
}
