//! Variable node
//!
//! Holds a single configurable value and emits it on its output pin.
//! The "type" property retypes both the "value" property and the output
//! pin, so downstream compatibility follows the configured type.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use trellis_engine::{
    DataType, ExecutionContext, Node, NodeBase, NodeCategory, NodeDescriptor, NodeTypeInfo, Pin,
    Property, PropertyKind, Result,
};

/// Emits a configured constant value.
pub struct VariableNode {
    base: NodeBase,
}

impl VariableNode {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "variable";
    /// Property ID for the variable type
    pub const PROP_TYPE: &'static str = "type";
    /// Property ID for the variable value
    pub const PROP_VALUE: &'static str = "value";
    /// Port ID for the value output
    pub const PIN_VALUE: &'static str = "value";

    pub fn new() -> Self {
        let base = NodeBase::new("Variable", NodeCategory::Data)
            .with_description("Holds a single configurable value")
            .with_outputs(vec![Pin::output(Self::PIN_VALUE, "Value", DataType::Float)])
            .with_properties(vec![
                Property::new(
                    Self::PROP_TYPE,
                    "Type",
                    PropertyKind::Enum {
                        allowed: vec![
                            "float".to_string(),
                            "integer".to_string(),
                            "text".to_string(),
                            "boolean".to_string(),
                        ],
                    },
                    json!("float"),
                )
                .with_description("The data type of this variable")
                .required(),
                Property::new(Self::PROP_VALUE, "Value", PropertyKind::Float, json!(0.0))
                    .required(),
            ]);
        Self { base }
    }

    /// The pin data type and property kind for the configured type
    fn configured_type(&self) -> (DataType, PropertyKind) {
        let type_name = self
            .base
            .property(Self::PROP_TYPE)
            .and_then(|p| p.value().as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "float".to_string());
        match type_name.as_str() {
            "integer" => (DataType::Integer, PropertyKind::Integer),
            "text" => (DataType::Text, PropertyKind::Text),
            "boolean" => (DataType::Boolean, PropertyKind::Boolean),
            _ => (DataType::Float, PropertyKind::Float),
        }
    }
}

impl Default for VariableNode {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeDescriptor for VariableNode {
    fn descriptor() -> NodeTypeInfo {
        NodeTypeInfo::new(
            Self::TYPE_NAME,
            NodeCategory::Data,
            "Variable",
            "Holds a single configurable value",
        )
    }
}

#[async_trait]
impl Node for VariableNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn on_property_changed(&mut self, property_id: &str) {
        if property_id == Self::PROP_TYPE {
            let (data_type, kind) = self.configured_type();
            if let Some(pin) = self.base.output_mut(Self::PIN_VALUE) {
                pin.set_data_type(data_type);
            }
            if let Some(prop) = self.base.property_mut(Self::PROP_VALUE) {
                prop.set_kind(kind);
            }
        }
    }

    async fn compute(&mut self, _ctx: &ExecutionContext) -> Result<HashMap<String, Value>> {
        let value = self
            .base
            .property(Self::PROP_VALUE)
            .map(|p| p.value().clone())
            .unwrap_or(Value::Null);

        let mut outputs = HashMap::new();
        outputs.insert(Self::PIN_VALUE.to_string(), value);
        Ok(outputs)
    }
}
