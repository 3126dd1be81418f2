//! Arithmetic node

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use trellis_engine::{
    DataType, ExecutionContext, GraphError, Node, NodeBase, NodeCategory, NodeDescriptor,
    NodeTypeInfo, Pin, Property, PropertyKind, Result,
};

/// Applies a configurable binary operation to two numeric inputs.
pub struct ArithmeticNode {
    base: NodeBase,
}

impl ArithmeticNode {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "arithmetic";
    /// Port ID for the left operand
    pub const PIN_A: &'static str = "a";
    /// Port ID for the right operand
    pub const PIN_B: &'static str = "b";
    /// Port ID for the result output
    pub const PIN_RESULT: &'static str = "result";
    /// Property ID for the operation
    pub const PROP_OPERATION: &'static str = "operation";

    pub fn new() -> Self {
        let base = NodeBase::new("Arithmetic", NodeCategory::Math)
            .with_description("Applies a binary operation to two numbers")
            .with_inputs(vec![
                Pin::input(Self::PIN_A, "A", DataType::Float),
                Pin::input(Self::PIN_B, "B", DataType::Float),
            ])
            .with_outputs(vec![Pin::output(Self::PIN_RESULT, "Result", DataType::Float)])
            .with_properties(vec![Property::new(
                Self::PROP_OPERATION,
                "Operation",
                PropertyKind::Enum {
                    allowed: vec![
                        "add".to_string(),
                        "subtract".to_string(),
                        "multiply".to_string(),
                        "divide".to_string(),
                    ],
                },
                json!("add"),
            )
            .required()]);
        Self { base }
    }

    fn operand(&self, pin: &str) -> Result<f64> {
        self.base
            .input(pin)
            .and_then(|p| p.value())
            .and_then(|v| v.as_f64())
            .ok_or_else(|| GraphError::failed(format!("input '{}' is not numeric", pin)))
    }
}

impl Default for ArithmeticNode {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeDescriptor for ArithmeticNode {
    fn descriptor() -> NodeTypeInfo {
        NodeTypeInfo::new(
            Self::TYPE_NAME,
            NodeCategory::Math,
            "Arithmetic",
            "Applies a binary operation to two numbers",
        )
    }
}

#[async_trait]
impl Node for ArithmeticNode {
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
        let a = self.operand(Self::PIN_A)?;
        let b = self.operand(Self::PIN_B)?;
        let operation = self
            .base
            .property(Self::PROP_OPERATION)
            .and_then(|p| p.value().as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "add".to_string());

        let result = match operation.as_str() {
            "add" => a + b,
            "subtract" => a - b,
            "multiply" => a * b,
            "divide" => {
                if b == 0.0 {
                    return Err(GraphError::failed("division by zero"));
                }
                a / b
            }
            other => {
                return Err(GraphError::failed(format!("unknown operation '{}'", other)));
            }
        };

        log::debug!("Arithmetic: {} {} {} = {}", a, operation, b, result);

        let mut outputs = HashMap::new();
        outputs.insert(Self::PIN_RESULT.to_string(), json!(result));
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_engine::ExecutionState;

    async fn run(op: &str, a: f64, b: f64) -> trellis_engine::NodeExecutionResult {
        let mut node = ArithmeticNode::new();
        node.set_property(ArithmeticNode::PROP_OPERATION, json!(op)).unwrap();
        node.execute(
            &ExecutionContext::new(),
            vec![("a".to_string(), json!(a)), ("b".to_string(), json!(b))],
        )
        .await
    }

    #[tokio::test]
    async fn test_operations() {
        assert_eq!(run("add", 2.0, 3.0).await.data["result"], json!(5.0));
        assert_eq!(run("subtract", 5.0, 3.0).await.data["result"], json!(2.0));
        assert_eq!(run("multiply", 4.0, 2.5).await.data["result"], json!(10.0));
        assert_eq!(run("divide", 9.0, 3.0).await.data["result"], json!(3.0));
    }

    #[tokio::test]
    async fn test_division_by_zero_fails() {
        let result = run("divide", 1.0, 0.0).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("division by zero"));
    }

    #[tokio::test]
    async fn test_integer_inputs_accepted() {
        let mut node = ArithmeticNode::new();
        let result = node
            .execute(
                &ExecutionContext::new(),
                vec![("a".to_string(), json!(2)), ("b".to_string(), json!(3))],
            )
            .await;
        assert!(result.success);
        assert_eq!(result.data["result"], json!(5.0));
    }

    #[tokio::test]
    async fn test_non_numeric_input_fails() {
        let mut node = ArithmeticNode::new();
        let result = node
            .execute(
                &ExecutionContext::new(),
                vec![
                    ("a".to_string(), json!("two")),
                    ("b".to_string(), json!(3.0)),
                ],
            )
            .await;
        assert!(!result.success);
        assert_eq!(node.base().state(), ExecutionState::Error);
    }

    #[test]
    fn test_invalid_operation_rejected() {
        let mut node = ArithmeticNode::new();
        assert!(node
            .set_property(ArithmeticNode::PROP_OPERATION, json!("modulo"))
            .is_err());
    }
}
