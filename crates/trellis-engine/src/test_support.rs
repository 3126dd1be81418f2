//! Minimal node implementations shared by the engine's unit tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::context::ExecutionContext;
use crate::error::{GraphError, Result};
use crate::node::{Node, NodeBase};
use crate::pin::Pin;
use crate::property::{Property, PropertyKind};
use crate::types::{DataType, NodeCategory};

/// Emits its "value" property on the "out" pin.
pub struct ValueNode {
    base: NodeBase,
}

impl ValueNode {
    pub fn new() -> Self {
        let base = NodeBase::new("Value", NodeCategory::Data)
            .with_outputs(vec![Pin::output("out", "Out", DataType::Float)])
            .with_properties(vec![
                Property::new("value", "Value", PropertyKind::Float, json!(0.0)).required(),
            ]);
        Self { base }
    }

    pub fn with_value(value: f64) -> Self {
        let mut node = Self::new();
        node.base
            .property_mut("value")
            .unwrap()
            .set_value(json!(value))
            .unwrap();
        node
    }
}

#[async_trait]
impl Node for ValueNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "test-value"
    }

    async fn compute(&mut self, _ctx: &ExecutionContext) -> Result<HashMap<String, Value>> {
        let mut outputs = HashMap::new();
        outputs.insert(
            "out".to_string(),
            self.base.property("value").unwrap().value().clone(),
        );
        Ok(outputs)
    }
}

/// Adds its "a" and "b" inputs onto the "sum" pin.
pub struct AddNode {
    base: NodeBase,
}

impl AddNode {
    pub fn new() -> Self {
        let base = NodeBase::new("Add", NodeCategory::Math)
            .with_inputs(vec![
                Pin::input("a", "A", DataType::Float),
                Pin::input("b", "B", DataType::Float),
            ])
            .with_outputs(vec![Pin::output("sum", "Sum", DataType::Float)]);
        Self { base }
    }
}

#[async_trait]
impl Node for AddNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "test-add"
    }

    async fn compute(&mut self, _ctx: &ExecutionContext) -> Result<HashMap<String, Value>> {
        let read = |pin: &str| -> Result<f64> {
            self.base
                .input(pin)
                .and_then(|p| p.value())
                .and_then(|v| v.as_f64())
                .ok_or_else(|| GraphError::failed(format!("input '{}' is not numeric", pin)))
        };
        let sum = read("a")? + read("b")?;

        let mut outputs = HashMap::new();
        outputs.insert("sum".to_string(), json!(sum));
        Ok(outputs)
    }
}

/// Aggregates every value arriving on its multi-connection "items"
/// input onto the "all" pin.
pub struct CollectNode {
    base: NodeBase,
}

impl CollectNode {
    pub fn new() -> Self {
        let base = NodeBase::new("Collect", NodeCategory::Utility)
            .with_inputs(vec![Pin::input("items", "Items", DataType::Any)
                .optional()
                .multiple()])
            .with_outputs(vec![Pin::output("all", "All", DataType::Any)]);
        Self { base }
    }
}

#[async_trait]
impl Node for CollectNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "test-collect"
    }

    async fn compute(&mut self, _ctx: &ExecutionContext) -> Result<HashMap<String, Value>> {
        let items = self
            .base
            .input("items")
            .and_then(|p| p.value())
            .cloned()
            .unwrap_or(Value::Array(Vec::new()));

        let mut outputs = HashMap::new();
        outputs.insert("all".to_string(), items);
        Ok(outputs)
    }
}

/// Always fails with a fixed message.
pub struct FailingNode {
    base: NodeBase,
}

impl FailingNode {
    pub fn new() -> Self {
        let base = NodeBase::new("Failing", NodeCategory::Utility)
            .with_inputs(vec![Pin::input("in", "In", DataType::Any).optional()])
            .with_outputs(vec![Pin::output("out", "Out", DataType::Any)]);
        Self { base }
    }
}

#[async_trait]
impl Node for FailingNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "test-failing"
    }

    async fn compute(&mut self, _ctx: &ExecutionContext) -> Result<HashMap<String, Value>> {
        Err(GraphError::failed("deliberate failure"))
    }
}

/// Refuses to execute unless its "enabled" property is true.
///
/// Exercises the skip path: dependency validation passes (no required
/// inputs), but `can_execute` adds a stricter check.
pub struct PickyNode {
    base: NodeBase,
}

impl PickyNode {
    pub fn new(enabled: bool) -> Self {
        let base = NodeBase::new("Picky", NodeCategory::Utility)
            .with_outputs(vec![Pin::output("out", "Out", DataType::Any)])
            .with_properties(vec![Property::new(
                "enabled",
                "Enabled",
                PropertyKind::Boolean,
                json!(enabled),
            )]);
        Self { base }
    }
}

#[async_trait]
impl Node for PickyNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "test-picky"
    }

    fn can_execute(&self) -> bool {
        self.base
            .property("enabled")
            .map(|p| p.value() == &json!(true))
            .unwrap_or(false)
    }

    fn validate_configuration(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if !self.can_execute() {
            errors.push("node is disabled".to_string());
        }
        errors
    }

    async fn compute(&mut self, _ctx: &ExecutionContext) -> Result<HashMap<String, Value>> {
        let mut outputs = HashMap::new();
        outputs.insert("out".to_string(), json!("ran"));
        Ok(outputs)
    }
}

/// Cancels the run's own token from inside its computation.
pub struct CancelNode {
    base: NodeBase,
}

impl CancelNode {
    pub fn new() -> Self {
        let base = NodeBase::new("Cancel", NodeCategory::Utility)
            .with_outputs(vec![Pin::output("out", "Out", DataType::Any)]);
        Self { base }
    }
}

#[async_trait]
impl Node for CancelNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        "test-cancel"
    }

    async fn compute(&mut self, ctx: &ExecutionContext) -> Result<HashMap<String, Value>> {
        ctx.cancellation().cancel();
        Err(GraphError::Cancelled)
    }
}
