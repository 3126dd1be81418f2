//! The node contract: shared state, capability trait, and the
//! execution lifecycle state machine.
//!
//! A node owns its pins and properties exclusively; both live and die
//! with it. Node variants implement [`Node`] and are composed by the
//! registry. There is no inheritance hierarchy, only the capability
//! trait plus the shared [`NodeBase`] state each variant embeds.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ExecutionContext;
use crate::error::{GraphError, Result};
use crate::pin::Pin;
use crate::property::Property;
use crate::types::{ExecutionState, NodeCategory, NodeId, PinId};

/// Shared state every node variant embeds.
///
/// Pins and properties are populated once at construction and not
/// resized afterwards; the layout position is irrelevant to execution.
#[derive(Debug, Clone)]
pub struct NodeBase {
    id: NodeId,
    name: String,
    description: String,
    category: NodeCategory,
    version: String,
    inputs: Vec<Pin>,
    outputs: Vec<Pin>,
    properties: Vec<Property>,
    position: (f64, f64),
    state: ExecutionState,
    last_error: Option<String>,
    last_run: Option<DateTime<Utc>>,
    last_elapsed_ms: Option<u64>,
}

impl NodeBase {
    /// Create a base with a fresh id and no pins or properties
    pub fn new(name: impl Into<String>, category: NodeCategory) -> Self {
        Self {
            id: format!("node-{}", uuid::Uuid::new_v4()),
            name: name.into(),
            description: String::new(),
            category,
            version: "1.0".to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            properties: Vec::new(),
            position: (0.0, 0.0),
            state: ExecutionState::Idle,
            last_error: None,
            last_run: None,
            last_elapsed_ms: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the version string
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Attach the input pins, stamping this node's id onto them
    pub fn with_inputs(mut self, inputs: Vec<Pin>) -> Self {
        self.inputs = inputs;
        for pin in &mut self.inputs {
            pin.set_node_id(self.id.clone());
        }
        self
    }

    /// Attach the output pins, stamping this node's id onto them
    pub fn with_outputs(mut self, outputs: Vec<Pin>) -> Self {
        self.outputs = outputs;
        for pin in &mut self.outputs {
            pin.set_node_id(self.id.clone());
        }
        self
    }

    /// Attach the properties
    pub fn with_properties(mut self, properties: Vec<Property>) -> Self {
        self.properties = properties;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Replace the node id, restamping every owned pin.
    ///
    /// Used when restoring a node from a persisted document.
    pub fn set_id(&mut self, id: impl Into<NodeId>) {
        self.id = id.into();
        for pin in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            pin.set_node_id(self.id.clone());
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn category(&self) -> NodeCategory {
        self.category
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn position(&self) -> (f64, f64) {
        self.position
    }

    pub fn set_position(&mut self, position: (f64, f64)) {
        self.position = position;
    }

    pub fn inputs(&self) -> &[Pin] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Pin] {
        &self.outputs
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn input(&self, pin_id: &str) -> Option<&Pin> {
        self.inputs.iter().find(|p| p.id() == pin_id)
    }

    pub fn input_mut(&mut self, pin_id: &str) -> Option<&mut Pin> {
        self.inputs.iter_mut().find(|p| p.id() == pin_id)
    }

    pub fn output(&self, pin_id: &str) -> Option<&Pin> {
        self.outputs.iter().find(|p| p.id() == pin_id)
    }

    pub fn output_mut(&mut self, pin_id: &str) -> Option<&mut Pin> {
        self.outputs.iter_mut().find(|p| p.id() == pin_id)
    }

    /// Find a pin of either direction by id
    pub fn pin(&self, pin_id: &str) -> Option<&Pin> {
        self.input(pin_id).or_else(|| self.output(pin_id))
    }

    /// Find a pin of either direction by id (mutable)
    pub fn pin_mut(&mut self, pin_id: &str) -> Option<&mut Pin> {
        if self.inputs.iter().any(|p| p.id() == pin_id) {
            self.input_mut(pin_id)
        } else {
            self.output_mut(pin_id)
        }
    }

    pub fn property(&self, property_id: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.id() == property_id)
    }

    pub fn property_mut(&mut self, property_id: &str) -> Option<&mut Property> {
        self.properties.iter_mut().find(|p| p.id() == property_id)
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    pub fn set_state(&mut self, state: ExecutionState) {
        self.state = state;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    pub fn last_run(&self) -> Option<DateTime<Utc>> {
        self.last_run
    }

    pub fn last_elapsed_ms(&self) -> Option<u64> {
        self.last_elapsed_ms
    }

    /// Return to `Idle`, clearing the last error and all output pin
    /// values. Input values and properties are untouched.
    pub fn reset(&mut self) {
        self.state = ExecutionState::Idle;
        self.last_error = None;
        for pin in &mut self.outputs {
            pin.clear_value();
        }
    }

    /// Record the outcome of one execution
    pub(crate) fn finish(
        &mut self,
        state: ExecutionState,
        error: Option<String>,
        elapsed_ms: u64,
    ) {
        self.state = state;
        self.last_error = error;
        self.last_elapsed_ms = Some(elapsed_ms);
        self.last_run = Some(Utc::now());
    }
}

/// Structured outcome of one node execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeExecutionResult {
    /// Whether the computation succeeded
    pub success: bool,
    /// Whether the run was interrupted by cancellation
    pub cancelled: bool,
    /// Error message if the computation failed
    pub error: Option<String>,
    /// Elapsed time in milliseconds
    pub execution_time_ms: u64,
    /// Output data produced by the computation, keyed by output pin id
    #[serde(default)]
    pub data: HashMap<String, Value>,
}

impl NodeExecutionResult {
    /// Create a successful result
    pub fn success(data: HashMap<String, Value>, execution_time_ms: u64) -> Self {
        Self {
            success: true,
            cancelled: false,
            error: None,
            execution_time_ms,
            data,
        }
    }

    /// Create a failed result
    pub fn failure(error: impl Into<String>, execution_time_ms: u64) -> Self {
        Self {
            success: false,
            cancelled: false,
            error: Some(error.into()),
            execution_time_ms,
            data: HashMap::new(),
        }
    }

    /// Create a cancellation result (distinct from an ordinary failure)
    pub fn cancelled(execution_time_ms: u64) -> Self {
        Self {
            success: false,
            cancelled: true,
            error: None,
            execution_time_ms,
            data: HashMap::new(),
        }
    }

    /// Create a result for an execution rejected before it started
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::failure(reason, 0)
    }
}

/// The polymorphic unit of computation.
///
/// Variants implement `compute` (and optionally override `can_execute`,
/// `validate_configuration`, and `on_property_changed`); the provided
/// `execute` drives the lifecycle state machine and guarantees no error
/// or panic escapes the node boundary.
#[async_trait]
pub trait Node: Send + Sync {
    /// Shared node state
    fn base(&self) -> &NodeBase;

    /// Shared node state (mutable)
    fn base_mut(&mut self) -> &mut NodeBase;

    /// The registered type name of this node (e.g. "arithmetic")
    fn type_name(&self) -> &'static str;

    /// The type-specific computation.
    ///
    /// Reads input pin values and properties, returns output values
    /// keyed by output pin id. Returning `GraphError::Cancelled` reports
    /// cancellation rather than failure.
    async fn compute(&mut self, ctx: &ExecutionContext) -> Result<HashMap<String, Value>>;

    /// Whether this node is ready to execute.
    ///
    /// Default: every required input pin is either connected or already
    /// holds a value. Variants may add stricter checks.
    fn can_execute(&self) -> bool {
        self.base()
            .inputs()
            .iter()
            .all(|pin| !pin.is_required() || pin.is_connected() || pin.value().is_some())
    }

    /// Collect human-readable configuration problems.
    ///
    /// Advisory: a non-empty list does not block execution by itself.
    fn validate_configuration(&self) -> Vec<String> {
        let mut errors = Vec::new();
        for prop in self.base().properties() {
            if prop.is_required() && prop.value().is_null() {
                errors.push(format!("required property '{}' has no value", prop.id()));
            }
        }
        for pin in self.base().inputs() {
            if pin.is_required() && !pin.is_connected() && pin.value().is_none() {
                errors.push(format!(
                    "required input '{}' is not connected and has no value",
                    pin.id()
                ));
            }
        }
        errors
    }

    /// Hook invoked after a property value changes via `set_property`.
    ///
    /// Variants use this to react to configuration (e.g. retyping an
    /// output pin when a "type" property changes).
    fn on_property_changed(&mut self, _property_id: &str) {}

    /// Set a property value and run the change hook
    fn set_property(&mut self, property_id: &str, value: Value) -> Result<()> {
        let prop = self
            .base_mut()
            .property_mut(property_id)
            .ok_or_else(|| GraphError::invalid_property(property_id, "no such property"))?;
        prop.set_value(value)?;
        self.on_property_changed(property_id);
        Ok(())
    }

    /// Produce the property-value map for persistence
    fn serialize_properties(&self) -> HashMap<String, Value> {
        self.base()
            .properties()
            .iter()
            .map(|p| (p.id().to_string(), p.value().clone()))
            .collect()
    }

    /// Restore property values from a persisted map.
    ///
    /// Values are applied in property declaration order so that
    /// retyping hooks fire before dependent values arrive; unknown keys
    /// are ignored.
    fn deserialize_properties(&mut self, values: &HashMap<String, Value>) -> Result<()> {
        let ids: Vec<String> = self
            .base()
            .properties()
            .iter()
            .map(|p| p.id().to_string())
            .collect();
        for id in ids {
            if let Some(value) = values.get(&id) {
                self.set_property(&id, value.clone())?;
            }
        }
        Ok(())
    }

    /// Drive one execution through the lifecycle state machine.
    ///
    /// `upstream` carries the values the engine pulled from this node's
    /// active input connections; they are applied to the input pins
    /// immediately before `compute` runs, the single point per run at
    /// which upstream outputs become visible to this node.
    async fn execute(
        &mut self,
        ctx: &ExecutionContext,
        upstream: Vec<(PinId, Value)>,
    ) -> NodeExecutionResult {
        if self.base().state() == ExecutionState::Executing {
            return NodeExecutionResult::rejected("node is already executing");
        }
        if !self.can_execute() {
            return NodeExecutionResult::rejected("node is not ready to execute");
        }

        {
            let base = self.base_mut();
            base.set_state(ExecutionState::Executing);
            base.clear_last_error();
        }
        let started = Instant::now();

        if ctx.is_cancelled() {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            self.base_mut()
                .finish(ExecutionState::Cancelled, None, elapsed_ms);
            return NodeExecutionResult::cancelled(elapsed_ms);
        }

        ctx.report_progress(format!("Starting {}...", self.base().name()));

        for (pin_id, value) in upstream {
            if let Some(pin) = self.base_mut().input_mut(&pin_id) {
                pin.set_value(value);
            }
        }

        let outcome = AssertUnwindSafe(self.compute(ctx)).catch_unwind().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(Ok(outputs)) => {
                for (pin_id, value) in &outputs {
                    if let Some(pin) = self.base_mut().output_mut(pin_id) {
                        pin.set_value(value.clone());
                    }
                }
                self.base_mut()
                    .finish(ExecutionState::Completed, None, elapsed_ms);
                NodeExecutionResult::success(outputs, elapsed_ms)
            }
            Ok(Err(GraphError::Cancelled)) => {
                self.base_mut()
                    .finish(ExecutionState::Cancelled, None, elapsed_ms);
                NodeExecutionResult::cancelled(elapsed_ms)
            }
            Ok(Err(err)) => {
                let message = err.to_string();
                log::debug!("node '{}' failed: {}", self.base().name(), message);
                self.base_mut()
                    .finish(ExecutionState::Error, Some(message.clone()), elapsed_ms);
                NodeExecutionResult::failure(message, elapsed_ms)
            }
            Err(payload) => {
                let message = panic_message(payload);
                log::warn!("node '{}' panicked: {}", self.base().name(), message);
                self.base_mut()
                    .finish(ExecutionState::Error, Some(message.clone()), elapsed_ms);
                NodeExecutionResult::failure(message, elapsed_ms)
            }
        }
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "node computation panicked".to_string()
    }
}
