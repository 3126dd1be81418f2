//! Typed, directional connection points on nodes.
//!
//! A pin holds the current value flowing through it and bookkeeping for
//! the connections attached to it. Value changes notify observers but
//! never trigger execution; the engine alone decides when values move.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::types::{ConnectionId, DataType, NodeId, PinDirection, PinId};

/// Observer callback invoked after a pin value changes.
///
/// Receives the pin id and the new value (`None` when cleared).
pub type PinObserver = Arc<dyn Fn(&str, Option<&Value>) + Send + Sync>;

/// A typed input or output slot on exactly one owning node
#[derive(Clone)]
pub struct Pin {
    id: PinId,
    name: String,
    data_type: DataType,
    direction: PinDirection,
    required: bool,
    allow_multiple: bool,
    node_id: NodeId,
    value: Option<Value>,
    connections: Vec<ConnectionId>,
    observers: Vec<PinObserver>,
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pin")
            .field("id", &self.id)
            .field("data_type", &self.data_type)
            .field("direction", &self.direction)
            .field("required", &self.required)
            .field("allow_multiple", &self.allow_multiple)
            .field("node_id", &self.node_id)
            .field("value", &self.value)
            .field("connections", &self.connections)
            .finish()
    }
}

impl Pin {
    /// Create an input pin (required, single-connection by default)
    pub fn input(id: impl Into<String>, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data_type,
            direction: PinDirection::Input,
            required: true,
            allow_multiple: false,
            node_id: String::new(),
            value: None,
            connections: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Create an output pin (optional, multi-connection by default)
    pub fn output(id: impl Into<String>, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            data_type,
            direction: PinDirection::Output,
            required: false,
            allow_multiple: true,
            node_id: String::new(),
            value: None,
            connections: Vec::new(),
            observers: Vec::new(),
        }
    }

    /// Mark this pin as optional
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Allow multiple connections on this pin
    pub fn multiple(mut self) -> Self {
        self.allow_multiple = true;
        self
    }

    /// Restrict this pin to a single connection
    pub fn single(mut self) -> Self {
        self.allow_multiple = false;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Retype this pin (e.g. a variable node changing its output type)
    pub fn set_data_type(&mut self, data_type: DataType) {
        self.data_type = data_type;
    }

    pub fn direction(&self) -> PinDirection {
        self.direction
    }

    pub fn is_input(&self) -> bool {
        matches!(self.direction, PinDirection::Input)
    }

    pub fn is_output(&self) -> bool {
        matches!(self.direction, PinDirection::Output)
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn allows_multiple(&self) -> bool {
        self.allow_multiple
    }

    /// Id of the owning node (stamped when the node is constructed)
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub(crate) fn set_node_id(&mut self, node_id: impl Into<NodeId>) {
        self.node_id = node_id.into();
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Set the current value, notifying observers
    pub fn set_value(&mut self, value: Value) {
        self.value = Some(value);
        self.notify();
    }

    /// Clear the current value, notifying observers
    pub fn clear_value(&mut self) {
        if self.value.take().is_some() {
            self.notify();
        }
    }

    pub fn connections(&self) -> &[ConnectionId] {
        &self.connections
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_connected(&self) -> bool {
        !self.connections.is_empty()
    }

    /// Whether this pin has reached its connection-count limit
    pub fn at_capacity(&self) -> bool {
        !self.allow_multiple && !self.connections.is_empty()
    }

    pub(crate) fn register_connection(&mut self, id: impl Into<ConnectionId>) {
        self.connections.push(id.into());
    }

    pub(crate) fn unregister_connection(&mut self, id: &str) {
        self.connections.retain(|c| c != id);
    }

    /// Register an observer called after every value change
    pub fn watch(&mut self, observer: PinObserver) {
        self.observers.push(observer);
    }

    fn notify(&self) {
        for observer in &self.observers {
            observer(&self.id, self.value.as_ref());
        }
    }

    /// Why a connection from/to `other` would be rejected, if it would be.
    ///
    /// Compatibility is direction-aware: the check is always "can the
    /// input accept what the output produces".
    pub fn connection_rejection(&self, other: &Pin) -> Option<String> {
        if self.node_id == other.node_id {
            return Some("cannot connect pins on the same node".to_string());
        }
        if self.direction == other.direction {
            return Some(format!(
                "cannot connect two {} pins",
                match self.direction {
                    PinDirection::Input => "input",
                    PinDirection::Output => "output",
                }
            ));
        }
        if self.at_capacity() {
            return Some(format!("pin '{}' is at its connection limit", self.id));
        }
        if other.at_capacity() {
            return Some(format!("pin '{}' is at its connection limit", other.id));
        }
        let (output, input) = if self.is_output() {
            (self, other)
        } else {
            (other, self)
        };
        if !input.data_type.is_compatible_with(&output.data_type) {
            return Some(format!(
                "incompatible types: {} -> {}",
                output.data_type.name(),
                input.data_type.name()
            ));
        }
        None
    }

    /// Whether a connection between this pin and `other` would be valid
    pub fn can_connect_to(&self, other: &Pin) -> bool {
        self.connection_rejection(other).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn owned(mut pin: Pin, node: &str) -> Pin {
        pin.set_node_id(node);
        pin
    }

    #[test]
    fn test_defaults() {
        let input = Pin::input("a", "A", DataType::Float);
        assert!(input.is_required());
        assert!(!input.allows_multiple());

        let output = Pin::output("out", "Out", DataType::Float);
        assert!(!output.is_required());
        assert!(output.allows_multiple());
    }

    #[test]
    fn test_same_node_rejected() {
        let out = owned(Pin::output("out", "Out", DataType::Float), "n1");
        let inp = owned(Pin::input("in", "In", DataType::Float), "n1");
        assert!(!out.can_connect_to(&inp));
        assert!(!inp.can_connect_to(&out));
    }

    #[test]
    fn test_same_direction_rejected() {
        let a = owned(Pin::output("a", "A", DataType::Float), "n1");
        let b = owned(Pin::output("b", "B", DataType::Float), "n2");
        assert!(!a.can_connect_to(&b));

        let c = owned(Pin::input("c", "C", DataType::Float), "n1");
        let d = owned(Pin::input("d", "D", DataType::Float), "n2");
        assert!(!c.can_connect_to(&d));
    }

    #[test]
    fn test_compatible_pair_accepted_both_ways() {
        let out = owned(Pin::output("out", "Out", DataType::Integer), "n1");
        let inp = owned(Pin::input("in", "In", DataType::Float), "n2");
        assert!(out.can_connect_to(&inp));
        assert!(inp.can_connect_to(&out));
    }

    #[test]
    fn test_incompatible_types_rejected() {
        let out = owned(Pin::output("out", "Out", DataType::Text), "n1");
        let inp = owned(Pin::input("in", "In", DataType::Float), "n2");
        assert!(!out.can_connect_to(&inp));
    }

    #[test]
    fn test_single_input_at_capacity() {
        let out = owned(Pin::output("out", "Out", DataType::Float), "n1");
        let mut inp = owned(Pin::input("in", "In", DataType::Float), "n2");
        assert!(out.can_connect_to(&inp));

        inp.register_connection("conn-1");
        assert!(inp.at_capacity());
        assert!(!out.can_connect_to(&inp));

        inp.unregister_connection("conn-1");
        assert!(out.can_connect_to(&inp));
    }

    #[test]
    fn test_multi_output_never_at_capacity() {
        let mut out = owned(Pin::output("out", "Out", DataType::Float), "n1");
        out.register_connection("c1");
        out.register_connection("c2");
        assert!(!out.at_capacity());
    }

    #[test]
    fn test_is_connected_tracks_count() {
        let mut pin = Pin::input("in", "In", DataType::Any);
        assert!(!pin.is_connected());
        pin.register_connection("c1");
        assert!(pin.is_connected());
        pin.unregister_connection("c1");
        assert!(!pin.is_connected());
    }

    #[test]
    fn test_value_observer() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let mut pin = Pin::output("out", "Out", DataType::Float);
        pin.watch(Arc::new(|_, _| {
            CALLS.fetch_add(1, Ordering::SeqCst);
        }));
        pin.set_value(json!(1.0));
        pin.clear_value();
        // clearing an already-empty pin does not notify
        pin.clear_value();
        assert_eq!(CALLS.load(Ordering::SeqCst), 2);
    }
}
