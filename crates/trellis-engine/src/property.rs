//! Typed configuration values owned by nodes.
//!
//! A `Property` holds one named, typed parameter. Reads return the
//! explicit value if one was set, otherwise the declared default.
//! Writes coerce the incoming value to the declared kind; range values
//! clamp into `[min, max]` instead of erroring, enum values outside the
//! allowed set are rejected and the property is left unchanged.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphError, Result};

/// The declared kind of a property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PropertyKind {
    /// Free-form text
    Text,
    /// Whole number
    Integer,
    /// Floating-point number
    Float,
    /// Boolean flag
    Boolean,
    /// Path to a file
    FilePath,
    /// Path to a directory
    DirectoryPath,
    /// One value out of a fixed allowed set
    Enum { allowed: Vec<String> },
    /// Numeric value clamped into an inclusive range
    Range { min: f64, max: f64 },
}

/// Observer callback invoked after a property value changes.
///
/// Receives the property id and the new effective value. Advisory only;
/// execution control flow never depends on observers.
pub type PropertyObserver = Arc<dyn Fn(&str, &Value) + Send + Sync>;

/// A named, typed configuration value owned by a node
#[derive(Clone)]
pub struct Property {
    id: String,
    label: String,
    description: String,
    kind: PropertyKind,
    default: Value,
    required: bool,
    read_only: bool,
    value: Option<Value>,
    observers: Vec<PropertyObserver>,
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("default", &self.default)
            .field("required", &self.required)
            .field("read_only", &self.read_only)
            .field("value", &self.value)
            .finish()
    }
}

impl Property {
    /// Create a new property with a declared kind and default value
    pub fn new(
        id: impl Into<String>,
        label: impl Into<String>,
        kind: PropertyKind,
        default: Value,
    ) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
            kind,
            default,
            required: false,
            read_only: false,
            value: None,
            observers: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark this property as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark this property as read-only
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Whether an explicit value has been set
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// The effective value: the explicit value if set, else the default
    pub fn value(&self) -> &Value {
        self.value.as_ref().unwrap_or(&self.default)
    }

    /// Set the value, coercing it to the declared kind.
    ///
    /// A read-only property ignores the write. Un-coercible input and
    /// enum values outside the allowed set return an error and leave the
    /// property unchanged. Range values clamp instead of erroring.
    pub fn set_value(&mut self, raw: Value) -> Result<()> {
        if self.read_only {
            return Ok(());
        }
        let coerced = coerce(&self.id, &self.kind, raw)?;
        self.value = Some(coerced);
        self.notify();
        Ok(())
    }

    /// Remove the explicit value, reverting reads to the default
    pub fn clear_value(&mut self) {
        if self.value.take().is_some() {
            self.notify();
        }
    }

    /// Retype this property.
    ///
    /// The explicit value is cleared when the kind actually changes,
    /// since it was coerced for the old kind.
    pub fn set_kind(&mut self, kind: PropertyKind) {
        if self.kind != kind {
            self.kind = kind;
            self.value = None;
        }
    }

    /// Register an observer called after every value change
    pub fn watch(&mut self, observer: PropertyObserver) {
        self.observers.push(observer);
    }

    fn notify(&self) {
        let value = self.value();
        for observer in &self.observers {
            observer(&self.id, value);
        }
    }
}

/// Coerce a raw value to the declared property kind.
fn coerce(property: &str, kind: &PropertyKind, raw: Value) -> Result<Value> {
    match kind {
        PropertyKind::Text | PropertyKind::FilePath | PropertyKind::DirectoryPath => match raw {
            Value::String(s) => Ok(Value::String(s)),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(GraphError::invalid_property(
                property,
                format!("cannot coerce {} to text", type_label(&other)),
            )),
        },
        PropertyKind::Integer => match &raw {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(Value::from(i))
                } else {
                    Err(GraphError::invalid_property(
                        property,
                        format!("{} is not a whole number", n),
                    ))
                }
            }
            Value::String(s) => s.trim().parse::<i64>().map(Value::from).map_err(|_| {
                GraphError::invalid_property(property, format!("'{}' is not an integer", s))
            }),
            other => Err(GraphError::invalid_property(
                property,
                format!("cannot coerce {} to integer", type_label(other)),
            )),
        },
        PropertyKind::Float => coerce_f64(property, &raw).map(Value::from),
        PropertyKind::Boolean => match &raw {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(GraphError::invalid_property(
                    property,
                    format!("'{}' is not a boolean", s),
                )),
            },
            other => Err(GraphError::invalid_property(
                property,
                format!("cannot coerce {} to boolean", type_label(other)),
            )),
        },
        PropertyKind::Enum { allowed } => match &raw {
            Value::String(s) => {
                if allowed.iter().any(|a| a == s) {
                    Ok(Value::String(s.clone()))
                } else {
                    Err(GraphError::invalid_property(
                        property,
                        format!("'{}' is not one of [{}]", s, allowed.join(", ")),
                    ))
                }
            }
            other => Err(GraphError::invalid_property(
                property,
                format!("cannot coerce {} to enum", type_label(other)),
            )),
        },
        PropertyKind::Range { min, max } => {
            let n = coerce_f64(property, &raw)?;
            Ok(Value::from(n.clamp(*min, *max)))
        }
    }
}

fn coerce_f64(property: &str, raw: &Value) -> Result<f64> {
    match raw {
        Value::Number(n) => n.as_f64().ok_or_else(|| {
            GraphError::invalid_property(property, format!("{} is not representable as float", n))
        }),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| {
            GraphError::invalid_property(property, format!("'{}' is not a number", s))
        }),
        other => Err(GraphError::invalid_property(
            property,
            format!("cannot coerce {} to number", type_label(other)),
        )),
    }
}

fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
