//! Text file reader node

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{json, Value};
use trellis_engine::{
    DataType, ExecutionContext, GraphError, Node, NodeBase, NodeCategory, NodeDescriptor,
    NodeTypeInfo, Pin, Property, PropertyKind, Result,
};

/// Reads a text file from disk and emits its contents.
pub struct TextFileNode {
    base: NodeBase,
}

impl TextFileNode {
    /// Registered type name
    pub const TYPE_NAME: &'static str = "text-file";
    /// Property ID for the file path
    pub const PROP_PATH: &'static str = "path";
    /// Property ID for the expected encoding
    pub const PROP_ENCODING: &'static str = "encoding";
    /// Port ID for the text output
    pub const PIN_TEXT: &'static str = "text";

    pub fn new() -> Self {
        let base = NodeBase::new("Text File", NodeCategory::Data)
            .with_description("Reads a text file from disk")
            .with_outputs(vec![Pin::output(Self::PIN_TEXT, "Text", DataType::Text)])
            .with_properties(vec![
                Property::new(Self::PROP_PATH, "Path", PropertyKind::FilePath, Value::Null)
                    .required(),
                Property::new(
                    Self::PROP_ENCODING,
                    "Encoding",
                    PropertyKind::Enum {
                        allowed: vec![
                            "UTF-8".to_string(),
                            "ASCII".to_string(),
                            "Latin-1".to_string(),
                        ],
                    },
                    json!("UTF-8"),
                ),
            ]);
        Self { base }
    }
}

impl Default for TextFileNode {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeDescriptor for TextFileNode {
    fn descriptor() -> NodeTypeInfo {
        NodeTypeInfo::new(
            Self::TYPE_NAME,
            NodeCategory::Data,
            "Text File",
            "Reads a text file from disk",
        )
    }
}

#[async_trait]
impl Node for TextFileNode {
    fn base(&self) -> &NodeBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut NodeBase {
        &mut self.base
    }

    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    async fn compute(&mut self, ctx: &ExecutionContext) -> Result<HashMap<String, Value>> {
        let path = self
            .base
            .property(Self::PROP_PATH)
            .and_then(|p| p.value().as_str().map(|s| s.to_string()))
            .filter(|p| !p.is_empty())
            .ok_or_else(|| GraphError::failed("no file path configured"))?;
        let encoding = self
            .base
            .property(Self::PROP_ENCODING)
            .and_then(|p| p.value().as_str().map(|s| s.to_string()))
            .unwrap_or_else(|| "UTF-8".to_string());

        ctx.check_cancelled()?;

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| GraphError::failed(format!("failed to read '{}': {}", path, e)))?;
        let text = decode(&bytes, &encoding)
            .map_err(|e| GraphError::failed(format!("failed to decode '{}': {}", path, e)))?;

        log::debug!("TextFile: read {} bytes from '{}'", bytes.len(), path);

        let mut outputs = HashMap::new();
        outputs.insert(Self::PIN_TEXT.to_string(), json!(text));
        Ok(outputs)
    }
}

fn decode(bytes: &[u8], encoding: &str) -> std::result::Result<String, String> {
    match encoding {
        "ASCII" => {
            if bytes.is_ascii() {
                Ok(String::from_utf8_lossy(bytes).into_owned())
            } else {
                Err("file contains non-ASCII bytes".to_string())
            }
        }
        "Latin-1" => Ok(bytes.iter().map(|&b| b as char).collect()),
        _ => String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string()),
    }
}
