use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::value::{EdgeRef, FieldValue};

/// Wire names of the client-defined node classes.
pub const CLASS_PARAMETER: &str = "TenkaiParameter";
pub const CLASS_DYNAMIC_INPUT: &str = "TenkaiDynamicInput";
pub const CLASS_IMAGE_INPUT: &str = "TenkaiImageInput";
pub const CLASS_OUTPUT: &str = "TenkaiOutput";

/// The kind of a node, dispatched on the template's `class_type` tag.
///
/// The parameter-declaring kinds and the sink are closed variants so that
/// resolution logic matches on them exhaustively; every backend-native node
/// class falls into `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    /// Pass-through declaration of a single scalar; removed from the
    /// resolved graph.
    Parameter,
    /// Like [`NodeKind::Parameter`] but retained, with its resolved value
    /// written into its own `default_value` field.
    DynamicInput,
    /// A parameter slot whose resolved value is a backend-relative filename.
    ImageInput,
    /// The designated sink node receiving the submission token.
    Output,
    /// Any ordinary backend computation node.
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            NodeKind::Parameter => CLASS_PARAMETER,
            NodeKind::DynamicInput => CLASS_DYNAMIC_INPUT,
            NodeKind::ImageInput => CLASS_IMAGE_INPUT,
            NodeKind::Output => CLASS_OUTPUT,
            NodeKind::Other(s) => s,
        }
    }

    /// Whether this kind declares a user-editable parameter.
    pub fn is_slot(&self) -> bool {
        matches!(
            self,
            NodeKind::Parameter | NodeKind::DynamicInput | NodeKind::ImageInput
        )
    }
}

impl From<String> for NodeKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            CLASS_PARAMETER => NodeKind::Parameter,
            CLASS_DYNAMIC_INPUT => NodeKind::DynamicInput,
            CLASS_IMAGE_INPUT => NodeKind::ImageInput,
            CLASS_OUTPUT => NodeKind::Output,
            _ => NodeKind::Other(s),
        }
    }
}

impl From<NodeKind> for String {
    fn from(k: NodeKind) -> Self {
        k.as_str().to_string()
    }
}

/// A single node in a template graph.
///
/// Fields live in a `BTreeMap` so serialization order is deterministic,
/// which keeps repeated resolutions of the same form state byte-identical.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(rename = "class_type")]
    pub kind: NodeKind,

    #[serde(default)]
    pub inputs: BTreeMap<String, FieldValue>,

    /// Free-form metadata (display title etc.), passed through untouched.
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<JsonValue>,
}

impl Node {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            inputs: BTreeMap::new(),
            meta: None,
        }
    }

    pub fn input(&self, name: &str) -> Option<&FieldValue> {
        self.inputs.get(name)
    }

    /// Convenience accessor for a string-valued input field.
    pub fn input_str(&self, name: &str) -> Option<&str> {
        self.inputs.get(name).and_then(FieldValue::as_str)
    }

    pub fn input_f64(&self, name: &str) -> Option<f64> {
        self.inputs.get(name).and_then(FieldValue::as_f64)
    }

    pub fn input_i64(&self, name: &str) -> Option<i64> {
        self.inputs.get(name).and_then(FieldValue::as_i64)
    }

    pub fn input_bool(&self, name: &str) -> Option<bool> {
        self.inputs.get(name).and_then(FieldValue::as_bool)
    }

    /// All edge references held by this node's fields, in field order.
    pub fn links(&self) -> impl Iterator<Item = (&str, &EdgeRef)> {
        self.inputs
            .iter()
            .filter_map(|(name, value)| value.as_link().map(|r| (name.as_str(), r)))
    }

    /// The display title from `_meta`, if the editor recorded one.
    pub fn title(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|m| m.get("title"))
            .and_then(JsonValue::as_str)
    }
}
