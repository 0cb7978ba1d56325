use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A data-flow reference to another node's output slot.
///
/// On the wire this is the two-element array `[source_node_id, output_slot]`,
/// which is the only way the template format expresses an edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "(String, u32)", from = "(String, u32)")]
pub struct EdgeRef {
    pub source: String,
    pub slot: u32,
}

impl EdgeRef {
    pub fn new(source: impl Into<String>, slot: u32) -> Self {
        Self {
            source: source.into(),
            slot,
        }
    }
}

impl From<(String, u32)> for EdgeRef {
    fn from((source, slot): (String, u32)) -> Self {
        Self { source, slot }
    }
}

impl From<EdgeRef> for (String, u32) {
    fn from(r: EdgeRef) -> Self {
        (r.source, r.slot)
    }
}

/// The value of a single node field: either an [`EdgeRef`] link or a literal.
///
/// Literals cover scalars (string/number/boolean) as well as structured
/// free-form metadata; both are kept as raw JSON. Any two-element
/// `[string, integer]` array is interpreted as a link, mirroring the wire
/// format's convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Link(EdgeRef),
    Literal(JsonValue),
}

impl FieldValue {
    pub fn link(source: impl Into<String>, slot: u32) -> Self {
        FieldValue::Link(EdgeRef::new(source, slot))
    }

    pub fn is_link(&self) -> bool {
        matches!(self, FieldValue::Link(_))
    }

    pub fn as_link(&self) -> Option<&EdgeRef> {
        match self {
            FieldValue::Link(r) => Some(r),
            FieldValue::Literal(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Literal(v) => v.as_str(),
            FieldValue::Link(_) => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Literal(v) => v.as_f64(),
            FieldValue::Link(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Literal(v) => v.as_i64(),
            FieldValue::Link(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Literal(v) => v.as_bool(),
            FieldValue::Link(_) => None,
        }
    }
}

impl From<JsonValue> for FieldValue {
    fn from(v: JsonValue) -> Self {
        FieldValue::Literal(v)
    }
}
