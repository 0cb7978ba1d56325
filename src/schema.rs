//! The schema extractor: scans a template for parameter-declaring nodes and
//! produces the ordered control descriptors a form layer renders.

use itertools::Itertools;
use serde_json::Value as JsonValue;

use crate::error::TemplateError;
use crate::graph::{FieldValue, Graph, Node, NodeKind};

/// The declared value type of a parameter slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    String,
    Int,
    Float,
    Boolean,
    /// Choice values are opaque strings; the valid set comes from the
    /// backend's choice source.
    Dropdown,
}

impl ParamType {
    /// Parses a type tag as written in templates. Unknown tags degrade to
    /// `String` rather than failing the whole template.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "INT" => ParamType::Int,
            "FLOAT" => ParamType::Float,
            "BOOLEAN" => ParamType::Boolean,
            "DROPDOWN" => ParamType::Dropdown,
            _ => ParamType::String,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ParamType::Int | ParamType::Float)
    }
}

/// What a control edits: a typed scalar, or a backend file reference
/// (image inputs carry no type tag).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Value(ParamType),
    FileRef,
}

impl ControlKind {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ControlKind::Value(t) if t.is_numeric())
    }
}

/// One renderable control, extracted from a parameter-declaring node.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlDescriptor {
    pub node_id: String,
    pub name: String,
    pub kind: ControlKind,
    pub default: JsonValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub choices: Vec<String>,
    /// Backend choice-category used to populate dropdown options.
    pub choice_type: Option<String>,
    pub multiline: bool,
    pub priority: i64,
    pub randomizable: bool,
    pub bypassable: bool,
    /// Whether the declaring node survives resolution (dynamic and image
    /// slots do; plain parameter slots are deleted).
    pub retained: bool,
}

impl ControlDescriptor {
    pub fn param_type(&self) -> Option<ParamType> {
        match self.kind {
            ControlKind::Value(t) => Some(t),
            ControlKind::FileRef => None,
        }
    }
}

/// Presentation hint: adjacent numeric controls are grouped for
/// side-by-side rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlLayout {
    Single(ControlDescriptor),
    Row(Vec<ControlDescriptor>),
}

/// Extracts the ordered control descriptors from a template.
///
/// Ordering is a stable sort by ascending priority (missing priority is 0);
/// ties keep the template's document order. Fails with
/// [`TemplateError::EmptyTemplate`] when the template declares no
/// parameters — callers treat that as an empty state, not a hard error.
pub fn extract_controls(graph: &Graph) -> Result<Vec<ControlDescriptor>, TemplateError> {
    let mut controls: Vec<ControlDescriptor> = graph
        .iter()
        .filter_map(|(id, node)| describe_node(id, node))
        .collect();

    if controls.is_empty() {
        return Err(TemplateError::EmptyTemplate);
    }

    controls.sort_by_key(|c| c.priority);
    Ok(controls)
}

/// Groups an ordered descriptor list into presentation rows: runs of two or
/// more adjacent numeric controls render side by side, everything else is a
/// full-width single.
pub fn layout_controls(controls: &[ControlDescriptor]) -> Vec<ControlLayout> {
    let mut layout = Vec::new();
    for (numeric, run) in &controls.iter().chunk_by(|c| c.kind.is_numeric()) {
        let run: Vec<&ControlDescriptor> = run.collect();
        if numeric && run.len() > 1 {
            layout.push(ControlLayout::Row(run.into_iter().cloned().collect()));
        } else {
            layout.extend(run.into_iter().cloned().map(ControlLayout::Single));
        }
    }
    layout
}

fn describe_node(id: &str, node: &Node) -> Option<ControlDescriptor> {
    match node.kind {
        NodeKind::Parameter => Some(describe_parameter(id, node)),
        NodeKind::DynamicInput => Some(describe_dynamic_input(id, node)),
        NodeKind::ImageInput => Some(describe_image_input(id, node)),
        _ => None,
    }
}

fn describe_parameter(id: &str, node: &Node) -> ControlDescriptor {
    let param_type = ParamType::from_tag(node.input_str("type").unwrap_or("STRING"));
    ControlDescriptor {
        node_id: id.to_string(),
        name: node.input_str("title").unwrap_or("Parameter").to_string(),
        kind: ControlKind::Value(param_type),
        default: literal_or_null(node, "default"),
        min: node.input_f64("min"),
        max: node.input_f64("max"),
        step: None,
        choices: parse_choices(node.input("choices")),
        choice_type: node.input_str("choice_type").map(str::to_string),
        multiline: false,
        priority: node.input_i64("priority").unwrap_or(0),
        randomizable: false,
        bypassable: false,
        retained: false,
    }
}

fn describe_dynamic_input(id: &str, node: &Node) -> ControlDescriptor {
    let param_type = ParamType::from_tag(node.input_str("param_type").unwrap_or("STRING"));
    ControlDescriptor {
        node_id: id.to_string(),
        name: node
            .input_str("param_name")
            .unwrap_or("Dynamic Parameter")
            .to_string(),
        kind: ControlKind::Value(param_type),
        default: literal_or_null(node, "default_value"),
        min: node.input_f64("min_value"),
        max: node.input_f64("max_value"),
        step: node.input_f64("step"),
        choices: parse_choices(node.input("choices")),
        choice_type: node.input_str("choice_type").map(str::to_string),
        // Templates authored in different editor versions disagree on the
        // field's capitalization.
        multiline: node
            .input_bool("multiline")
            .or_else(|| node.input_bool("Multiline"))
            .unwrap_or(false),
        priority: node.input_i64("priority").unwrap_or(0),
        randomizable: param_type.is_numeric()
            && node.input_bool("add_randomize_toggle").unwrap_or(false),
        bypassable: node.input_bool("add_bypass_toggle").unwrap_or(true),
        retained: true,
    }
}

fn describe_image_input(id: &str, node: &Node) -> ControlDescriptor {
    ControlDescriptor {
        node_id: id.to_string(),
        name: node
            .input_str("param_name")
            .unwrap_or("Image Input")
            .to_string(),
        kind: ControlKind::FileRef,
        default: JsonValue::String(String::new()),
        min: None,
        max: None,
        step: None,
        choices: Vec::new(),
        choice_type: None,
        multiline: false,
        priority: node.input_i64("priority").unwrap_or(0),
        randomizable: false,
        bypassable: false,
        retained: true,
    }
}

fn literal_or_null(node: &Node, field: &str) -> JsonValue {
    match node.input(field) {
        Some(FieldValue::Literal(v)) => v.clone(),
        _ => JsonValue::Null,
    }
}

/// Choices appear either as a comma-separated string (template-authored) or
/// as a JSON array (populated from the choice source).
fn parse_choices(value: Option<&FieldValue>) -> Vec<String> {
    match value {
        Some(FieldValue::Literal(JsonValue::String(s))) => s
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect(),
        Some(FieldValue::Literal(JsonValue::Array(items))) => items
            .iter()
            .filter_map(JsonValue::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
