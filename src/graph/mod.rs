//! The template graph model: an id-indexed arena of nodes whose fields
//! express data flow through [`EdgeRef`] links instead of an edge list.

use ahash::AHashMap;
use serde_json::Value as JsonValue;

use crate::error::TemplateError;

mod node;
mod value;

pub use node::{Node, NodeKind};
pub use value::{EdgeRef, FieldValue};

/// A consumer of some node's output: the consuming node id, the field that
/// holds the link, and the output slot it reads.
#[derive(Debug, Clone, PartialEq)]
pub struct Consumer {
    pub node_id: String,
    pub field: String,
    pub slot: u32,
}

/// A parameterized computation graph, keyed by node id.
///
/// Nodes are stored in an id-indexed arena with an explicit insertion-order
/// list, so iteration and serialization follow the template's document order
/// while lookups stay O(1) per node. Deep-cloning the graph is
/// a plain `clone()`; the rewriter always works on a clone so the original
/// template stays reusable across submissions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: AHashMap<String, Node>,
    order: Vec<String>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a parsed template value.
    ///
    /// Fails with [`TemplateError::MalformedTemplate`] unless the value is a
    /// JSON object mapping node ids to node shapes.
    pub fn from_value(value: JsonValue) -> Result<Self, TemplateError> {
        let JsonValue::Object(map) = value else {
            return Err(TemplateError::MalformedTemplate(
                "top level is not an object".to_string(),
            ));
        };

        let mut graph = Graph::new();
        for (id, raw) in map {
            let node: Node = serde_json::from_value(raw).map_err(|e| {
                TemplateError::MalformedTemplate(format!("node '{}': {}", id, e))
            })?;
            graph.insert(id, node);
        }
        Ok(graph)
    }

    pub fn from_json(json: &str) -> Result<Self, TemplateError> {
        let value: JsonValue = serde_json::from_str(json)
            .map_err(|e| TemplateError::JsonParseError(e.to_string()))?;
        Self::from_value(value)
    }

    /// Serializes the graph back into the node-id-keyed mapping the backend
    /// expects, preserving document order.
    pub fn to_value(&self) -> JsonValue {
        let mut map = serde_json::Map::with_capacity(self.order.len());
        for id in &self.order {
            if let Some(node) = self.nodes.get(id) {
                // Nodes always serialize; their fields are plain data.
                if let Ok(v) = serde_json::to_value(node) {
                    map.insert(id.clone(), v);
                }
            }
        }
        JsonValue::Object(map)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, node: Node) {
        let id = id.into();
        if self.nodes.insert(id.clone(), node).is_none() {
            self.order.push(id);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Node> {
        let removed = self.nodes.remove(id);
        if removed.is_some() {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    /// Iterates `(id, node)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.order
            .iter()
            .filter_map(|id| self.nodes.get(id).map(|n| (id.as_str(), n)))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Finds the first node of the given kind, in document order.
    pub fn find_by_kind(&self, kind: &NodeKind) -> Option<(&str, &Node)> {
        self.iter().find(|(_, node)| &node.kind == kind)
    }

    /// All nodes whose fields hold an edge reference to `id`, with the field
    /// name and the output slot each one reads.
    pub fn consumers_of(&self, id: &str) -> Vec<Consumer> {
        let mut consumers = Vec::new();
        for (node_id, node) in self.iter() {
            if node_id == id {
                continue;
            }
            for (field, link) in node.links() {
                if link.source == id {
                    consumers.push(Consumer {
                        node_id: node_id.to_string(),
                        field: field.to_string(),
                        slot: link.slot,
                    });
                }
            }
        }
        consumers
    }

    /// Checks that every edge reference targets a node present in the arena.
    /// Returns the first violation as `(consumer_id, missing_id)`.
    pub fn find_dangling_reference(&self) -> Option<(String, String)> {
        for (node_id, node) in self.iter() {
            for (_, link) in node.links() {
                if !self.nodes.contains_key(&link.source) {
                    return Some((node_id.to_string(), link.source.clone()));
                }
            }
        }
        None
    }
}
