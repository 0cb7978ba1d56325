//! The graph rewriter: applies resolved values and bypass removals to a
//! cloned template, producing the submission-ready graph.

use std::time::{SystemTime, UNIX_EPOCH};

use ahash::AHashSet;
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

use crate::error::ResolveError;
use crate::graph::{FieldValue, Graph, NodeKind};
use crate::resolver::ResolvedValues;
use crate::schema::{ControlDescriptor, ControlKind};

mod bypass;

pub use bypass::{BypassRule, BypassTable};
use bypass::{BypassOutcome, plan_bypass};

/// Field renames the backend requires on the sink node's input set.
const SINK_RENAMES: &[(&str, &str)] = &[("image", "images")];

/// Metadata key carrying the per-submission distinguishing token.
const SUBMISSION_TOKEN_KEY: &str = "tenkai_unique_id";

/// Rewrites a template graph into its resolved, submission-ready form.
///
/// The rewriter is stateless between calls; it always works on a deep clone
/// of the template, so one loaded template can back any number of
/// submissions.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
    bypass_table: BypassTable,
}

impl Rewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an additional dual-output bypass rule for a node kind.
    pub fn with_bypass_rule(mut self, kind: impl Into<String>, rule: BypassRule) -> Self {
        self.bypass_table.insert(kind, rule);
        self
    }

    /// Produces the resolved graph, tagging it with a fresh timestamp token.
    pub fn resolve(
        &self,
        template: &Graph,
        controls: &[ControlDescriptor],
        values: &ResolvedValues,
        bypassed: impl Fn(&ControlDescriptor) -> bool,
    ) -> Result<Graph, ResolveError> {
        self.resolve_with_token(template, controls, values, bypassed, now_millis())
    }

    /// As [`Rewriter::resolve`], with an explicit submission token.
    pub fn resolve_with_token(
        &self,
        template: &Graph,
        controls: &[ControlDescriptor],
        values: &ResolvedValues,
        bypassed: impl Fn(&ControlDescriptor) -> bool,
        token: u64,
    ) -> Result<Graph, ResolveError> {
        let mut graph = template.clone();

        // Bypass plans are computed against the pristine clone: once values
        // are injected the slot-to-consumer edges no longer exist.
        let mut plans = Vec::new();
        let mut removed_slots: AHashSet<String> = AHashSet::new();
        for control in controls {
            if !(control.bypassable && bypassed(control)) {
                continue;
            }
            match plan_bypass(&graph, &control.node_id, &control.name, &self.bypass_table) {
                BypassOutcome::Rewire { target_id, rewires } => {
                    removed_slots.insert(control.node_id.clone());
                    plans.push((control.node_id.clone(), target_id, rewires));
                }
                BypassOutcome::Skip => {}
            }
        }

        // 1. Value injection.
        for control in controls {
            if removed_slots.contains(&control.node_id) {
                continue;
            }
            let Some(value) = values.get(&control.node_id) else {
                continue;
            };

            if control.kind == ControlKind::FileRef
                && value.as_str().is_none_or(str::is_empty)
            {
                return Err(ResolveError::MissingRequiredImage {
                    name: control.name.clone(),
                });
            }

            for consumer in graph.consumers_of(&control.node_id) {
                if let Some(node) = graph.get_mut(&consumer.node_id) {
                    node.inputs
                        .insert(consumer.field, FieldValue::Literal(value.clone()));
                }
            }

            if control.retained {
                let own_field = match control.kind {
                    ControlKind::FileRef => "image_filename",
                    ControlKind::Value(_) => "default_value",
                };
                if let Some(node) = graph.get_mut(&control.node_id) {
                    node.inputs
                        .insert(own_field.to_string(), FieldValue::Literal(value.clone()));
                }
            }
        }

        // 2. Parameter slot deletion: plain parameter slots carry no residual
        // identity once their value has been propagated.
        let parameter_ids: Vec<String> = graph
            .iter()
            .filter(|(_, node)| node.kind == NodeKind::Parameter)
            .map(|(id, _)| id.to_string())
            .collect();
        for id in parameter_ids {
            graph.remove(&id);
        }

        // 3. Bypass rewiring.
        for (slot_id, target_id, rewires) in plans {
            for rewire in rewires {
                if let Some(node) = graph.get_mut(&rewire.node_id) {
                    node.inputs.insert(rewire.field, FieldValue::Link(rewire.to));
                }
            }
            graph.remove(&target_id);
            graph.remove(&slot_id);
            debug!(slot = %slot_id, target = %target_id, "bypassed and removed");
        }

        // 4. Submission tagging on the sink node.
        if let Some((sink_id, _)) = graph.find_by_kind(&NodeKind::Output) {
            let sink_id = sink_id.to_string();
            if let Some(sink) = graph.get_mut(&sink_id) {
                let mut info = match sink.inputs.remove("extra_pnginfo") {
                    Some(FieldValue::Literal(JsonValue::Object(map))) => map,
                    _ => JsonMap::new(),
                };
                info.insert(SUBMISSION_TOKEN_KEY.to_string(), JsonValue::from(token));
                sink.inputs.insert(
                    "extra_pnginfo".to_string(),
                    FieldValue::Literal(JsonValue::Object(info)),
                );

                // 5. Backend-required field renames.
                for (from, to) in SINK_RENAMES {
                    if let Some(value) = sink.inputs.remove(*from) {
                        sink.inputs.entry((*to).to_string()).or_insert(value);
                    }
                }
            }
        }

        // The resolved graph must be closed under references before it is
        // handed to the submission client.
        if let Some((consumer, missing)) = graph.find_dangling_reference() {
            return Err(ResolveError::DanglingReference {
                missing_node_id: missing,
                consumer_node_id: consumer,
            });
        }

        Ok(graph)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
