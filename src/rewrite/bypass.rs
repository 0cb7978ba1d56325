//! Bypass planning: topology-preserving removal of a node by reconnecting
//! its upstream source(s) directly to its downstream consumer(s).

use ahash::AHashMap;
use tracing::warn;

use crate::graph::{EdgeRef, Graph, NodeKind};

/// A slot-index-to-input-key correspondence for a node kind that exposes
/// more than one semantically distinct output.
///
/// The built-in entry covers the model/clip pair loader, whose output slot 0
/// carries the primary (model) channel and slot 1 the auxiliary (clip)
/// channel. Slot indices are fixed per entry; unlisted kinds are never
/// guessed at.
#[derive(Debug, Clone)]
pub struct BypassRule {
    pairs: Vec<(u32, String)>,
}

impl BypassRule {
    pub fn new(pairs: impl IntoIterator<Item = (u32, impl Into<String>)>) -> Self {
        Self {
            pairs: pairs.into_iter().map(|(s, k)| (s, k.into())).collect(),
        }
    }

    fn input_key_for_slot(&self, slot: u32) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, k)| k.as_str())
    }
}

/// The pluggable table mapping node kinds to their dual-output rewiring
/// rules. Kinds without an entry fall back to the simple 1:1 case or are
/// skipped.
#[derive(Debug, Clone)]
pub struct BypassTable {
    rules: AHashMap<String, BypassRule>,
}

impl Default for BypassTable {
    fn default() -> Self {
        let mut rules = AHashMap::new();
        rules.insert(
            "LoraLoader".to_string(),
            BypassRule::new([(0, "model"), (1, "clip")]),
        );
        Self { rules }
    }
}

impl BypassTable {
    pub fn empty() -> Self {
        Self {
            rules: AHashMap::new(),
        }
    }

    pub fn insert(&mut self, kind: impl Into<String>, rule: BypassRule) {
        self.rules.insert(kind.into(), rule);
    }

    fn rule_for(&self, kind: &NodeKind) -> Option<&BypassRule> {
        match kind {
            NodeKind::Other(name) => self.rules.get(name),
            _ => None,
        }
    }
}

/// One field rewrite produced by a bypass plan.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FieldRewire {
    pub node_id: String,
    pub field: String,
    pub to: EdgeRef,
}

/// The outcome of planning one slot's bypass.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum BypassOutcome {
    /// Rewire downstream consumers, then delete the target node and the slot.
    Rewire {
        target_id: String,
        rewires: Vec<FieldRewire>,
    },
    /// The topology does not fit a supported case; the slot and its target
    /// are left untouched and the request is dropped with a diagnostic.
    Skip,
}

/// Plans the bypass of `slot_id` against an unmodified template clone.
///
/// Planning happens before value injection so the slot's consumer is still
/// discoverable through its edge reference.
pub(crate) fn plan_bypass(
    graph: &Graph,
    slot_id: &str,
    slot_name: &str,
    table: &BypassTable,
) -> BypassOutcome {
    let consumers = graph.consumers_of(slot_id);
    let [consumer] = consumers.as_slice() else {
        warn!(
            slot = slot_name,
            consumers = consumers.len(),
            "bypass skipped: slot must have exactly one consumer"
        );
        return BypassOutcome::Skip;
    };

    let target_id = consumer.node_id.clone();
    let Some(target) = graph.get(&target_id) else {
        return BypassOutcome::Skip;
    };

    // Upstream: the target's own link fields, minus the link back to the slot.
    let upstream: Vec<(String, EdgeRef)> = target
        .links()
        .filter(|(_, link)| link.source != slot_id)
        .map(|(field, link)| (field.to_string(), link.clone()))
        .collect();

    // Downstream: every node elsewhere reading one of the target's outputs.
    let downstream = graph.consumers_of(&target_id);

    if let Some(rule) = table.rule_for(&target.kind) {
        let mut rewires = Vec::with_capacity(downstream.len());
        for conn in &downstream {
            let Some(input_key) = rule.input_key_for_slot(conn.slot) else {
                warn!(
                    slot = slot_name,
                    target = %target_id,
                    output_slot = conn.slot,
                    "bypass skipped: no rule entry for output slot"
                );
                return BypassOutcome::Skip;
            };
            let Some(source) = target.input(input_key).and_then(|v| v.as_link()) else {
                warn!(
                    slot = slot_name,
                    target = %target_id,
                    input = input_key,
                    "bypass skipped: target input is not connected"
                );
                return BypassOutcome::Skip;
            };
            rewires.push(FieldRewire {
                node_id: conn.node_id.clone(),
                field: conn.field.clone(),
                to: source.clone(),
            });
        }
        return BypassOutcome::Rewire { target_id, rewires };
    }

    // Simple case: exactly one upstream source and one downstream reader.
    if let ([(_, source)], [conn]) = (upstream.as_slice(), downstream.as_slice()) {
        return BypassOutcome::Rewire {
            target_id,
            rewires: vec![FieldRewire {
                node_id: conn.node_id.clone(),
                field: conn.field.clone(),
                to: source.clone(),
            }],
        };
    }

    warn!(
        slot = slot_name,
        target = %target_id,
        upstream = upstream.len(),
        downstream = downstream.len(),
        "bypass skipped: unsupported connection cardinality"
    );
    BypassOutcome::Skip
}
