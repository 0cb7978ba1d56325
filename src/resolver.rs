//! The value resolver: computes the concrete scalar each parameter node
//! contributes, applying randomization and type coercion.

use ahash::AHashMap;
use rand::Rng;
use serde_json::Value as JsonValue;

use crate::form::FormState;
use crate::schema::{ControlDescriptor, ControlKind, ParamType};

/// Default randomization bounds when a slot declares none.
const DEFAULT_RANDOM_MIN: f64 = 0.0;
const DEFAULT_RANDOM_MAX: f64 = 1_000_000.0;

/// The resolved scalar for every parameter slot, keyed by node id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedValues {
    by_node: AHashMap<String, JsonValue>,
}

impl ResolvedValues {
    pub fn get(&self, node_id: &str) -> Option<&JsonValue> {
        self.by_node.get(node_id)
    }

    pub fn insert(&mut self, node_id: impl Into<String>, value: JsonValue) {
        self.by_node.insert(node_id.into(), value);
    }

    pub fn len(&self) -> usize {
        self.by_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_node.is_empty()
    }
}

/// Resolves every control against the current form state.
///
/// Randomized numeric slots get a fresh uniform draw over `[min, max]` on
/// every call — never cached — and the drawn value is written back into the
/// form state so the caller can persist and display what was actually used.
/// Everything else is the stored form value coerced to the declared type.
pub fn resolve_values<R: Rng>(
    controls: &[ControlDescriptor],
    form: &mut FormState,
    rng: &mut R,
) -> ResolvedValues {
    let mut resolved = ResolvedValues::default();

    for control in controls {
        let value = match control.kind {
            ControlKind::FileRef => JsonValue::String(
                form.value(&control.name)
                    .and_then(JsonValue::as_str)
                    .unwrap_or_default()
                    .to_string(),
            ),
            ControlKind::Value(param_type) => {
                let raw = if control.randomizable
                    && param_type.is_numeric()
                    && form.is_randomized(&control.name)
                {
                    let drawn = draw_random(control, param_type, rng);
                    form.set_value(control.name.clone(), drawn.clone());
                    drawn
                } else {
                    form.value(&control.name)
                        .cloned()
                        .unwrap_or_else(|| control.default.clone())
                };
                coerce(&raw, param_type)
            }
        };
        resolved.insert(control.node_id.clone(), value);
    }

    resolved
}

fn draw_random<R: Rng>(
    control: &ControlDescriptor,
    param_type: ParamType,
    rng: &mut R,
) -> JsonValue {
    let min = control.min.unwrap_or(DEFAULT_RANDOM_MIN);
    let max = control.max.unwrap_or(DEFAULT_RANDOM_MAX);
    match param_type {
        ParamType::Int => {
            let lo = min.floor() as i64;
            let hi = (max.floor() as i64).max(lo);
            JsonValue::from(rng.random_range(lo..=hi))
        }
        _ => {
            // Templates are externally authored; inverted bounds collapse
            // to the declared minimum instead of panicking.
            let hi = max.max(min);
            JsonValue::from(rng.random_range(min..=hi))
        }
    }
}

/// Coerces a stored form value to the slot's declared type.
///
/// Parse failures fall back to `0` / `0.0` rather than erroring, so a stale
/// or hand-edited form entry can never block a submission.
pub fn coerce(value: &JsonValue, param_type: ParamType) -> JsonValue {
    match param_type {
        ParamType::Int => match value {
            JsonValue::Number(n) => JsonValue::from(n.as_i64().unwrap_or(0)),
            JsonValue::String(s) => {
                JsonValue::from(s.trim().parse::<i64>().unwrap_or(0))
            }
            _ => JsonValue::from(0),
        },
        ParamType::Float => match value {
            JsonValue::Number(n) => JsonValue::from(n.as_f64().unwrap_or(0.0)),
            JsonValue::String(s) => {
                JsonValue::from(s.trim().parse::<f64>().unwrap_or(0.0))
            }
            _ => JsonValue::from(0.0),
        },
        ParamType::Boolean => match value {
            JsonValue::Bool(b) => JsonValue::from(*b),
            JsonValue::String(s) => JsonValue::from(s.eq_ignore_ascii_case("true")),
            _ => JsonValue::from(false),
        },
        ParamType::String | ParamType::Dropdown => match value {
            JsonValue::Null => JsonValue::String(String::new()),
            JsonValue::String(s) => JsonValue::String(s.clone()),
            other => JsonValue::String(other.to_string()),
        },
    }
}
