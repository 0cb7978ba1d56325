//! Per-template form state: the current value, randomize flag, and bypass
//! flag for each declared parameter, keyed by display name.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::schema::{ControlDescriptor, ControlKind, ParamType};

/// Mutable form state for one loaded template.
///
/// Created empty on template load, seeded from durable storage, persisted on
/// every mutation by the owning session, and discarded when a different
/// template is selected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormState {
    #[serde(default)]
    pub values: BTreeMap<String, JsonValue>,
    #[serde(default)]
    pub randomize: BTreeMap<String, bool>,
    #[serde(default)]
    pub bypassed: BTreeMap<String, bool>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills in defaults for any control that has no stored value yet,
    /// coercing template defaults to the declared type the way the form
    /// layer would present them.
    pub fn seed_defaults(&mut self, controls: &[ControlDescriptor]) {
        for control in controls {
            if self.values.contains_key(&control.name) {
                continue;
            }
            let default = match control.kind {
                ControlKind::FileRef => JsonValue::String(String::new()),
                ControlKind::Value(param_type) => typed_default(&control.default, param_type),
            };
            self.values.insert(control.name.clone(), default);
        }
    }

    pub fn value(&self, name: &str) -> Option<&JsonValue> {
        self.values.get(name)
    }

    pub fn set_value(&mut self, name: impl Into<String>, value: JsonValue) {
        self.values.insert(name.into(), value);
    }

    pub fn is_randomized(&self, name: &str) -> bool {
        self.randomize.get(name).copied().unwrap_or(false)
    }

    pub fn set_randomize(&mut self, name: impl Into<String>, on: bool) {
        self.randomize.insert(name.into(), on);
    }

    pub fn is_bypassed(&self, name: &str) -> bool {
        self.bypassed.get(name).copied().unwrap_or(false)
    }

    pub fn set_bypassed(&mut self, name: impl Into<String>, on: bool) {
        self.bypassed.insert(name.into(), on);
    }
}

fn typed_default(raw: &JsonValue, param_type: ParamType) -> JsonValue {
    match param_type {
        ParamType::Int => match raw {
            JsonValue::Number(_) => raw.clone(),
            JsonValue::String(s) => s
                .trim()
                .parse::<i64>()
                .map(JsonValue::from)
                .unwrap_or_else(|_| JsonValue::from(0)),
            _ => JsonValue::from(0),
        },
        ParamType::Float => match raw {
            JsonValue::Number(_) => raw.clone(),
            JsonValue::String(s) => s
                .trim()
                .parse::<f64>()
                .map(JsonValue::from)
                .unwrap_or_else(|_| JsonValue::from(0.0)),
            _ => JsonValue::from(0.0),
        },
        ParamType::Boolean => match raw {
            JsonValue::Bool(_) => raw.clone(),
            JsonValue::String(s) => JsonValue::from(s.eq_ignore_ascii_case("true")),
            _ => JsonValue::from(false),
        },
        ParamType::String | ParamType::Dropdown => match raw {
            JsonValue::Null => JsonValue::String(String::new()),
            other => other.clone(),
        },
    }
}
