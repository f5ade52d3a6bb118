// Form values addressed by dotted field paths
//
// Lookups follow the same rules the portal forms always used: a literal key equal to the
// whole path wins (errors/touched maps are often keyed flat, e.g. "user.name"), otherwise
// the path is walked segment by segment. Numeric segments index into arrays.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormValues(Value);

impl FormValues {
    pub fn new() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Look up the value at `path`, or `None` when any segment is missing.
    pub fn get(&self, path: &str) -> Option<&Value> {
        if let Some(v) = self.0.as_object().and_then(|o| o.get(path)) {
            return Some(v);
        }

        let mut current = &self.0;
        for segment in path.split('.') {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path).and_then(Value::as_f64)
    }

    /// True when a non-empty value exists at `path`.
    pub fn is_filled(&self, path: &str) -> bool {
        self.get(path).is_some_and(|v| !is_empty_value(v))
    }

    /// Set `path` to `value`, creating intermediate objects as needed.
    /// Numeric segments index into existing arrays, padding with nulls past the end.
    /// Any other non-object intermediate is replaced by an object.
    pub fn set(&mut self, path: &str, value: Value) {
        let mut current = &mut self.0;
        let mut segments = path.split('.').peekable();

        while let Some(segment) = segments.next() {
            let slot = match (current, segment.parse::<usize>().ok()) {
                (Value::Array(items), Some(index)) => {
                    if items.len() <= index {
                        items.resize(index + 1, Value::Null);
                    }
                    &mut items[index]
                }
                (other, _) => {
                    if !other.is_object() {
                        *other = Value::Object(Map::new());
                    }
                    let Value::Object(map) = other else {
                        return;
                    };
                    map.entry(segment.to_string()).or_insert(Value::Null)
                }
            };

            if segments.peek().is_none() {
                *slot = value;
                return;
            }
            current = slot;
        }
    }
}

impl From<Value> for FormValues {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Emptiness as the form layer sees it: missing/null, "", [] and {} are empty.
/// Numbers and booleans always count as filled.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}
