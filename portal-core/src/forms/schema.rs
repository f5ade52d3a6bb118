// Validation schema capability + a declarative rule-based implementation.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::values::{is_empty_value, FormValues};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{path} is required")]
    Required { path: String },
    #[error("{path} must be a number")]
    NotNumeric { path: String },
    #[error("{path} must be at least {min}")]
    BelowMinimum { path: String, min: f64 },
    #[error("{path} must be at most {max}")]
    AboveMaximum { path: String, max: f64 },
    #[error("{path} must be one of: {allowed}")]
    NotAllowed { path: String, allowed: String },
    #[error("{path}: {message}")]
    Invalid { path: String, message: String },
    #[error("{path} must contain at least {min} entries")]
    TooFewEntries { path: String, min: usize },
    /// Wiring bug: the schema has no rules for the requested path.
    #[error("no validation rules registered for field '{0}'")]
    UnknownField(String),
}

/// Anything that can validate a single field path against the full value set.
pub trait Validator {
    fn validate_at(&self, path: &str, values: &FormValues) -> Result<(), ValidationError>;
}

#[derive(Debug, Clone)]
pub enum FieldRule {
    /// Value must be present and non-empty.
    Required,
    /// If present, value must be a JSON number.
    Numeric,
    Min(f64),
    Max(f64),
    OneOf(Vec<String>),
    Pattern { regex: Regex, message: String },
    /// Value must equal the value at another path (e.g. email confirmation).
    Matches { other: String, message: String },
    /// Checkbox-style attestation: value must be `true`.
    Checked,
    /// Array value with at least `min_entries`; each entry's `field` must be a number in range.
    Schedule {
        field: String,
        min_entries: usize,
        min: f64,
        max: f64,
    },
}

impl FieldRule {
    pub fn pattern(pattern: &str, message: &str) -> Result<Self, regex::Error> {
        Ok(FieldRule::Pattern {
            regex: Regex::new(pattern)?,
            message: message.to_string(),
        })
    }

    pub fn one_of(options: &[&str]) -> Self {
        FieldRule::OneOf(options.iter().map(|s| s.to_string()).collect())
    }

    fn check(&self, path: &str, value: Option<&Value>, values: &FormValues) -> Result<(), ValidationError> {
        let present = value.filter(|v| !is_empty_value(v));

        match self {
            FieldRule::Required => match present {
                Some(_) => Ok(()),
                None => Err(ValidationError::Required { path: path.to_string() }),
            },
            FieldRule::Checked => match value {
                Some(Value::Bool(true)) => Ok(()),
                _ => Err(ValidationError::Required { path: path.to_string() }),
            },
            // Remaining rules only constrain values that are actually there.
            _ if present.is_none() => Ok(()),
            FieldRule::Numeric => numeric(path, present).map(|_| ()),
            FieldRule::Min(min) => {
                if numeric(path, present)? < *min {
                    return Err(ValidationError::BelowMinimum { path: path.to_string(), min: *min });
                }
                Ok(())
            }
            FieldRule::Max(max) => {
                if numeric(path, present)? > *max {
                    return Err(ValidationError::AboveMaximum { path: path.to_string(), max: *max });
                }
                Ok(())
            }
            FieldRule::OneOf(allowed) => {
                let ok = present
                    .and_then(Value::as_str)
                    .is_some_and(|s| allowed.iter().any(|a| a == s));
                if ok {
                    Ok(())
                } else {
                    Err(ValidationError::NotAllowed {
                        path: path.to_string(),
                        allowed: allowed.join(", "),
                    })
                }
            }
            FieldRule::Pattern { regex, message } => {
                let ok = present.and_then(Value::as_str).is_some_and(|s| regex.is_match(s));
                if ok {
                    Ok(())
                } else {
                    Err(ValidationError::Invalid { path: path.to_string(), message: message.clone() })
                }
            }
            FieldRule::Matches { other, message } => {
                if present == values.get(other) {
                    Ok(())
                } else {
                    Err(ValidationError::Invalid { path: path.to_string(), message: message.clone() })
                }
            }
            FieldRule::Schedule { field, min_entries, min, max } => {
                let entries = present.and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[]);
                if entries.len() < *min_entries {
                    return Err(ValidationError::TooFewEntries { path: path.to_string(), min: *min_entries });
                }
                for (i, entry) in entries.iter().enumerate() {
                    let entry_path = format!("{}.{}.{}", path, i, field);
                    let n = numeric(&entry_path, entry.get(field.as_str()))?;
                    if n < *min {
                        return Err(ValidationError::BelowMinimum { path: entry_path, min: *min });
                    }
                    if n > *max {
                        return Err(ValidationError::AboveMaximum { path: entry_path, max: *max });
                    }
                }
                Ok(())
            }
        }
    }
}

fn numeric(path: &str, value: Option<&Value>) -> Result<f64, ValidationError> {
    value
        .and_then(Value::as_f64)
        .ok_or_else(|| ValidationError::NotNumeric { path: path.to_string() })
}

/// Path -> ordered rules. Rules run in insertion order and stop at the first failure.
#[derive(Debug, Clone, Default)]
pub struct RuleSchema {
    fields: BTreeMap<String, Vec<FieldRule>>,
}

impl RuleSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, path: &str, rules: Vec<FieldRule>) -> Self {
        self.fields.entry(path.to_string()).or_default().extend(rules);
        self
    }

    pub fn has_field(&self, path: &str) -> bool {
        self.fields.contains_key(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl Validator for RuleSchema {
    fn validate_at(&self, path: &str, values: &FormValues) -> Result<(), ValidationError> {
        let rules = self
            .fields
            .get(path)
            .ok_or_else(|| ValidationError::UnknownField(path.to_string()))?;

        let value = values.get(path);
        for rule in rules {
            rule.check(path, value, values)?;
        }
        Ok(())
    }
}
