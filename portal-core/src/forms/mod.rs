// Form helpers shared by every wizard panel: field validity, error relevance, threshold
// warnings and select/input plumbing.

pub mod schema;
pub mod therapy;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::values::{is_empty_value, FormValues};
use schema::Validator;

/// True iff every path validates. Stops at the first invalid path.
pub fn fields_are_valid<S, P>(paths: &[P], schema: &S, values: &FormValues) -> bool
where
    S: Validator + ?Sized,
    P: AsRef<str>,
{
    paths.iter().all(|path| match schema.validate_at(path.as_ref(), values) {
        Ok(()) => true,
        Err(e) => {
            debug!("[PHASE: forms] [STEP: validate] {} invalid: {}", path.as_ref(), e);
            false
        }
    })
}

/// Snapshot of a form host: current values plus the parallel error/touched maps and the
/// values the form was opened with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormikContext {
    #[serde(default)]
    pub values: FormValues,
    #[serde(default)]
    pub errors: FormValues,
    #[serde(default)]
    pub touched: FormValues,
    #[serde(default)]
    pub initial_values: FormValues,
}

impl FormikContext {
    pub fn is_touched(&self, path: &str) -> bool {
        match self.touched.get(path) {
            Some(Value::Bool(b)) => *b,
            Some(v) => !is_empty_value(v),
            None => false,
        }
    }

    /// Per-field derived state. Always recomputed, never cached.
    pub fn field_meta(&self, path: &str) -> FieldMeta {
        FieldMeta {
            touched: self.is_touched(path),
            error: self.errors.get_str(path).map(str::to_string),
            value: self.values.get(path).cloned().unwrap_or(Value::Null),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldMeta {
    pub touched: bool,
    pub error: Option<String>,
    pub value: Value,
}

/// The error at `path`, but only once it is relevant to show: the field was touched, had a
/// value when the form opened, or (with `force_touched_if_filled`) currently has a value.
pub fn get_field_error(
    path: &str,
    ctx: &FormikContext,
    force_touched_if_filled: bool,
) -> Option<String> {
    let error = ctx.errors.get_str(path).filter(|e| !e.is_empty())?;

    let relevant = ctx.is_touched(path)
        || (force_touched_if_filled && ctx.values.is_filled(path))
        || ctx.initial_values.is_filled(path);

    relevant.then(|| error.to_string())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdBound {
    pub value: f64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    #[serde(default)]
    pub low: Option<ThresholdBound>,
    #[serde(default)]
    pub high: Option<ThresholdBound>,
}

impl Threshold {
    pub fn new(low: f64, low_message: &str, high: f64, high_message: &str) -> Self {
        Self {
            low: Some(ThresholdBound { value: low, message: low_message.to_string() }),
            high: Some(ThresholdBound { value: high, message: high_message.to_string() }),
        }
    }
}

/// Advisory message when a numeric value falls outside the recommended range.
///
/// Only JSON numbers are evaluated. Strings, including numeric-looking ones such as
/// `"6"`, never produce a warning; an empty input is simply "not entered yet".
pub fn get_threshold_warning(value: &Value, threshold: &Threshold) -> Option<String> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };

    if let Some(low) = &threshold.low {
        if n < low.value {
            return Some(low.message.clone());
        }
    }
    if let Some(high) = &threshold.high {
        if n > high.value {
            return Some(high.message.clone());
        }
    }
    None
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(label: &str, value: &str) -> Self {
        Self { label: label.to_string(), value: Value::String(value.to_string()) }
    }
}

pub const DEFAULT_EMPTY_OPTION_LABEL: &str = "Select one";

/// Prepend a placeholder option. Defaults: label "Select one", value "".
pub fn add_empty_option(
    options: &[SelectOption],
    label: Option<&str>,
    value: Option<Value>,
) -> Vec<SelectOption> {
    let mut out = Vec::with_capacity(options.len() + 1);
    out.push(SelectOption {
        label: label.unwrap_or(DEFAULT_EMPTY_OPTION_LABEL).to_string(),
        value: value.unwrap_or_else(|| Value::String(String::new())),
    });
    out.extend_from_slice(options);
    out
}

/// Props every bound input receives. `value_prop` names the prop the value is exposed
/// under (inputs use "value", checkboxes "checked").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldProps {
    pub id: String,
    pub name: String,
    pub error: Option<String>,
    pub value_prop: String,
    pub value: Value,
}

pub fn common_field_props(path: &str, ctx: &FormikContext, value_prop: Option<&str>) -> FieldProps {
    FieldProps {
        id: path.to_string(),
        name: path.to_string(),
        error: get_field_error(path, ctx, false),
        value_prop: value_prop.unwrap_or("value").to_string(),
        value: ctx.values.get(path).cloned().unwrap_or(Value::Null),
    }
}

/// Round to the nearest multiple of `step`, trimming float noise to the step's precision.
pub fn round_value_to_step(value: f64, step: f64) -> f64 {
    if step <= 0.0 || !value.is_finite() {
        return value;
    }
    let decimals = step_decimals(step);
    let rounded = (value / step).round() * step;
    let factor = 10f64.powi(decimals);
    (rounded * factor).round() / factor
}

fn step_decimals(step: f64) -> i32 {
    let mut decimals = 0;
    let mut scaled = step;
    while decimals < 6 && (scaled - scaled.round()).abs() > 1e-9 {
        scaled *= 10.0;
        decimals += 1;
    }
    decimals
}
