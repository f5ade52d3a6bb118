//! Property-based tests for the step builder, threshold evaluation and working-state reducer.

use proptest::prelude::*;
use prescription_portal::forms::schema::{ValidationError, Validator};
use prescription_portal::forms::{get_threshold_warning, Threshold};
use prescription_portal::models::devices::DeviceCatalog;
use prescription_portal::models::values::FormValues;
use prescription_portal::prescription::constants::{REVIEW_STEP, STEP_VALIDATION_FIELDS};
use prescription_portal::prescription::{get_form_steps, FormStepOptions, NoopHandlers};
use prescription_portal::working::{Operation, WorkingAction, WorkingStates};
use serde_json::json;

/// Fails any field holding "badField".
struct BadFieldSchema;

impl Validator for BadFieldSchema {
    fn validate_at(&self, path: &str, values: &FormValues) -> Result<(), ValidationError> {
        if values.get_str(path) == Some("badField") {
            return Err(ValidationError::Invalid { path: path.to_string(), message: "bad".into() });
        }
        Ok(())
    }
}

// ============================================================================
// Strategy Generators
// ============================================================================

/// Every required path of the data-entry steps with its (step, sub-step) position.
fn entry_paths() -> Vec<(usize, usize, &'static str)> {
    let mut out = Vec::new();
    for (step, subs) in STEP_VALIDATION_FIELDS[..REVIEW_STEP].iter().enumerate() {
        for (sub, paths) in subs.iter().enumerate() {
            for path in paths.iter() {
                out.push((step, sub, *path));
            }
        }
    }
    out
}

fn entry_path_strategy() -> impl Strategy<Value = (usize, usize, &'static str)> {
    prop::sample::select(entry_paths())
}

/// A values document where a random subset of entry paths is invalid.
fn values_strategy() -> impl Strategy<Value = FormValues> {
    let paths = entry_paths();
    prop::collection::vec(any::<bool>(), paths.len()).prop_map(move |bad| {
        let mut values = FormValues::new();
        for ((_, _, path), is_bad) in paths.iter().zip(bad) {
            values.set(path, json!(if is_bad { "badField" } else { "goodField" }));
        }
        values
    })
}

fn operation_strategy() -> impl Strategy<Value = Operation> {
    prop::sample::select(Operation::ALL.to_vec())
}

fn action_strategy() -> impl Strategy<Value = WorkingAction> {
    prop_oneof![
        operation_strategy().prop_map(WorkingAction::Request),
        operation_strategy().prop_map(WorkingAction::Success),
        (operation_strategy(), "[a-z ]{1,20}").prop_map(|(op, m)| WorkingAction::Failure(op, m)),
        operation_strategy().prop_map(WorkingAction::Reset),
    ]
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    /// Identical inputs always build equal steps
    #[test]
    fn building_is_deterministic(values in values_strategy(), prescriber in any::<bool>()) {
        let options = FormStepOptions { is_prescriber: prescriber, ..FormStepOptions::default() };
        let devices = DeviceCatalog::default();
        let a = get_form_steps(&BadFieldSchema, &devices, &values, &NoopHandlers, &options);
        let b = get_form_steps(&BadFieldSchema, &devices, &values, &NoopHandlers, &options);
        prop_assert_eq!(a, b);
    }

    /// Invalidating one required path disables exactly the data-entry sub-step that owns it
    #[test]
    fn invalid_field_disables_only_its_sub_step((step, sub, path) in entry_path_strategy()) {
        let mut values = FormValues::new();
        for (_, _, p) in entry_paths() {
            values.set(p, json!("goodField"));
        }
        values.set(path, json!("badField"));

        let steps = get_form_steps(
            &BadFieldSchema,
            &DeviceCatalog::default(),
            &values,
            &NoopHandlers,
            &FormStepOptions::default(),
        );
        for (i, definition) in steps[..REVIEW_STEP].iter().enumerate() {
            for (j, sub_step) in definition.sub_steps.iter().enumerate() {
                prop_assert_eq!(sub_step.disable_complete, i == step && j == sub);
            }
        }
        prop_assert!(steps[REVIEW_STEP].sub_steps[0].disable_complete);
    }

    /// Values inside the inclusive bounds never warn; values outside always do
    #[test]
    fn threshold_bounds_are_inclusive(low in -100.0f64..100.0, width in 0.0f64..100.0, x in -300.0f64..300.0) {
        let high = low + width;
        let threshold = Threshold::new(low, "low", high, "high");
        let warning = get_threshold_warning(&json!(x), &threshold);
        let expected = if x < low {
            Some("low".to_string())
        } else if x > high {
            Some("high".to_string())
        } else {
            None
        };
        prop_assert_eq!(warning, expected);
    }

    /// A reducer step only ever changes the addressed operation
    #[test]
    fn reduce_touches_only_addressed_operation(
        history in prop::collection::vec(action_strategy(), 0..20),
        action in action_strategy(),
    ) {
        let before = history.iter().fold(WorkingStates::new(), |s, a| s.reduce(a));
        let after = before.reduce(&action);
        for op in Operation::ALL {
            if op != action.operation() {
                prop_assert_eq!(before.get(op), after.get(op));
            }
        }
    }
}
