// Prescription form constants: per-sub-step required fields, select options and the schema.

use anyhow::Result;

use crate::forms::schema::{FieldRule, RuleSchema};
use crate::forms::therapy::{pump_ranges, BgUnits};
use crate::forms::SelectOption;
use crate::models::values::FormValues;

/// Required field paths, indexed `[step][sub_step]`. Declared per wizard screen, never derived.
pub const STEP_VALIDATION_FIELDS: &[&[&[&str]]] = &[
    // account
    &[
        &["accountType"],
        &["firstName", "lastName", "birthday"],
        &["email", "emailConfirm"],
    ],
    // profile
    &[
        &["phoneNumber.number"],
        &["mrn"],
        &["sex"],
        &["initialSettings.pumpId", "initialSettings.cgmId"],
    ],
    // therapy settings
    &[&[
        "training",
        "initialSettings.glucoseSafetyLimit",
        "initialSettings.bloodGlucoseTargetSchedule",
        "initialSettings.bloodGlucoseTargetPreprandial.low",
        "initialSettings.bloodGlucoseTargetPreprandial.high",
        "initialSettings.bloodGlucoseTargetPhysicalActivity.low",
        "initialSettings.bloodGlucoseTargetPhysicalActivity.high",
        "initialSettings.insulinModel",
        "initialSettings.basalRateSchedule",
        "initialSettings.basalRateMaximum.value",
        "initialSettings.bolusAmountMaximum.value",
        "initialSettings.carbohydrateRatioSchedule",
        "initialSettings.insulinSensitivitySchedule",
    ]],
    // review
    &[&["therapySettingsReviewed"]],
];

pub const ACCOUNT_STEP: usize = 0;
pub const PROFILE_STEP: usize = 1;
pub const THERAPY_SETTINGS_STEP: usize = 2;
pub const REVIEW_STEP: usize = 3;

/// Required paths of a sub-step, or an empty slice for an unknown position.
pub fn step_validation_fields(step: usize, sub_step: usize) -> &'static [&'static str] {
    STEP_VALIDATION_FIELDS
        .get(step)
        .and_then(|s| s.get(sub_step))
        .copied()
        .unwrap_or(&[])
}

/// Every required path of the data-entry steps (everything before review), in order.
pub fn all_entry_fields() -> Vec<&'static str> {
    STEP_VALIDATION_FIELDS[..REVIEW_STEP]
        .iter()
        .flat_map(|step| step.iter())
        .flat_map(|sub| sub.iter().copied())
        .collect()
}

pub fn account_type_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("Patient", "patient"),
        SelectOption::new("Patient and caregiver", "caregiver"),
    ]
}

pub fn sex_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("Female", "female"),
        SelectOption::new("Male", "male"),
        SelectOption::new("Not Specified", "undisclosed"),
    ]
}

pub fn training_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("Not required", "inModule"),
        SelectOption::new("Yes, Patient requires training", "inPerson"),
    ]
}

pub fn insulin_model_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("Rapid-Acting - Adult", "rapidAdult"),
        SelectOption::new("Rapid-Acting - Child", "rapidChild"),
    ]
}

fn option_values(options: &[SelectOption]) -> Vec<String> {
    options
        .iter()
        .filter_map(|o| o.value.as_str().map(str::to_string))
        .collect()
}

/// The validation schema for the prescription wizard, with glucose bounds in `units`.
/// Target minimums follow the glucose safety limit already present in `values`.
pub fn prescription_schema(units: BgUnits, values: &FormValues) -> Result<RuleSchema> {
    let ranges = pump_ranges(None, units, values);
    let numeric_in = |r: crate::forms::therapy::InputRange| {
        vec![FieldRule::Required, FieldRule::Numeric, FieldRule::Min(r.min), FieldRule::Max(r.max)]
    };
    let schedule = |field: &str, r: crate::forms::therapy::InputRange| {
        vec![
            FieldRule::Required,
            FieldRule::Schedule { field: field.to_string(), min_entries: 1, min: r.min, max: r.max },
        ]
    };

    let schema = RuleSchema::new()
        .field(
            "accountType",
            vec![FieldRule::Required, FieldRule::OneOf(option_values(&account_type_options()))],
        )
        .field("firstName", vec![FieldRule::Required])
        .field("lastName", vec![FieldRule::Required])
        .field(
            "birthday",
            vec![
                FieldRule::Required,
                FieldRule::pattern(r"^\d{4}-\d{2}-\d{2}$", "Please enter a date in the form YYYY-MM-DD")?,
            ],
        )
        .field(
            "email",
            vec![
                FieldRule::Required,
                FieldRule::pattern(r"^[^@\s]+@[^@\s]+\.[^@\s]+$", "Please enter a valid email address")?,
            ],
        )
        .field(
            "emailConfirm",
            vec![
                FieldRule::Required,
                FieldRule::Matches { other: "email".to_string(), message: "Email does not match".to_string() },
            ],
        )
        .field(
            "phoneNumber.number",
            vec![
                FieldRule::Required,
                FieldRule::pattern(r"^\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}$", "Please enter a valid phone number")?,
            ],
        )
        .field("mrn", vec![FieldRule::Required])
        .field("sex", vec![FieldRule::Required, FieldRule::OneOf(option_values(&sex_options()))])
        .field("initialSettings.pumpId", vec![FieldRule::Required])
        .field("initialSettings.cgmId", vec![FieldRule::Required])
        .field("training", vec![FieldRule::Required, FieldRule::OneOf(option_values(&training_options()))])
        .field("initialSettings.glucoseSafetyLimit", numeric_in(ranges.glucose_safety_limit))
        .field(
            "initialSettings.bloodGlucoseTargetSchedule",
            schedule("low", ranges.blood_glucose_target),
        )
        .field(
            "initialSettings.bloodGlucoseTargetPreprandial.low",
            numeric_in(ranges.blood_glucose_target_preprandial),
        )
        .field(
            "initialSettings.bloodGlucoseTargetPreprandial.high",
            numeric_in(ranges.blood_glucose_target_preprandial),
        )
        .field(
            "initialSettings.bloodGlucoseTargetPhysicalActivity.low",
            numeric_in(ranges.blood_glucose_target_physical_activity),
        )
        .field(
            "initialSettings.bloodGlucoseTargetPhysicalActivity.high",
            numeric_in(ranges.blood_glucose_target_physical_activity),
        )
        .field(
            "initialSettings.insulinModel",
            vec![FieldRule::Required, FieldRule::OneOf(option_values(&insulin_model_options()))],
        )
        .field("initialSettings.basalRateSchedule", schedule("rate", ranges.basal_rate))
        .field("initialSettings.basalRateMaximum.value", numeric_in(ranges.basal_rate_maximum))
        .field("initialSettings.bolusAmountMaximum.value", numeric_in(ranges.bolus_amount_maximum))
        .field("initialSettings.carbohydrateRatioSchedule", schedule("amount", ranges.carb_ratio))
        .field(
            "initialSettings.insulinSensitivitySchedule",
            schedule("amount", ranges.insulin_sensitivity_factor),
        )
        .field("therapySettingsReviewed", vec![FieldRule::Checked]);

    Ok(schema)
}
