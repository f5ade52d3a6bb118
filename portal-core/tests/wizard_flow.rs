//! End-to-end wizard tests against the real prescription schema.

use prescription_portal::config::PortalConfig;
use prescription_portal::forms::therapy::{collect_threshold_warnings, warning_thresholds, BgUnits};
use prescription_portal::models::devices::{Device, DeviceCatalog, DEVICE_ID_DEXCOM_G6, DEVICE_ID_PALMTREE};
use prescription_portal::models::values::FormValues;
use prescription_portal::prescription::constants::{prescription_schema, PROFILE_STEP, REVIEW_STEP};
use prescription_portal::prescription::{
    get_form_steps, Advance, FormStepOptions, NoopHandlers, StepDefinition, WizardNavigator,
};
use serde_json::json;

// ============================================================================
// Fixtures
// ============================================================================

fn complete_values() -> FormValues {
    FormValues::from(json!({
        "accountType": "patient",
        "firstName": "Jill",
        "lastName": "Jellyfish",
        "birthday": "1990-01-15",
        "email": "jill@example.com",
        "emailConfirm": "jill@example.com",
        "phoneNumber": { "number": "(555) 123-4567" },
        "mrn": "MRN-1234",
        "sex": "female",
        "training": "inPerson",
        "therapySettingsReviewed": true,
        "initialSettings": {
            "bloodGlucoseUnits": "mg/dL",
            "pumpId": DEVICE_ID_PALMTREE,
            "cgmId": DEVICE_ID_DEXCOM_G6,
            "glucoseSafetyLimit": 75,
            "bloodGlucoseTargetSchedule": [{ "start": 0, "low": 100, "high": 110 }],
            "bloodGlucoseTargetPreprandial": { "low": 90, "high": 110 },
            "bloodGlucoseTargetPhysicalActivity": { "low": 140, "high": 160 },
            "insulinModel": "rapidAdult",
            "basalRateSchedule": [{ "start": 0, "rate": 0.5 }],
            "basalRateMaximum": { "value": 3 },
            "bolusAmountMaximum": { "value": 10 },
            "carbohydrateRatioSchedule": [{ "start": 0, "amount": 10 }],
            "insulinSensitivitySchedule": [{ "start": 0, "amount": 50 }]
        }
    }))
}

fn devices() -> DeviceCatalog {
    DeviceCatalog {
        pumps: vec![Device::new(DEVICE_ID_PALMTREE, "Palmtree")],
        cgms: vec![Device::new(DEVICE_ID_DEXCOM_G6, "Dexcom G6")],
    }
}

fn build(values: &FormValues, options: &FormStepOptions) -> Vec<StepDefinition> {
    let schema = prescription_schema(BgUnits::MgDl, values).unwrap();
    get_form_steps(&schema, &devices(), values, &NoopHandlers, options)
}

fn prescriber() -> FormStepOptions {
    FormStepOptions { is_prescriber: true, ..FormStepOptions::default() }
}

// ============================================================================
// Step building
// ============================================================================

#[test]
fn complete_prescription_enables_every_sub_step() {
    let steps = build(&complete_values(), &prescriber());
    for step in &steps {
        for (i, sub) in step.sub_steps.iter().enumerate() {
            assert!(
                !sub.disable_complete,
                "{} sub-step {} should be completable",
                step.key.as_str(),
                i
            );
        }
    }
}

#[test]
fn email_confirmation_must_match() {
    let mut values = complete_values();
    values.set("emailConfirm", json!("jill@example.org"));
    let steps = build(&values, &prescriber());
    assert!(steps[0].sub_steps[2].disable_complete);
    assert!(!steps[0].sub_steps[1].disable_complete);
    assert!(steps[REVIEW_STEP].sub_steps[0].disable_complete, "review requires every entry field");
}

#[test]
fn out_of_range_therapy_value_blocks_therapy_step() {
    let mut values = complete_values();
    values.set("initialSettings.bolusAmountMaximum.value", json!(45));
    let steps = build(&values, &prescriber());
    assert!(steps[2].sub_steps[0].disable_complete);
    assert!(!steps[PROFILE_STEP].sub_steps[3].disable_complete);
}

#[test]
fn unchecked_attestation_blocks_prescriber_review_only() {
    let mut values = complete_values();
    values.set("therapySettingsReviewed", json!(false));

    let steps = build(&values, &prescriber());
    assert!(steps[REVIEW_STEP].sub_steps[0].disable_complete);

    let steps = build(&values, &FormStepOptions::default());
    assert!(!steps[REVIEW_STEP].sub_steps[0].disable_complete);
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn navigator_walks_a_complete_prescription_to_the_end() {
    let values = complete_values();
    let mut nav = WizardNavigator::new(build(&values, &prescriber()));

    let total: usize = nav.steps().iter().map(|s| s.sub_steps.len()).sum();
    for _ in 0..total - 1 {
        assert!(matches!(nav.complete(&NoopHandlers, &values).unwrap(), Advance::Moved(_)));
    }
    assert_eq!(nav.complete(&NoopHandlers, &values).unwrap(), Advance::Finished);
}

#[test]
fn navigator_stops_at_missing_mrn_until_rebuilt() {
    let mut values = complete_values();
    values.set("mrn", json!(""));
    let mut nav = WizardNavigator::new(build(&values, &prescriber()));

    // account (3 sub-steps) + phone
    for _ in 0..4 {
        nav.complete(&NoopHandlers, &values).unwrap();
    }
    assert!(nav.complete(&NoopHandlers, &values).is_err());

    values.set("mrn", json!("MRN-1234"));
    nav.set_steps(build(&values, &prescriber()));
    assert!(nav.complete(&NoopHandlers, &values).is_ok());
}

// ============================================================================
// Threshold warnings
// ============================================================================

#[test]
fn recommended_values_produce_no_warnings() {
    let values = complete_values();
    let thresholds = warning_thresholds(devices().selected_pump(&values), BgUnits::MgDl, &values);
    assert!(collect_threshold_warnings(&thresholds, &values).is_empty());
}

#[test]
fn high_bolus_maximum_warns() {
    let mut values = complete_values();
    values.set("initialSettings.bolusAmountMaximum.value", json!(25));
    let thresholds = warning_thresholds(None, BgUnits::MgDl, &values);
    let warnings = collect_threshold_warnings(&thresholds, &values);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].path, "initialSettings.bolusAmountMaximum.value");
    assert!(warnings[0].message.contains("higher"));
}

// ============================================================================
// CLI reports
// ============================================================================

#[test]
fn steps_report_reads_inputs_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let values_path = dir.path().join("values.json");
    let devices_path = dir.path().join("devices.json");
    std::fs::write(&values_path, serde_json::to_string(&complete_values()).unwrap()).unwrap();
    std::fs::write(&devices_path, serde_json::to_string(&devices()).unwrap()).unwrap();

    let cfg = PortalConfig { is_prescriber: true, ..PortalConfig::default() };
    let report = prescription_portal::steps_report(&cfg, &values_path, Some(&devices_path)).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();

    assert_eq!(parsed[1]["label"], "Complete Patient Profile");
    assert_eq!(parsed[3]["label"], "Review and Send Prescription");
    assert_eq!(parsed[1]["subSteps"][3]["panelContent"]["type"], "patientDevices");
}

#[test]
fn steps_report_fails_on_unreadable_values() {
    let dir = tempfile::tempdir().unwrap();
    let values_path = dir.path().join("values.json");
    std::fs::write(&values_path, "{ not json").unwrap();

    let err = prescription_portal::steps_report(&PortalConfig::default(), &values_path, None).unwrap_err();
    assert!(format!("{:#}", err).contains("Failed to parse form values"), "{:#}", err);
}
