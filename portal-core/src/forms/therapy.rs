// Therapy settings: input ranges and advisory warning thresholds per blood glucose unit.
//
// Ranges bound what the inputs accept; thresholds only produce warnings. All glucose values
// are defined in mg/dL and converted for mmol/L.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{get_threshold_warning, Threshold, ThresholdBound};
use crate::models::devices::Device;
use crate::models::values::FormValues;

pub const MGDL_PER_MMOLL: f64 = 18.01559;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BgUnits {
    #[default]
    #[serde(rename = "mg/dL")]
    MgDl,
    #[serde(rename = "mmol/L")]
    MmolL,
}

impl BgUnits {
    pub fn as_str(&self) -> &'static str {
        match self {
            BgUnits::MgDl => "mg/dL",
            BgUnits::MmolL => "mmol/L",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mg/dl" => Some(BgUnits::MgDl),
            "mmol/l" => Some(BgUnits::MmolL),
            _ => None,
        }
    }

    /// Convert a mg/dL quantity into these units.
    fn from_mgdl(&self, mgdl: f64) -> f64 {
        match self {
            BgUnits::MgDl => mgdl,
            BgUnits::MmolL => (mgdl / MGDL_PER_MMOLL * 10.0).round() / 10.0,
        }
    }

    fn step(&self) -> f64 {
        match self {
            BgUnits::MgDl => 1.0,
            BgUnits::MmolL => 0.1,
        }
    }
}

/// Units recorded on the form, falling back to `fallback` when unset or unknown.
pub fn form_bg_units(values: &FormValues, fallback: BgUnits) -> BgUnits {
    values
        .get_str("initialSettings.bloodGlucoseUnits")
        .and_then(BgUnits::parse)
        .unwrap_or(fallback)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InputRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpRanges {
    pub glucose_safety_limit: InputRange,
    pub blood_glucose_target: InputRange,
    pub blood_glucose_target_preprandial: InputRange,
    pub blood_glucose_target_physical_activity: InputRange,
    pub basal_rate: InputRange,
    pub basal_rate_maximum: InputRange,
    pub bolus_amount_maximum: InputRange,
    pub carb_ratio: InputRange,
    pub insulin_sensitivity_factor: InputRange,
}

fn glucose_range(units: BgUnits, min_mgdl: f64, max_mgdl: f64) -> InputRange {
    InputRange {
        min: units.from_mgdl(min_mgdl),
        max: units.from_mgdl(max_mgdl),
        step: units.step(),
    }
}

/// Input ranges for the therapy settings form. The pump is accepted for parity with
/// device-specific limits; every supported pump currently shares the same ranges.
pub fn pump_ranges(_pump: Option<&Device>, units: BgUnits, values: &FormValues) -> PumpRanges {
    // Correction targets may not go below the glucose safety limit once it is set.
    let safety_limit_mgdl = values
        .get_f64("initialSettings.glucoseSafetyLimit")
        .map(|v| match units {
            BgUnits::MgDl => v,
            BgUnits::MmolL => v * MGDL_PER_MMOLL,
        })
        .unwrap_or(67.0);

    PumpRanges {
        glucose_safety_limit: glucose_range(units, 67.0, 110.0),
        blood_glucose_target: glucose_range(units, safety_limit_mgdl.max(60.0), 180.0),
        blood_glucose_target_preprandial: glucose_range(units, safety_limit_mgdl.max(60.0), 130.0),
        blood_glucose_target_physical_activity: glucose_range(units, safety_limit_mgdl.max(60.0), 250.0),
        basal_rate: InputRange { min: 0.05, max: 30.0, step: 0.05 },
        basal_rate_maximum: InputRange { min: 0.0, max: 30.0, step: 0.05 },
        bolus_amount_maximum: InputRange { min: 0.05, max: 30.0, step: 0.05 },
        carb_ratio: InputRange { min: 2.0, max: 150.0, step: 0.01 },
        insulin_sensitivity_factor: glucose_range(units, 10.0, 500.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarningThresholds {
    pub glucose_safety_limit: Threshold,
    pub blood_glucose_target: Threshold,
    pub blood_glucose_target_preprandial: Threshold,
    pub blood_glucose_target_physical_activity: Threshold,
    pub basal_rate: Threshold,
    pub basal_rate_maximum: Threshold,
    pub bolus_amount_maximum: Threshold,
    pub carb_ratio: Threshold,
    pub insulin_sensitivity_factor: Threshold,
}

const LOWER_THAN_RECOMMENDED: &str =
    "The value you have chosen is lower than Tidepool generally recommends.";
const HIGHER_THAN_RECOMMENDED: &str =
    "The value you have chosen is higher than Tidepool generally recommends.";

fn recommended(low: f64, high: f64) -> Threshold {
    Threshold::new(low, LOWER_THAN_RECOMMENDED, high, HIGHER_THAN_RECOMMENDED)
}

fn glucose_recommended(units: BgUnits, low_mgdl: f64, high_mgdl: f64) -> Threshold {
    recommended(units.from_mgdl(low_mgdl), units.from_mgdl(high_mgdl))
}

/// Advisory thresholds. The max basal warning scales with the highest scheduled basal rate.
pub fn warning_thresholds(_pump: Option<&Device>, units: BgUnits, values: &FormValues) -> WarningThresholds {
    let highest_basal = values
        .get("initialSettings.basalRateSchedule")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|e| e.get("rate").and_then(Value::as_f64))
                .fold(0.0_f64, f64::max)
        })
        .unwrap_or(0.0);

    let basal_max_high = if highest_basal > 0.0 {
        (highest_basal * 6.4 * 100.0).round() / 100.0
    } else {
        30.0
    };

    WarningThresholds {
        glucose_safety_limit: glucose_recommended(units, 74.0, 80.0),
        blood_glucose_target: glucose_recommended(units, 100.0, 115.0),
        blood_glucose_target_preprandial: glucose_recommended(units, 80.0, 130.0),
        blood_glucose_target_physical_activity: glucose_recommended(units, 100.0, 180.0),
        basal_rate: recommended(0.1, 5.0),
        basal_rate_maximum: Threshold {
            low: None,
            high: Some(ThresholdBound {
                value: basal_max_high,
                message: HIGHER_THAN_RECOMMENDED.to_string(),
            }),
        },
        bolus_amount_maximum: recommended(0.1, 20.0),
        carb_ratio: recommended(4.0, 28.0),
        insulin_sensitivity_factor: glucose_recommended(units, 16.0, 399.0),
    }
}

/// Every scalar therapy input paired with its threshold, in form order.
pub fn scalar_threshold_fields(thresholds: &WarningThresholds) -> Vec<(&'static str, &Threshold)> {
    vec![
        ("initialSettings.glucoseSafetyLimit", &thresholds.glucose_safety_limit),
        ("initialSettings.bloodGlucoseTargetPreprandial.low", &thresholds.blood_glucose_target_preprandial),
        ("initialSettings.bloodGlucoseTargetPreprandial.high", &thresholds.blood_glucose_target_preprandial),
        ("initialSettings.bloodGlucoseTargetPhysicalActivity.low", &thresholds.blood_glucose_target_physical_activity),
        ("initialSettings.bloodGlucoseTargetPhysicalActivity.high", &thresholds.blood_glucose_target_physical_activity),
        ("initialSettings.basalRateMaximum.value", &thresholds.basal_rate_maximum),
        ("initialSettings.bolusAmountMaximum.value", &thresholds.bolus_amount_maximum),
    ]
}

const TARGET_FIELDS: &[&str] = &["low", "high"];
const RATE_FIELDS: &[&str] = &["rate"];
const AMOUNT_FIELDS: &[&str] = &["amount"];

/// Schedule inputs: (schedule path, entry fields, threshold).
pub fn schedule_threshold_fields(
    thresholds: &WarningThresholds,
) -> Vec<(&'static str, &'static [&'static str], &Threshold)> {
    vec![
        ("initialSettings.bloodGlucoseTargetSchedule", TARGET_FIELDS, &thresholds.blood_glucose_target),
        ("initialSettings.basalRateSchedule", RATE_FIELDS, &thresholds.basal_rate),
        ("initialSettings.carbohydrateRatioSchedule", AMOUNT_FIELDS, &thresholds.carb_ratio),
        ("initialSettings.insulinSensitivitySchedule", AMOUNT_FIELDS, &thresholds.insulin_sensitivity_factor),
    ]
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldWarning {
    pub path: String,
    pub message: String,
}

/// All active threshold warnings for the current values, scalar inputs first.
pub fn collect_threshold_warnings(thresholds: &WarningThresholds, values: &FormValues) -> Vec<FieldWarning> {
    let mut warnings = Vec::new();

    for (path, threshold) in scalar_threshold_fields(thresholds) {
        if let Some(message) = values.get(path).and_then(|v| get_threshold_warning(v, threshold)) {
            warnings.push(FieldWarning { path: path.to_string(), message });
        }
    }

    for (path, fields, threshold) in schedule_threshold_fields(thresholds) {
        let Some(entries) = values.get(path).and_then(Value::as_array) else {
            continue;
        };
        for (i, entry) in entries.iter().enumerate() {
            for field in fields {
                if let Some(message) = entry.get(*field).and_then(|v| get_threshold_warning(v, threshold)) {
                    warnings.push(FieldWarning { path: format!("{}.{}.{}", path, i, field), message });
                }
            }
        }
    }

    warnings
}
