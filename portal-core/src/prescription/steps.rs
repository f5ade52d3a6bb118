// Prescription wizard step definitions.
//
// Steps are rebuilt from scratch whenever the schema, devices, values or options change.
// Building is pure: it validates, looks things up and assembles data, nothing else.

use serde::Serialize;

use super::constants::{
    all_entry_fields, step_validation_fields, ACCOUNT_STEP, PROFILE_STEP, REVIEW_STEP,
    THERAPY_SETTINGS_STEP,
};
use crate::forms::fields_are_valid;
use crate::forms::schema::Validator;
use crate::forms::therapy::{form_bg_units, warning_thresholds, BgUnits, WarningThresholds};
use crate::i18n::{PassthroughTranslator, Translator};
use crate::models::devices::{Device, DeviceCatalog};
use crate::models::values::FormValues;
use crate::working::WorkingState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StepKey {
    Account,
    Profile,
    TherapySettings,
    Review,
}

impl StepKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKey::Account => "account",
            StepKey::Profile => "profile",
            StepKey::TherapySettings => "therapySettings",
            StepKey::Review => "review",
        }
    }
}

/// What a sub-step renders. Device-dependent panels carry their inputs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PanelContent {
    PatientType,
    PatientInfo,
    PatientEmail,
    PatientPhone,
    PatientMrn,
    PatientGender,
    PatientDevices {
        devices: DeviceCatalog,
    },
    #[serde(rename_all = "camelCase")]
    TherapySettings {
        pump: Option<Device>,
        bg_units: BgUnits,
        thresholds: WarningThresholds,
        show_in_module_training_notice: bool,
    },
    #[serde(rename_all = "camelCase")]
    PrescriptionReview {
        is_prescriber: bool,
        can_copy_therapy_settings: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubStep {
    pub panel_content: PanelContent,
    pub disable_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_back: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complete_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_focused_input: Option<String>,
    pub processing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    pub key: StepKey,
    pub label: String,
    pub sub_steps: Vec<SubStep>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormStepOptions {
    /// Fields the user chose to fill in later; they never block completion.
    pub skipped_fields: Vec<String>,
    pub is_editable: bool,
    pub is_prescriber: bool,
    pub initial_focused_input: Option<String>,
    /// Editing one step from the review screen: no back navigation, "Save and Review".
    pub is_single_step_edit: bool,
    pub step_async_state: Option<WorkingState>,
    /// Used when the form does not record its own blood glucose units.
    pub default_bg_units: BgUnits,
}

impl Default for FormStepOptions {
    fn default() -> Self {
        Self {
            skipped_fields: Vec::new(),
            is_editable: true,
            is_prescriber: false,
            initial_focused_input: None,
            is_single_step_edit: false,
            step_async_state: None,
            default_bg_units: BgUnits::MgDl,
        }
    }
}

/// Callbacks the wizard host provides. The builder only reads capability flags; the
/// navigator invokes the event methods.
pub trait StepHandlers {
    fn can_copy_therapy_settings(&self) -> bool {
        false
    }

    fn on_sub_step_complete(&self, _step: StepKey, _sub_step: usize, _values: &FormValues) {}

    fn on_active_step_update(&self, _step: usize, _sub_step: usize) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHandlers;

impl StepHandlers for NoopHandlers {}

/// Build the wizard steps with source-language labels.
pub fn get_form_steps<S: Validator + ?Sized>(
    schema: &S,
    devices: &DeviceCatalog,
    values: &FormValues,
    handlers: &dyn StepHandlers,
    options: &FormStepOptions,
) -> Vec<StepDefinition> {
    get_form_steps_translated(schema, devices, values, handlers, options, &PassthroughTranslator)
}

pub fn get_form_steps_translated<S: Validator + ?Sized>(
    schema: &S,
    devices: &DeviceCatalog,
    values: &FormValues,
    handlers: &dyn StepHandlers,
    options: &FormStepOptions,
    t: &dyn Translator,
) -> Vec<StepDefinition> {
    let builder = StepBuilder { schema, values, options, t };
    let bg_units = form_bg_units(values, options.default_bg_units);
    let pump = devices.selected_pump(values).cloned();

    let account = StepDefinition {
        key: StepKey::Account,
        label: t.t("Create Patient Account", &[]),
        sub_steps: vec![
            builder.sub_step(ACCOUNT_STEP, 0, PanelContent::PatientType),
            builder.sub_step(ACCOUNT_STEP, 1, PanelContent::PatientInfo),
            builder.sub_step(ACCOUNT_STEP, 2, PanelContent::PatientEmail),
        ],
    };

    let profile = StepDefinition {
        key: StepKey::Profile,
        label: t.t("Complete Patient Profile", &[]),
        sub_steps: vec![
            builder.sub_step(PROFILE_STEP, 0, PanelContent::PatientPhone),
            builder.sub_step(PROFILE_STEP, 1, PanelContent::PatientMrn),
            builder.sub_step(PROFILE_STEP, 2, PanelContent::PatientGender),
            builder.sub_step(
                PROFILE_STEP,
                3,
                PanelContent::PatientDevices { devices: devices.clone() },
            ),
        ],
    };

    let therapy_settings = StepDefinition {
        key: StepKey::TherapySettings,
        label: t.t("Enter Therapy Settings", &[]),
        sub_steps: vec![builder.sub_step(
            THERAPY_SETTINGS_STEP,
            0,
            PanelContent::TherapySettings {
                thresholds: warning_thresholds(pump.as_ref(), bg_units, values),
                pump,
                bg_units,
                show_in_module_training_notice: values.get_str("training") == Some("inModule"),
            },
        )],
    };

    let review = StepDefinition {
        key: StepKey::Review,
        label: if options.is_prescriber {
            t.t("Review and Send Prescription", &[])
        } else {
            t.t("Review and Save Prescription", &[])
        },
        sub_steps: vec![builder.review_sub_step(handlers)],
    };

    let mut steps = vec![account, profile, therapy_settings, review];

    if !options.is_single_step_edit {
        if let Some(first) = steps.first_mut().and_then(|s| s.sub_steps.first_mut()) {
            first.hide_back = Some(true);
        }
    }

    steps
}

struct StepBuilder<'a, S: ?Sized> {
    schema: &'a S,
    values: &'a FormValues,
    options: &'a FormStepOptions,
    t: &'a dyn Translator,
}

impl<S: Validator + ?Sized> StepBuilder<'_, S> {
    fn required_fields_valid(&self, paths: &[&str]) -> bool {
        let required: Vec<&str> = paths
            .iter()
            .copied()
            .filter(|p| !self.options.skipped_fields.iter().any(|s| s == p))
            .collect();
        fields_are_valid(&required, self.schema, self.values)
    }

    fn processing(&self) -> bool {
        self.options
            .step_async_state
            .as_ref()
            .is_some_and(|s| s.in_progress)
    }

    fn sub_step(&self, step: usize, sub_step: usize, panel_content: PanelContent) -> SubStep {
        let valid = self.required_fields_valid(step_validation_fields(step, sub_step));
        let single = self.options.is_single_step_edit;

        SubStep {
            panel_content,
            disable_complete: !self.options.is_editable || !valid,
            hide_back: single.then_some(true),
            complete_text: single.then(|| self.t.t("Save and Review", &[])),
            initial_focused_input: if single {
                self.options.initial_focused_input.clone()
            } else {
                None
            },
            processing: self.processing(),
        }
    }

    fn review_sub_step(&self, handlers: &dyn StepHandlers) -> SubStep {
        let is_prescriber = self.options.is_prescriber;

        let mut valid = self.required_fields_valid(&all_entry_fields());
        if is_prescriber {
            valid = valid && self.required_fields_valid(step_validation_fields(REVIEW_STEP, 0));
        }

        SubStep {
            panel_content: PanelContent::PrescriptionReview {
                is_prescriber,
                can_copy_therapy_settings: handlers.can_copy_therapy_settings(),
            },
            disable_complete: !valid,
            hide_back: self.options.is_single_step_edit.then_some(true),
            complete_text: Some(if is_prescriber {
                self.t.t("Send Final Prescription", &[])
            } else {
                self.t.t("Save Pending Prescription", &[])
            }),
            initial_focused_input: None,
            processing: self.processing(),
        }
    }
}
