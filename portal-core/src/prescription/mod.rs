// Prescription wizard: required fields per screen, step definitions and navigation.

pub mod constants;
pub mod navigator;
pub mod steps;

pub use navigator::{Advance, Position, WizardNavigator};
pub use steps::{
    get_form_steps, get_form_steps_translated, FormStepOptions, NoopHandlers, PanelContent,
    StepDefinition, StepHandlers, StepKey, SubStep,
};
