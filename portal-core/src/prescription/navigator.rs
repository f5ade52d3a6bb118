// Wizard position state machine.
//
// Holds the latest step definitions and the active (step, sub-step). Steps are replaced
// wholesale via `set_steps` whenever the builder reruns; the position is clamped to fit.

use anyhow::{bail, Result};
use log::{debug, info};

use super::steps::{StepDefinition, StepHandlers};
use crate::models::values::FormValues;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub step: usize,
    pub sub_step: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Moved(Position),
    /// The final sub-step was completed; the position does not change.
    Finished,
}

#[derive(Debug, Clone)]
pub struct WizardNavigator {
    steps: Vec<StepDefinition>,
    position: Position,
}

impl WizardNavigator {
    pub fn new(steps: Vec<StepDefinition>) -> Self {
        Self { steps, position: Position::default() }
    }

    /// Start at a specific position, e.g. when resuming a saved draft.
    pub fn at(steps: Vec<StepDefinition>, position: Position) -> Self {
        let mut nav = Self::new(steps);
        nav.position = position;
        nav.clamp();
        nav
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn set_steps(&mut self, steps: Vec<StepDefinition>) {
        self.steps = steps;
        self.clamp();
    }

    pub fn current(&self) -> Option<&StepDefinition> {
        self.steps.get(self.position.step)
    }

    fn clamp(&mut self) {
        if self.steps.is_empty() {
            self.position = Position::default();
            return;
        }
        self.position.step = self.position.step.min(self.steps.len() - 1);
        let subs = self.steps[self.position.step].sub_steps.len();
        self.position.sub_step = self.position.sub_step.min(subs.saturating_sub(1));
    }

    pub fn can_go_back(&self) -> bool {
        let Some(step) = self.current() else {
            return false;
        };
        let hidden = step
            .sub_steps
            .get(self.position.sub_step)
            .and_then(|s| s.hide_back)
            .unwrap_or(false);
        !hidden && (self.position.step > 0 || self.position.sub_step > 0)
    }

    pub fn can_complete(&self) -> bool {
        self.current()
            .and_then(|s| s.sub_steps.get(self.position.sub_step))
            .is_some_and(|s| !s.disable_complete && !s.processing)
    }

    /// Complete the active sub-step: notify the handlers, then advance.
    pub fn complete(&mut self, handlers: &dyn StepHandlers, values: &FormValues) -> Result<Advance> {
        let Some(step) = self.current() else {
            bail!("No steps to complete");
        };
        if !self.can_complete() {
            bail!(
                "Sub-step {} of '{}' cannot be completed yet",
                self.position.sub_step,
                step.key.as_str()
            );
        }

        let key = step.key;
        let sub_count = step.sub_steps.len();
        handlers.on_sub_step_complete(key, self.position.sub_step, values);
        debug!(
            "[PHASE: wizard] [STEP: complete] Completed {} sub-step {}",
            key.as_str(),
            self.position.sub_step
        );

        let next = if self.position.sub_step + 1 < sub_count {
            Position { step: self.position.step, sub_step: self.position.sub_step + 1 }
        } else if self.position.step + 1 < self.steps.len() {
            Position { step: self.position.step + 1, sub_step: 0 }
        } else {
            info!("[PHASE: wizard] [STEP: finish] Final sub-step completed");
            return Ok(Advance::Finished);
        };

        self.position = next;
        handlers.on_active_step_update(next.step, next.sub_step);
        Ok(Advance::Moved(next))
    }

    /// Walk back one sub-step. Returns false when back navigation is not allowed.
    pub fn back(&mut self, handlers: &dyn StepHandlers) -> bool {
        if !self.can_go_back() {
            return false;
        }

        let prev = if self.position.sub_step > 0 {
            Position { step: self.position.step, sub_step: self.position.sub_step - 1 }
        } else {
            let step = self.position.step - 1;
            let last = self.steps[step].sub_steps.len().saturating_sub(1);
            Position { step, sub_step: last }
        };

        self.position = prev;
        handlers.on_active_step_update(prev.step, prev.sub_step);
        true
    }

    /// Jump to the first sub-step of `step`, as the review screen's edit links do.
    pub fn edit_step(&mut self, step: usize, handlers: &dyn StepHandlers) -> Result<Position> {
        if step >= self.steps.len() {
            bail!("Step {} does not exist ({} steps)", step, self.steps.len());
        }
        self.position = Position { step, sub_step: 0 };
        handlers.on_active_step_update(step, 0);
        Ok(self.position)
    }
}
