//! Wizard Controller: sequences steps and gates forward progress on validation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::wizard::form::FormState;
use crate::wizard::steps::WizardDefinition;
use crate::wizard::validation::{validate_form, validate_step, FormValidation, ValidationResult};

/// Always a valid index into the step table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardCursor {
    pub current_step: usize,
}

/// Result of a forward-navigation attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Advance {
    Moved { from: usize, to: usize },
    Blocked { validation: ValidationResult },
    /// The final step validated; the caller should submit.
    ReadyToSubmit,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    definition: &'static WizardDefinition,
    form: FormState,
    cursor: WizardCursor,
}

impl Wizard {
    pub fn new(definition: &'static WizardDefinition) -> Self {
        Self::with_form(definition, FormState::new())
    }

    /// Mounts a wizard on an existing form, e.g. one restored from a draft.
    /// The cursor always starts at the first step.
    pub fn with_form(definition: &'static WizardDefinition, form: FormState) -> Self {
        Self {
            definition,
            form,
            cursor: WizardCursor::default(),
        }
    }

    pub fn definition(&self) -> &'static WizardDefinition {
        self.definition
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn current_step(&self) -> usize {
        self.cursor.current_step
    }

    pub fn is_final(&self) -> bool {
        self.cursor.current_step == self.definition.last_step()
    }

    pub fn validate_current(&self) -> ValidationResult {
        validate_step(self.definition, self.cursor.current_step, &self.form)
    }

    pub fn validate_all(&self) -> FormValidation {
        validate_form(self.definition, &self.form)
    }

    /// Validates the active step and moves forward if it passes.
    pub fn advance(&mut self) -> Advance {
        let validation = self.validate_current();
        if !validation.valid {
            debug!(
                "{}: step {} blocked by {} field error(s)",
                self.definition.kind,
                self.cursor.current_step,
                validation.errors.len()
            );
            return Advance::Blocked { validation };
        }
        if self.is_final() {
            return Advance::ReadyToSubmit;
        }
        let from = self.cursor.current_step;
        self.cursor.current_step = (from + 1).min(self.definition.last_step());
        debug!("{}: step {} -> {}", self.definition.kind, from, self.cursor.current_step);
        Advance::Moved {
            from,
            to: self.cursor.current_step,
        }
    }

    /// Steps back one page. Never validates; floored at the first step.
    pub fn retreat(&mut self) -> usize {
        self.cursor.current_step = self.cursor.current_step.saturating_sub(1);
        self.cursor.current_step
    }

    /// Jumps back to an already-reached step. Jumping ahead is refused so
    /// intermediate validation cannot be skipped.
    pub fn jump_to(&mut self, step: usize) -> bool {
        if step > self.cursor.current_step {
            debug!(
                "{}: refused jump from {} to {}",
                self.definition.kind, self.cursor.current_step, step
            );
            return false;
        }
        self.cursor.current_step = step;
        true
    }
}
