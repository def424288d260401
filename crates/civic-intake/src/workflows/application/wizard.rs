use super::domain::{ApplicationState, WizardStep};
use super::store::{FormStateStore, SessionStorage};
use super::submission::{SubmissionClient, SubmissionError, SubmissionReceipt};
use super::validation::{FieldError, StepValidator, ValidationOutcome};
use crate::backend::IntakeBackend;

/// Accumulated errors for the step the applicant has to fix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepErrors {
    pub step: WizardStep,
    pub errors: Vec<FieldError>,
}

/// Whether a step may be displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Redirect(WizardStep),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Moved(WizardStep),
    /// The last step validated; the next action is a submit.
    ReadyToSubmit,
    Invalid(StepErrors),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Submitted(SubmissionReceipt),
    Invalid(StepErrors),
}

/// Step sequencing for the application wizard.
#[derive(Debug, Clone, Copy)]
pub struct WizardNavigator {
    validator: StepValidator,
}

impl WizardNavigator {
    pub fn new(validator: StepValidator) -> Self {
        Self { validator }
    }

    pub fn current() -> Self {
        Self::new(StepValidator::current())
    }

    /// Re-validate every step before `target`; the first invalid one is where to go instead.
    pub fn guard(&self, target: WizardStep, state: &ApplicationState) -> GuardDecision {
        target
            .prior_steps()
            .iter()
            .copied()
            .find(|step| !self.validator.validate_step(state, *step).is_valid())
            .map_or(GuardDecision::Proceed, GuardDecision::Redirect)
    }

    pub fn next(&self, current: WizardStep, state: &ApplicationState) -> Navigation {
        match self.validator.validate_step(state, current) {
            ValidationOutcome::Invalid(errors) => Navigation::Invalid(StepErrors {
                step: current,
                errors,
            }),
            ValidationOutcome::Valid => match current.next() {
                Some(step) => Navigation::Moved(step),
                None => Navigation::ReadyToSubmit,
            },
        }
    }

    pub fn previous(&self, current: WizardStep) -> WizardStep {
        current.previous().unwrap_or(current)
    }

    /// First invalid section, in wizard order.
    pub fn validate_all(&self, state: &ApplicationState) -> Result<(), StepErrors> {
        for step in WizardStep::ALL {
            if let ValidationOutcome::Invalid(errors) = self.validator.validate_step(state, step) {
                return Err(StepErrors { step, errors });
            }
        }
        Ok(())
    }

    /// Validate all sections, then hand over to the submission client.
    ///
    /// Validation failures come back as `SubmitOutcome::Invalid`; only backend or
    /// storage failures are errors.
    pub async fn submit<B, S>(
        &self,
        store: &mut FormStateStore<S>,
        client: &SubmissionClient<B>,
    ) -> Result<SubmitOutcome, SubmissionError>
    where
        B: IntakeBackend + 'static,
        S: SessionStorage,
    {
        if let Err(errors) = self.validate_all(store.get()) {
            return Ok(SubmitOutcome::Invalid(errors));
        }

        let receipt = client.submit(store).await?;
        Ok(SubmitOutcome::Submitted(receipt))
    }
}
