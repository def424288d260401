//! Public application wizard: form state, step validation, navigation and submission.

pub mod domain;
pub mod router;
pub mod session;
pub mod store;
pub mod submission;
pub mod validation;
pub mod verification;
pub mod wizard;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationDetails, ApplicationId, ApplicationState, Consent,
    ExpressionOfInterest, IdentityInformation, IncompleteApplication, PersonalInformation,
    SectionUpdate, WizardStep,
};
pub use router::application_router;
pub use session::{ClientSession, SessionRegistry, SESSION_HEADER};
pub use store::{
    FormStateStore, MemorySessionStorage, PatchError, SessionStorage, StorageError,
    APPLICATION_STATE_KEY,
};
pub use submission::{
    InFlightFlag, RedirectTarget, SubmissionClient, SubmissionError, SubmissionReceipt,
};
pub use validation::{FieldError, StepValidator, ValidationOutcome};
pub use verification::{EmailVerificationClient, VerificationOutcome};
pub use wizard::{GuardDecision, Navigation, StepErrors, SubmitOutcome, WizardNavigator};
