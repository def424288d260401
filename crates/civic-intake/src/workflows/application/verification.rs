use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::domain::ApplicationId;
use super::validation::rules::Checks;
use super::validation::FieldError;
use crate::backend::{BackendError, IntakeBackend};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum VerificationOutcome {
    #[serde(rename_all = "camelCase")]
    Verified { application_id: ApplicationId },
    UnknownToken,
    Invalid { errors: Vec<FieldError> },
}

/// Confirms the email address of a submitted application via its access token.
pub struct EmailVerificationClient<B> {
    backend: Arc<B>,
}

impl<B> EmailVerificationClient<B>
where
    B: IntakeBackend + 'static,
{
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    pub async fn verify(&self, access_token: &str) -> Result<VerificationOutcome, BackendError> {
        let mut checks = Checks::default();
        checks.selected("accessToken", Some(access_token));
        let errors = checks.into_errors();
        if !errors.is_empty() {
            return Ok(VerificationOutcome::Invalid { errors });
        }

        match self.backend.verify_email(access_token.trim()).await {
            Ok(application) => {
                info!(application_id = %application.id, "email address verified");
                Ok(VerificationOutcome::Verified {
                    application_id: application.id,
                })
            }
            Err(err) if err.is_not_found() => Ok(VerificationOutcome::UnknownToken),
            Err(err) => Err(err),
        }
    }
}
