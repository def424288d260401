use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{ApplicationDetails, ApplicationId, IncompleteApplication};
use super::store::{FormStateStore, SessionStorage};
use crate::backend::{BackendError, IntakeBackend};
use crate::workflows::management::ApplicationListCache;

/// Page the applicant is sent to once the backend accepted the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RedirectTarget {
    Confirmation,
    EmailVerification,
}

impl RedirectTarget {
    pub const fn path(self) -> &'static str {
        match self {
            RedirectTarget::Confirmation => "/application/confirmation",
            RedirectTarget::EmailVerification => "/application/email-verification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub application_id: ApplicationId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_code: Option<String>,
    pub redirect: RedirectTarget,
}

/// Single-attempt submission to the backend.
pub struct SubmissionClient<B> {
    backend: Arc<B>,
    list_cache: Arc<ApplicationListCache>,
}

impl<B> SubmissionClient<B>
where
    B: IntakeBackend + 'static,
{
    pub fn new(backend: Arc<B>, list_cache: Arc<ApplicationListCache>) -> Self {
        Self {
            backend,
            list_cache,
        }
    }

    /// Post the assembled application. Stored answers are only cleared on success.
    ///
    /// Once the backend has accepted the application the receipt is returned even if
    /// the stored answers cannot be cleared.
    pub async fn submit<S>(
        &self,
        store: &mut FormStateStore<S>,
    ) -> Result<SubmissionReceipt, SubmissionError>
    where
        S: SessionStorage,
    {
        let details = ApplicationDetails::try_from(store.get())?;
        let created = self.backend.create_application(&details).await?;

        self.list_cache.invalidate_all();
        if let Err(err) = store.clear() {
            warn!(application_id = %created.id, error = %err, "submitted answers could not be cleared");
        }

        let redirect = if created.is_email_verified == Some(true) {
            RedirectTarget::Confirmation
        } else {
            RedirectTarget::EmailVerification
        };
        info!(application_id = %created.id, ?redirect, "application submitted");

        Ok(SubmissionReceipt {
            application_id: created.id,
            access_code: created.access_code,
            redirect,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Incomplete(#[from] IncompleteApplication),
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Per-session "submission in flight" marker that disables resubmission.
#[derive(Debug, Clone, Default)]
pub struct InFlightFlag(Arc<AtomicBool>);

impl InFlightFlag {
    /// `None` while another submission from the same session is outstanding.
    pub fn try_acquire(&self) -> Option<InFlightGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(self.0.clone()))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Releases the flag when the submission finishes, however it finishes.
#[derive(Debug)]
pub struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
