use std::sync::Arc;

use tracing::info;

use super::domain::{
    ApplicationPage, ApplicationQuery, SelectionReport, StatusChange, StatusChangeRequest,
    MAX_REASON_LENGTH,
};
use crate::backend::{BackendError, BearerToken, IntakeBackend};
use crate::cache::ReadThroughCache;
use crate::workflows::application::validation::rules::Checks;
use crate::workflows::application::validation::FieldError;
use crate::workflows::application::{Application, ApplicationId};

/// Cached administrator list pages, keyed per caller so one token never sees another's results.
pub type ApplicationListCache = ReadThroughCache<(BearerToken, ApplicationQuery), ApplicationPage>;

/// Back-office operations over submitted applications.
pub struct ManagementService<B> {
    backend: Arc<B>,
    list_cache: Arc<ApplicationListCache>,
}

impl<B> ManagementService<B>
where
    B: IntakeBackend + 'static,
{
    pub fn new(backend: Arc<B>, list_cache: Arc<ApplicationListCache>) -> Self {
        Self {
            backend,
            list_cache,
        }
    }

    pub async fn list(
        &self,
        query: ApplicationQuery,
        token: &BearerToken,
    ) -> Result<ApplicationPage, ManagementError> {
        let query = query.normalized();
        let key = (token.clone(), query);
        if let Some(page) = self.list_cache.get(&key) {
            return Ok(page);
        }

        let page = self.backend.list_applications(&key.1, token).await?;
        self.list_cache.insert(key, page.clone());
        Ok(page)
    }

    pub async fn get(
        &self,
        id: &ApplicationId,
        token: &BearerToken,
    ) -> Result<Application, ManagementError> {
        Ok(self.backend.fetch_application(id, token).await?)
    }

    /// Change an application's status. Both the status id and a reason are required.
    pub async fn change_status(
        &self,
        id: &ApplicationId,
        change: StatusChange,
        token: &BearerToken,
    ) -> Result<Application, ManagementError> {
        let request = validate_status_change(change)?;
        let updated = self.backend.update_application(id, &request, token).await?;
        self.list_cache.invalidate_all();
        info!(application_id = %id, status_id = %request.status_id, "application status changed");
        Ok(updated)
    }

    pub async fn select(
        &self,
        count: u32,
        token: &BearerToken,
    ) -> Result<SelectionReport, ManagementError> {
        let mut checks = Checks::default();
        checks.positive("count", Some(count));
        let errors = checks.into_errors();
        if !errors.is_empty() {
            return Err(ManagementError::Validation(errors));
        }

        let selected = self.backend.select_applications(count, token).await?;
        self.list_cache.invalidate_all();

        let report = SelectionReport {
            requested: count,
            selected: selected.len(),
            application_ids: selected.into_iter().map(|application| application.id).collect(),
        };
        info!(
            requested = report.requested,
            selected = report.selected,
            "bulk selection completed"
        );
        Ok(report)
    }
}

fn validate_status_change(change: StatusChange) -> Result<StatusChangeRequest, ManagementError> {
    let mut checks = Checks::default();
    checks.selected("statusId", change.status_id.as_deref());
    checks.text("reason", change.reason.as_deref(), MAX_REASON_LENGTH);
    let errors = checks.into_errors();

    match (change.status_id, change.reason) {
        (Some(status_id), Some(reason)) if errors.is_empty() => Ok(StatusChangeRequest {
            status_id: status_id.trim().to_string(),
            reason: reason.trim().to_string(),
        }),
        _ => Err(ManagementError::Validation(errors)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ManagementError {
    #[error("request failed validation ({} field errors)", .0.len())]
    Validation(Vec<FieldError>),
    #[error(transparent)]
    Backend(#[from] BackendError),
}
