pub mod application;
pub mod lookups;
pub mod management;
pub(crate) mod problem;

use std::sync::Arc;

use axum::Router;

use crate::backend::IntakeBackend;
use application::{EmailVerificationClient, SessionRegistry, SubmissionClient};
use lookups::{Locale, LookupCache};
use management::{ApplicationListCache, ManagementService};

/// Everything the intake and management routes need, wired to one backend.
pub struct IntakeServices<B> {
    pub lookups: LookupCache<B>,
    pub submissions: SubmissionClient<B>,
    pub verification: EmailVerificationClient<B>,
    pub management: ManagementService<B>,
    pub sessions: SessionRegistry,
    pub default_locale: Locale,
}

impl<B> IntakeServices<B>
where
    B: IntakeBackend + 'static,
{
    pub fn new(backend: Arc<B>, default_locale: Locale) -> Self {
        let list_cache = Arc::new(ApplicationListCache::default());
        Self {
            lookups: LookupCache::new(backend.clone()),
            submissions: SubmissionClient::new(backend.clone(), list_cache.clone()),
            verification: EmailVerificationClient::new(backend.clone()),
            management: ManagementService::new(backend, list_cache),
            sessions: SessionRegistry::default(),
            default_locale,
        }
    }

    pub fn locale_or_default(&self, raw: Option<&str>) -> Locale {
        raw.and_then(Locale::parse).unwrap_or(self.default_locale)
    }
}

/// Public wizard routes plus the management console routes.
pub fn intake_router<B>(services: Arc<IntakeServices<B>>) -> Router
where
    B: IntakeBackend + 'static,
{
    application::application_router(services.clone())
        .merge(management::management_router(services))
}
