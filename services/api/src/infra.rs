use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use civic_intake::backend::hateoas::PageMetadata;
use civic_intake::backend::{BackendError, BearerToken, IntakeBackend};
use civic_intake::workflows::application::{Application, ApplicationDetails, ApplicationId};
use civic_intake::workflows::lookups::{LookupEntity, LookupKind};
use civic_intake::workflows::management::{
    ApplicationPage, ApplicationQuery, StatusChangeRequest,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

pub(crate) const SUBMITTED_STATUS: &str = "submitted";
pub(crate) const SELECTED_STATUS: &str = "selected";

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Self-contained stand-in for the program backend, used by `serve --in-memory` and the demo.
#[derive(Default)]
pub(crate) struct InMemoryIntakeBackend {
    applications: Mutex<Vec<Application>>,
}

const LOOKUP_SEED: &[(LookupKind, &[(&str, &str, &str)])] = &[
    (
        LookupKind::Languages,
        &[("en", "English", "Anglais"), ("fr", "French", "Français")],
    ),
    (
        LookupKind::Provinces,
        &[
            ("ab", "Alberta", "Alberta"),
            ("bc", "British Columbia", "Colombie-Britannique"),
            ("on", "Ontario", "Ontario"),
            ("qc", "Quebec", "Québec"),
        ],
    ),
    (
        LookupKind::Genders,
        &[
            ("woman", "Woman", "Femme"),
            ("man", "Man", "Homme"),
            ("another", "Another gender", "Autre genre"),
            ("prefer-not", "Prefer not to say", "Préfère ne pas répondre"),
        ],
    ),
    (
        LookupKind::IndigenousStatuses,
        &[
            ("yes", "Yes", "Oui"),
            ("no", "No", "Non"),
            ("prefer-not", "Prefer not to say", "Préfère ne pas répondre"),
        ],
    ),
    (
        LookupKind::DisabilityStatuses,
        &[
            ("yes", "Yes", "Oui"),
            ("no", "No", "Non"),
            ("prefer-not", "Prefer not to say", "Préfère ne pas répondre"),
        ],
    ),
    (
        LookupKind::EthnicGroups,
        &[
            ("racialized", "Racialized", "Racisé"),
            ("not-racialized", "Not racialized", "Non racisé"),
            ("prefer-not", "Prefer not to say", "Préfère ne pas répondre"),
        ],
    ),
    (
        LookupKind::LgbtqStatuses,
        &[
            ("yes", "Yes", "Oui"),
            ("no", "No", "Non"),
            ("prefer-not", "Prefer not to say", "Préfère ne pas répondre"),
        ],
    ),
    (
        LookupKind::EducationLevels,
        &[
            ("secondary", "Secondary school", "École secondaire"),
            ("college", "College", "Collège"),
            ("university", "University", "Université"),
        ],
    ),
    (
        LookupKind::IncomeLevels,
        &[
            ("low", "Under $40,000", "Moins de 40 000 $"),
            ("middle", "$40,000 to $100,000", "De 40 000 $ à 100 000 $"),
            ("high", "Over $100,000", "Plus de 100 000 $"),
        ],
    ),
    (
        LookupKind::HouseholdSizes,
        &[
            ("1", "One person", "Une personne"),
            ("2", "Two people", "Deux personnes"),
            ("3-plus", "Three or more", "Trois ou plus"),
        ],
    ),
    (
        LookupKind::DiscoveryChannels,
        &[
            ("web", "Government website", "Site Web du gouvernement"),
            ("social", "Social media", "Médias sociaux"),
            ("friend", "Friend or family", "Ami ou famille"),
        ],
    ),
    (
        LookupKind::PreferredMethods,
        &[
            ("online", "Online", "En ligne"),
            ("in-person", "In person", "En personne"),
        ],
    ),
    (
        LookupKind::InterestTopics,
        &[
            ("housing", "Housing", "Logement"),
            ("health", "Health", "Santé"),
            ("environment", "Environment", "Environnement"),
        ],
    ),
    (
        LookupKind::ApplicationStatuses,
        &[
            (SUBMITTED_STATUS, "Submitted", "Soumise"),
            (SELECTED_STATUS, "Selected", "Sélectionnée"),
            ("approved", "Approved", "Approuvée"),
            ("rejected", "Rejected", "Rejetée"),
        ],
    ),
];

fn not_found(what: &str) -> BackendError {
    BackendError::Http {
        status: 404,
        body: Some(json!({ "message": format!("{what} not found") })),
        text: None,
    }
}

impl InMemoryIntakeBackend {
    fn applications(&self) -> std::sync::MutexGuard<'_, Vec<Application>> {
        self.applications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn seeded_lookups(kind: LookupKind) -> Vec<LookupEntity> {
    let activated = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single();
    LOOKUP_SEED
        .iter()
        .find(|(seeded, _)| *seeded == kind)
        .map(|(_, rows)| {
            rows.iter()
                .zip(1..)
                .map(|((id, en, fr), order)| LookupEntity {
                    id: format!("{}-{id}", kind.path()),
                    description_en: en.to_string(),
                    description_fr: fr.to_string(),
                    activation_date: activated,
                    expiration_date: None,
                    display_order_en: Some(order),
                    display_order_fr: Some(order),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn matches_query(application: &Application, query: &ApplicationQuery) -> bool {
    let status_matches = query
        .status_id
        .as_deref()
        .map_or(true, |status| application.status_id.as_deref() == Some(status));
    let search_matches = query.search.as_deref().map_or(true, |needle| {
        let needle = needle.to_lowercase();
        let details = &application.details;
        [&details.first_name, &details.last_name, &details.email]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle))
    });
    status_matches && search_matches
}

#[async_trait]
impl IntakeBackend for InMemoryIntakeBackend {
    async fn fetch_lookups(
        &self,
        kind: LookupKind,
        _sort: &str,
    ) -> Result<Vec<LookupEntity>, BackendError> {
        Ok(seeded_lookups(kind))
    }

    async fn create_application(
        &self,
        details: &ApplicationDetails,
    ) -> Result<Application, BackendError> {
        let mut applications = self.applications();
        let number = applications.len() + 1;
        let application = Application {
            id: ApplicationId(format!("app-{number:04}")),
            status_id: Some(SUBMITTED_STATUS.to_string()),
            access_code: Some(format!("access-{number:04}")),
            is_email_verified: Some(false),
            details: details.clone(),
            created_by: Some("anonymous".to_string()),
            created_date: Some(Utc::now()),
            last_modified_by: None,
            last_modified_date: None,
        };
        applications.push(application.clone());
        Ok(application)
    }

    async fn list_applications(
        &self,
        query: &ApplicationQuery,
        _token: &BearerToken,
    ) -> Result<ApplicationPage, BackendError> {
        let matching: Vec<Application> = self
            .applications()
            .iter()
            .filter(|application| matches_query(application, query))
            .cloned()
            .collect();

        let size = query.size.max(1);
        let total = matching.len();
        let applications = matching
            .into_iter()
            .skip(query.page as usize * size as usize)
            .take(size as usize)
            .collect();

        Ok(ApplicationPage {
            applications,
            page: Some(PageMetadata {
                size,
                total_elements: total as u64,
                total_pages: total.div_ceil(size as usize) as u32,
                number: query.page,
            }),
        })
    }

    async fn fetch_application(
        &self,
        id: &ApplicationId,
        _token: &BearerToken,
    ) -> Result<Application, BackendError> {
        self.applications()
            .iter()
            .find(|application| &application.id == id)
            .cloned()
            .ok_or_else(|| not_found("application"))
    }

    async fn update_application(
        &self,
        id: &ApplicationId,
        change: &StatusChangeRequest,
        _token: &BearerToken,
    ) -> Result<Application, BackendError> {
        let mut applications = self.applications();
        let application = applications
            .iter_mut()
            .find(|application| &application.id == id)
            .ok_or_else(|| not_found("application"))?;
        application.status_id = Some(change.status_id.clone());
        application.last_modified_by = Some("administrator".to_string());
        application.last_modified_date = Some(Utc::now());
        Ok(application.clone())
    }

    async fn select_applications(
        &self,
        count: u32,
        _token: &BearerToken,
    ) -> Result<Vec<Application>, BackendError> {
        let mut applications = self.applications();
        Ok(applications
            .iter_mut()
            .filter(|application| application.status_id.as_deref() == Some(SUBMITTED_STATUS))
            .take(count as usize)
            .map(|application| {
                application.status_id = Some(SELECTED_STATUS.to_string());
                application.clone()
            })
            .collect())
    }

    async fn verify_email(&self, access_token: &str) -> Result<Application, BackendError> {
        let mut applications = self.applications();
        let application = applications
            .iter_mut()
            .find(|application| application.access_code.as_deref() == Some(access_token))
            .ok_or_else(|| not_found("access token"))?;
        application.is_email_verified = Some(true);
        Ok(application.clone())
    }
}
