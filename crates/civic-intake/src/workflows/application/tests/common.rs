use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use chrono::{TimeZone, Utc};
use serde_json::Value;

use crate::backend::{BackendError, BearerToken, IntakeBackend};
use crate::workflows::application::{
    Application, ApplicationDetails, ApplicationId, ApplicationState, Consent,
    ExpressionOfInterest, IdentityInformation, PersonalInformation, SESSION_HEADER,
};
use crate::workflows::lookups::{Locale, LookupEntity, LookupKind};
use crate::workflows::management::{ApplicationPage, ApplicationQuery, StatusChangeRequest};
use crate::workflows::{intake_router, IntakeServices};

pub(super) const SESSION_ID: &str = "tab-1";
pub(super) const ADMIN_TOKEN: &str = "admin-token";
pub(super) const KNOWN_ACCESS_TOKEN: &str = "known-access-token";

/// Backend fake holding applications in memory.
#[derive(Default)]
pub(super) struct MemoryBackend {
    lookups: Mutex<HashMap<LookupKind, Vec<LookupEntity>>>,
    created: Mutex<Vec<Application>>,
    create_failure: Mutex<Option<u16>>,
    email_verified_on_create: Mutex<bool>,
    lookup_calls: AtomicUsize,
    list_calls: AtomicUsize,
}

impl MemoryBackend {
    pub(super) fn seed_lookup(&self, kind: LookupKind, entries: Vec<LookupEntity>) {
        self.lookups
            .lock()
            .expect("lookups lock")
            .insert(kind, entries);
    }

    pub(super) fn fail_creates_with(&self, status: u16) {
        *self.create_failure.lock().expect("failure lock") = Some(status);
    }

    pub(super) fn mark_emails_verified(&self) {
        *self.email_verified_on_create.lock().expect("verified lock") = true;
    }

    pub(super) fn created(&self) -> Vec<Application> {
        self.created.lock().expect("created lock").clone()
    }

    pub(super) fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    pub(super) fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn authorize(token: &BearerToken) -> Result<(), BackendError> {
        if token.as_str() == ADMIN_TOKEN {
            Ok(())
        } else {
            Err(BackendError::from_response(401, None))
        }
    }

    fn not_found() -> BackendError {
        BackendError::from_response(404, Some(r#"{"message":"not found"}"#.to_string()))
    }
}

#[async_trait]
impl IntakeBackend for MemoryBackend {
    async fn fetch_lookups(
        &self,
        kind: LookupKind,
        _sort: &str,
    ) -> Result<Vec<LookupEntity>, BackendError> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        self.lookups
            .lock()
            .expect("lookups lock")
            .get(&kind)
            .cloned()
            .ok_or_else(Self::not_found)
    }

    async fn create_application(
        &self,
        details: &ApplicationDetails,
    ) -> Result<Application, BackendError> {
        if let Some(status) = *self.create_failure.lock().expect("failure lock") {
            return Err(BackendError::from_response(
                status,
                Some(r#"{"message":"rejected"}"#.to_string()),
            ));
        }

        let mut created = self.created.lock().expect("created lock");
        let verified = *self.email_verified_on_create.lock().expect("verified lock");
        let application = application(
            &format!("app-{}", created.len() + 1),
            details.clone(),
            verified,
        );
        created.push(application.clone());
        Ok(application)
    }

    async fn list_applications(
        &self,
        query: &ApplicationQuery,
        token: &BearerToken,
    ) -> Result<ApplicationPage, BackendError> {
        Self::authorize(token)?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let applications = self
            .created()
            .into_iter()
            .filter(|application| {
                query
                    .status_id
                    .as_ref()
                    .map_or(true, |status| application.status_id.as_ref() == Some(status))
            })
            .collect();
        Ok(ApplicationPage {
            applications,
            page: None,
        })
    }

    async fn fetch_application(
        &self,
        id: &ApplicationId,
        token: &BearerToken,
    ) -> Result<Application, BackendError> {
        Self::authorize(token)?;
        self.created()
            .into_iter()
            .find(|application| &application.id == id)
            .ok_or_else(Self::not_found)
    }

    async fn update_application(
        &self,
        id: &ApplicationId,
        change: &StatusChangeRequest,
        token: &BearerToken,
    ) -> Result<Application, BackendError> {
        Self::authorize(token)?;
        let mut created = self.created.lock().expect("created lock");
        let application = created
            .iter_mut()
            .find(|application| &application.id == id)
            .ok_or_else(Self::not_found)?;
        application.status_id = Some(change.status_id.clone());
        Ok(application.clone())
    }

    async fn select_applications(
        &self,
        count: u32,
        token: &BearerToken,
    ) -> Result<Vec<Application>, BackendError> {
        Self::authorize(token)?;
        let mut created = self.created.lock().expect("created lock");
        let selected = created
            .iter_mut()
            .filter(|application| application.status_id.as_deref() == Some("submitted"))
            .take(count as usize)
            .map(|application| {
                application.status_id = Some("selected".to_string());
                application.clone()
            })
            .collect();
        Ok(selected)
    }

    async fn verify_email(&self, access_token: &str) -> Result<Application, BackendError> {
        if access_token != KNOWN_ACCESS_TOKEN {
            return Err(Self::not_found());
        }
        let mut created = self.created.lock().expect("created lock");
        let application = created.first_mut().ok_or_else(Self::not_found)?;
        application.is_email_verified = Some(true);
        Ok(application.clone())
    }
}

pub(super) fn application(id: &str, details: ApplicationDetails, verified: bool) -> Application {
    Application {
        id: ApplicationId(id.to_string()),
        status_id: Some("submitted".to_string()),
        access_code: Some(format!("code-{id}")),
        is_email_verified: Some(verified),
        details,
        created_by: Some("anonymous".to_string()),
        created_date: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).single(),
        last_modified_by: None,
        last_modified_date: None,
    }
}

pub(super) fn lookup(id: &str, en: &str, fr: &str, order: i32) -> LookupEntity {
    LookupEntity {
        id: id.to_string(),
        description_en: en.to_string(),
        description_fr: fr.to_string(),
        activation_date: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).single(),
        expiration_date: None,
        display_order_en: Some(order),
        display_order_fr: Some(order),
    }
}

pub(super) fn personal_information() -> PersonalInformation {
    PersonalInformation {
        first_name: Some("Jane".to_string()),
        last_name: Some("Doe".to_string()),
        email: Some("jane.doe@example.ca".to_string()),
        birth_year: Some(1990),
        is_province_major_certified: Some(true),
        language_id: Some("lang-en".to_string()),
        is_canadian_citizen: Some(true),
        province_id: Some("prov-on".to_string()),
        discovery_channel_id: Some("channel-web".to_string()),
    }
}

pub(super) fn identity_information() -> IdentityInformation {
    IdentityInformation {
        gender_id: Some("gender-x".to_string()),
        indigenous_status_id: Some("indigenous-no".to_string()),
        disability_status_id: Some("disability-no".to_string()),
        ethnic_group_id: Some("ethnic-prefer-not".to_string()),
        lgbtq_status_id: Some("lgbtq-prefer-not".to_string()),
        education_level_id: Some("education-university".to_string()),
        income_level_id: Some("income-middle".to_string()),
        household_size_id: Some("household-2".to_string()),
    }
}

pub(super) fn expression_of_interest() -> ExpressionOfInterest {
    ExpressionOfInterest {
        preferred_language_id: Some("lang-fr".to_string()),
        preferred_method_id: Some("method-online".to_string()),
        interest_topic_id: Some("topic-housing".to_string()),
        additional_info: None,
    }
}

pub(super) fn consent() -> Consent {
    Consent {
        has_read_privacy_statement: Some(true),
        has_given_consent: Some(true),
    }
}

pub(super) fn complete_state() -> ApplicationState {
    ApplicationState {
        personal_information: personal_information(),
        identity_information: identity_information(),
        expression_of_interest: expression_of_interest(),
        consent: consent(),
    }
}

pub(super) fn services(backend: Arc<MemoryBackend>) -> Arc<IntakeServices<MemoryBackend>> {
    Arc::new(IntakeServices::new(backend, Locale::En))
}

pub(super) fn router_with(services: Arc<IntakeServices<MemoryBackend>>) -> axum::Router {
    intake_router(services)
}

pub(super) fn session_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(SESSION_HEADER, SESSION_ID);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("json body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) fn admin_request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {ADMIN_TOKEN}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("json body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
