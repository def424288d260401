use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};

use super::domain::{ApplicationState, WizardStep};
use super::session::{ClientSession, SESSION_HEADER};
use super::store::{FormStateStore, MemorySessionStorage, PatchError, StorageError};
use super::submission::SubmissionError;
use super::verification::VerificationOutcome;
use super::wizard::{GuardDecision, Navigation, StepErrors, SubmitOutcome, WizardNavigator};
use crate::backend::IntakeBackend;
use crate::workflows::lookups::{LookupKind, LookupOption};
use crate::workflows::problem::{backend_failure, problem, validation_failed};
use crate::workflows::IntakeServices;

type Services<B> = Arc<IntakeServices<B>>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LocaleParams {
    #[serde(default)]
    pub(crate) locale: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyRequest {
    #[serde(default)]
    pub(crate) access_token: String,
}

/// Router builder exposing lookups, the wizard and email verification.
pub fn application_router<B>(services: Services<B>) -> Router
where
    B: IntakeBackend + 'static,
{
    Router::new()
        .route("/api/v1/lookups/:kind", get(lookup_handler::<B>))
        .route(
            "/api/v1/wizard",
            get(state_handler::<B>)
                .post(submit_handler::<B>)
                .delete(cancel_handler::<B>),
        )
        .route(
            "/api/v1/wizard/:step",
            get(step_handler::<B>).put(update_handler::<B>),
        )
        .route("/api/v1/wizard/:step/next", post(next_handler::<B>))
        .route("/api/v1/wizard/:step/previous", post(previous_handler::<B>))
        .route("/api/v1/email-validations", post(verify_handler::<B>))
        .with_state(services)
}

pub(crate) fn step_location(step: WizardStep) -> String {
    format!("/api/v1/wizard/{step}")
}

fn session_id(headers: &HeaderMap) -> &str {
    headers
        .get(SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .unwrap_or_default()
}

fn session_for<B>(services: &IntakeServices<B>, headers: &HeaderMap) -> Result<Arc<ClientSession>, Response> {
    services.sessions.session(session_id(headers)).ok_or_else(|| {
        problem(
            StatusCode::BAD_REQUEST,
            format!("missing or malformed {SESSION_HEADER} header"),
        )
    })
}

fn storage_failure(err: StorageError) -> Response {
    error!(error = %err, "session storage failure");
    problem(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn load_store(session: &ClientSession) -> Result<FormStateStore<MemorySessionStorage>, Response> {
    FormStateStore::load(session.storage.clone()).map_err(storage_failure)
}

/// Load, patch and persist while holding the session's edit lock.
fn apply_patch(session: &ClientSession, step: WizardStep, patch: Value) -> Result<Value, Response> {
    let _editing = session.lock_edits();
    let mut store = load_store(session)?;
    store.patch(step, patch).map_err(|err| match err {
        PatchError::Invalid(err) => {
            warn!(%step, error = %err, "rejected section update");
            problem(StatusCode::BAD_REQUEST, format!("invalid {step} fields: {err}"))
        }
        PatchError::Storage(err) => storage_failure(err),
    })?;
    step_view(step, store.get())
}

fn clear_answers(session: &ClientSession) -> Result<(), Response> {
    let _editing = session.lock_edits();
    let mut store = load_store(session)?;
    store.clear().map_err(storage_failure)
}

fn parse_step(raw: &str) -> Result<WizardStep, Response> {
    WizardStep::from_slug(raw)
        .ok_or_else(|| problem(StatusCode::NOT_FOUND, format!("unknown wizard step '{raw}'")))
}

fn redirect_to(step: WizardStep) -> Response {
    let location = step_location(step);
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location.clone())],
        Json(json!({ "redirectTo": step, "location": location })),
    )
        .into_response()
}

fn step_view(step: WizardStep, state: &ApplicationState) -> Result<Value, Response> {
    let section = state
        .section_json(step)
        .map_err(|err| problem(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()))?;
    Ok(json!({
        "step": step,
        "section": section,
        "previous": step.previous(),
        "next": step.next(),
    }))
}

pub(crate) async fn lookup_handler<B>(
    State(services): State<Services<B>>,
    Path(kind): Path<String>,
    Query(params): Query<LocaleParams>,
) -> Result<Response, Response>
where
    B: IntakeBackend + 'static,
{
    let kind = LookupKind::from_path(&kind)
        .ok_or_else(|| problem(StatusCode::NOT_FOUND, format!("unknown lookup '{kind}'")))?;
    let locale = services.locale_or_default(params.locale.as_deref());

    let entries = services
        .lookups
        .fetch(kind, locale)
        .await
        .map_err(|err| backend_failure(&err))?;
    let options: Vec<LookupOption> = entries
        .iter()
        .map(|entity| LookupOption::from_entity(entity, locale))
        .collect();

    Ok(Json(json!({ "kind": kind, "locale": locale, "options": options })).into_response())
}

pub(crate) async fn state_handler<B>(
    State(services): State<Services<B>>,
    headers: HeaderMap,
) -> Result<Response, Response>
where
    B: IntakeBackend + 'static,
{
    let session = session_for(&services, &headers)?;
    let store = load_store(&session)?;
    let first_invalid = WizardNavigator::current()
        .validate_all(store.get())
        .err()
        .map(|invalid| invalid.step);

    Ok(Json(json!({
        "state": store.get(),
        "firstInvalidStep": first_invalid,
        "submissionInFlight": session.in_flight.is_set(),
    }))
    .into_response())
}

pub(crate) async fn step_handler<B>(
    State(services): State<Services<B>>,
    Path(step): Path<String>,
    headers: HeaderMap,
) -> Result<Response, Response>
where
    B: IntakeBackend + 'static,
{
    let step = parse_step(&step)?;
    let session = session_for(&services, &headers)?;
    let store = load_store(&session)?;

    match WizardNavigator::current().guard(step, store.get()) {
        GuardDecision::Redirect(target) => Ok(redirect_to(target)),
        GuardDecision::Proceed => Ok(Json(step_view(step, store.get())?).into_response()),
    }
}

pub(crate) async fn update_handler<B>(
    State(services): State<Services<B>>,
    Path(step): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<Value>,
) -> Result<Response, Response>
where
    B: IntakeBackend + 'static,
{
    let step = parse_step(&step)?;
    let session = session_for(&services, &headers)?;
    let view = apply_patch(&session, step, patch)?;
    Ok(Json(view).into_response())
}

pub(crate) async fn next_handler<B>(
    State(services): State<Services<B>>,
    Path(step): Path<String>,
    Query(params): Query<LocaleParams>,
    headers: HeaderMap,
) -> Result<Response, Response>
where
    B: IntakeBackend + 'static,
{
    let step = parse_step(&step)?;
    let locale = services.locale_or_default(params.locale.as_deref());
    let session = session_for(&services, &headers)?;
    let store = load_store(&session)?;
    let navigator = WizardNavigator::current();

    if let GuardDecision::Redirect(target) = navigator.guard(step, store.get()) {
        return Ok(redirect_to(target));
    }

    let response = match navigator.next(step, store.get()) {
        Navigation::Moved(next) => Json(json!({
            "step": next,
            "location": step_location(next),
        }))
        .into_response(),
        Navigation::ReadyToSubmit => Json(json!({
            "step": step,
            "readyToSubmit": true,
        }))
        .into_response(),
        Navigation::Invalid(StepErrors { step, errors }) => {
            validation_failed(Some(step), &errors, locale)
        }
    };
    Ok(response)
}

pub(crate) async fn previous_handler<B>(
    State(_services): State<Services<B>>,
    Path(step): Path<String>,
) -> Result<Response, Response>
where
    B: IntakeBackend + 'static,
{
    let step = parse_step(&step)?;
    let previous = WizardNavigator::current().previous(step);
    Ok(Json(json!({ "step": previous, "location": step_location(previous) })).into_response())
}

pub(crate) async fn submit_handler<B>(
    State(services): State<Services<B>>,
    Query(params): Query<LocaleParams>,
    headers: HeaderMap,
) -> Result<Response, Response>
where
    B: IntakeBackend + 'static,
{
    let locale = services.locale_or_default(params.locale.as_deref());
    let session = session_for(&services, &headers)?;
    let Some(_in_flight) = session.in_flight.try_acquire() else {
        return Err(problem(
            StatusCode::CONFLICT,
            "a submission is already in progress for this session",
        ));
    };

    let mut store = load_store(&session)?;
    let outcome = WizardNavigator::current()
        .submit(&mut store, &services.submissions)
        .await;

    match outcome {
        Ok(SubmitOutcome::Submitted(receipt)) => {
            services.sessions.remove(session_id(&headers));
            Ok((
                StatusCode::CREATED,
                Json(json!({
                    "applicationId": receipt.application_id,
                    "accessCode": receipt.access_code,
                    "redirect": receipt.redirect,
                    "location": receipt.redirect.path(),
                })),
            )
                .into_response())
        }
        Ok(SubmitOutcome::Invalid(StepErrors { step, errors })) => {
            Err(validation_failed(Some(step), &errors, locale))
        }
        Err(SubmissionError::Backend(err)) => Err(backend_failure(&err)),
        Err(other) => {
            error!(error = %other, "submission failed");
            Err(problem(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()))
        }
    }
}

pub(crate) async fn cancel_handler<B>(
    State(services): State<Services<B>>,
    headers: HeaderMap,
) -> Result<Response, Response>
where
    B: IntakeBackend + 'static,
{
    let session = session_for(&services, &headers)?;
    clear_answers(&session)?;
    services.sessions.remove(session_id(&headers));
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub(crate) async fn verify_handler<B>(
    State(services): State<Services<B>>,
    Query(params): Query<LocaleParams>,
    Json(request): Json<VerifyRequest>,
) -> Result<Response, Response>
where
    B: IntakeBackend + 'static,
{
    let locale = services.locale_or_default(params.locale.as_deref());
    let outcome = services
        .verification
        .verify(&request.access_token)
        .await
        .map_err(|err| backend_failure(&err))?;

    match outcome {
        VerificationOutcome::Verified { .. } => Ok(Json(outcome).into_response()),
        VerificationOutcome::UnknownToken => {
            Ok((StatusCode::NOT_FOUND, Json(outcome)).into_response())
        }
        VerificationOutcome::Invalid { errors } => Err(validation_failed(None, &errors, locale)),
    }
}
