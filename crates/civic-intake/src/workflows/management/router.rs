use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use serde_json::json;

use super::domain::{ApplicationQuery, StatusChange};
use super::service::ManagementError;
use crate::backend::{BearerToken, IntakeBackend};
use crate::workflows::application::router::LocaleParams;
use crate::workflows::application::ApplicationId;
use crate::workflows::lookups::Locale;
use crate::workflows::problem::{backend_failure, unauthorized, validation_failed};
use crate::workflows::IntakeServices;

/// Router builder for the administrator console. Every route requires a bearer token.
pub fn management_router<B>(services: Arc<IntakeServices<B>>) -> Router
where
    B: IntakeBackend + 'static,
{
    Router::new()
        .route(
            "/api/v1/management/applications",
            get(list_handler::<B>),
        )
        .route(
            "/api/v1/management/applications/:application_id",
            get(detail_handler::<B>),
        )
        .route(
            "/api/v1/management/applications/:application_id/status",
            put(status_handler::<B>),
        )
        .route(
            "/api/v1/management/selections/:count",
            post(select_handler::<B>),
        )
        .with_state(services)
}

fn bearer(headers: &HeaderMap) -> Option<BearerToken> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(BearerToken::from_header)
}

fn management_failure(err: ManagementError, locale: Locale) -> Response {
    match err {
        ManagementError::Validation(errors) => validation_failed(None, &errors, locale),
        ManagementError::Backend(err) => backend_failure(&err),
    }
}

pub(crate) async fn list_handler<B>(
    State(services): State<Arc<IntakeServices<B>>>,
    headers: HeaderMap,
    Query(query): Query<ApplicationQuery>,
    Query(params): Query<LocaleParams>,
) -> Response
where
    B: IntakeBackend + 'static,
{
    let locale = services.locale_or_default(params.locale.as_deref());
    let Some(token) = bearer(&headers) else {
        return unauthorized();
    };

    match services.management.list(query, &token).await {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(err) => management_failure(err, locale),
    }
}

pub(crate) async fn detail_handler<B>(
    State(services): State<Arc<IntakeServices<B>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Query(params): Query<LocaleParams>,
) -> Response
where
    B: IntakeBackend + 'static,
{
    let locale = services.locale_or_default(params.locale.as_deref());
    let Some(token) = bearer(&headers) else {
        return unauthorized();
    };

    let id = ApplicationId(application_id);
    match services.management.get(&id, &token).await {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => management_failure(err, locale),
    }
}

pub(crate) async fn status_handler<B>(
    State(services): State<Arc<IntakeServices<B>>>,
    headers: HeaderMap,
    Path(application_id): Path<String>,
    Query(params): Query<LocaleParams>,
    axum::Json(change): axum::Json<StatusChange>,
) -> Response
where
    B: IntakeBackend + 'static,
{
    let locale = services.locale_or_default(params.locale.as_deref());
    let Some(token) = bearer(&headers) else {
        return unauthorized();
    };

    let id = ApplicationId(application_id);
    match services.management.change_status(&id, change, &token).await {
        Ok(application) => (StatusCode::OK, axum::Json(application)).into_response(),
        Err(err) => management_failure(err, locale),
    }
}

pub(crate) async fn select_handler<B>(
    State(services): State<Arc<IntakeServices<B>>>,
    headers: HeaderMap,
    Path(count): Path<u32>,
    Query(params): Query<LocaleParams>,
) -> Response
where
    B: IntakeBackend + 'static,
{
    let locale = services.locale_or_default(params.locale.as_deref());
    let Some(token) = bearer(&headers) else {
        return unauthorized();
    };

    match services.management.select(count, &token).await {
        Ok(report) => {
            let payload = json!({
                "requested": report.requested,
                "selected": report.selected,
                "shortfall": report.shortfall(),
                "applicationIds": report.application_ids,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => management_failure(err, locale),
    }
}
