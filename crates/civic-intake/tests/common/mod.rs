//! A stand-in for the program's REST backend, served on an ephemeral local port.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use civic_intake::config::BackendConfig;

pub const ADMIN_TOKEN: &str = "admin-token";
pub const ACCESS_TOKEN: &str = "access-123";

#[derive(Default)]
pub struct FakeState {
    applications: Mutex<Vec<Value>>,
    requests: Mutex<Vec<String>>,
}

impl FakeState {
    fn record(&self, line: String) {
        self.requests.lock().expect("requests lock").push(line);
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn applications(&self) -> Vec<Value> {
        self.applications.lock().expect("applications lock").clone()
    }
}

pub struct FakeBackend {
    pub state: Arc<FakeState>,
    pub base_url: String,
}

impl FakeBackend {
    pub fn config(&self) -> BackendConfig {
        BackendConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(5),
        }
    }
}

pub async fn spawn() -> FakeBackend {
    let state = Arc::new(FakeState::default());
    let app = Router::new()
        .route("/api/v1/languages", get(languages))
        .route("/api/v1/provinces", get(broken_table))
        .route(
            "/api/v1/applications",
            get(list_applications).post(create_application),
        )
        .route(
            "/api/v1/applications/:id",
            get(fetch_application).put(update_application),
        )
        .route("/api/v1/applications/select/:count", post(select_applications))
        .route("/api/v1/email-validations/access-tokens", post(verify_email))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fake backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake backend serves");
    });

    FakeBackend {
        state,
        base_url: format!("http://{addr}/api/v1"),
    }
}

/// A base URL nothing listens on.
pub async fn closed_port_config() -> BackendConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind probe");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    BackendConfig {
        base_url: format!("http://{addr}/api/v1"),
        timeout: Duration::from_secs(2),
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    let expected = format!("Bearer {ADMIN_TOKEN}");
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        == Some(expected.as_str())
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "token expired" }))).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "message": "no such application" }))).into_response()
}

async fn languages(
    State(state): State<Arc<FakeState>>,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Json<Value> {
    state.record(format!(
        "GET languages sort={}",
        params.get("sort").cloned().unwrap_or_default()
    ));
    Json(json!({
        "_embedded": {
            "languages": [
                {
                    "id": "lang-fr",
                    "descriptionEn": "French",
                    "descriptionFr": "Français",
                    "activationDate": "2020-01-01T00:00:00Z",
                    "displayOrderEn": 2,
                    "displayOrderFr": 1
                },
                {
                    "id": "lang-en",
                    "descriptionEn": "English",
                    "descriptionFr": "Anglais",
                    "activationDate": "2020-01-01T00:00:00Z",
                    "displayOrderEn": 1,
                    "displayOrderFr": 2
                },
                {
                    "id": "lang-retired",
                    "descriptionEn": "Retired",
                    "descriptionFr": "Retiré",
                    "activationDate": "2010-01-01T00:00:00Z",
                    "expirationDate": "2015-01-01T00:00:00Z",
                    "displayOrderEn": 0,
                    "displayOrderFr": 0
                }
            ]
        },
        "_links": { "self": { "href": "/api/v1/languages" } }
    }))
}

async fn broken_table() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "<html>upstream exploded</html>").into_response()
}

async fn create_application(
    State(state): State<Arc<FakeState>>,
    Json(mut body): Json<Value>,
) -> Response {
    state.record("POST applications".to_string());
    let mut applications = state.applications.lock().expect("applications lock");
    let id = format!("app-{}", applications.len() + 1);
    body["id"] = json!(id);
    body["statusId"] = json!("submitted");
    body["accessCode"] = json!(ACCESS_TOKEN);
    body["isEmailVerified"] = json!(false);
    body["createdBy"] = json!("anonymous");
    body["createdDate"] = json!("2024-05-01T12:00:00Z");
    applications.push(body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn list_applications(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Query(params): Query<std::collections::HashMap<String, String>>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut keys: Vec<String> = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    keys.sort();
    state.record(format!("GET applications {}", keys.join("&")));

    let applications = state.applications();
    let total = applications.len();
    Json(json!({
        "_embedded": { "applications": applications },
        "page": { "size": 20, "totalElements": total, "totalPages": 1, "number": 0 }
    }))
    .into_response()
}

async fn fetch_application(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state
        .applications()
        .into_iter()
        .find(|application| application["id"] == json!(id))
        .map_or_else(not_found, |application| Json(application).into_response())
}

async fn update_application(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(change): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.record(format!("PUT applications/{id} {change}"));
    let mut applications = state.applications.lock().expect("applications lock");
    match applications
        .iter_mut()
        .find(|application| application["id"] == json!(id))
    {
        Some(application) => {
            application["statusId"] = change["statusId"].clone();
            Json(application.clone()).into_response()
        }
        None => not_found(),
    }
}

async fn select_applications(
    State(state): State<Arc<FakeState>>,
    headers: HeaderMap,
    Path(count): Path<usize>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.record(format!("POST applications/select/{count}"));
    let mut applications = state.applications.lock().expect("applications lock");
    let selected: Vec<Value> = applications
        .iter_mut()
        .filter(|application| application["statusId"] == json!("submitted"))
        .take(count)
        .map(|application| {
            application["statusId"] = json!("selected");
            application.clone()
        })
        .collect();
    Json(json!({ "_embedded": { "applications": selected } })).into_response()
}

async fn verify_email(
    State(state): State<Arc<FakeState>>,
    Json(body): Json<Value>,
) -> Response {
    let token = body["accessToken"].as_str().unwrap_or_default().to_string();
    state.record(format!("POST email-validations {token}"));
    let mut applications = state.applications.lock().expect("applications lock");
    match applications
        .iter_mut()
        .find(|application| application["accessCode"] == json!(token))
    {
        Some(application) => {
            application["isEmailVerified"] = json!(true);
            Json(application.clone()).into_response()
        }
        None => not_found(),
    }
}
