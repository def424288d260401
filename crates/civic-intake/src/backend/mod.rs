//! Port to the backend REST API that owns lookups and application records.

pub mod hateoas;
pub mod http;

use std::fmt;

use async_trait::async_trait;
use serde_json::Value;

use crate::workflows::application::{Application, ApplicationDetails, ApplicationId};
use crate::workflows::lookups::{LookupEntity, LookupKind};
use crate::workflows::management::{ApplicationPage, ApplicationQuery, StatusChangeRequest};

pub use http::HttpIntakeBackend;

/// Bearer token issued by the external session provider.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BearerToken(String);

impl BearerToken {
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Parse an `Authorization: Bearer <token>` header value.
    pub fn from_header(value: &str) -> Option<Self> {
        let (scheme, token) = value.trim().split_once(' ')?;
        if scheme.eq_ignore_ascii_case("bearer") {
            Self::new(token)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}

/// Failure talking to the backend. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("backend responded with status {status}")]
    Http {
        status: u16,
        body: Option<Value>,
        text: Option<String>,
    },
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("backend response could not be decoded: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Http { status, .. } => Some(*status),
            BackendError::Transport(_) | BackendError::Decode(_) => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Build an HTTP error from a raw response body, keeping both forms when possible.
    pub fn from_response(status: u16, raw: Option<String>) -> Self {
        let text = raw.filter(|text| !text.trim().is_empty());
        let body = text
            .as_deref()
            .and_then(|text| serde_json::from_str::<Value>(text).ok());
        BackendError::Http { status, body, text }
    }
}

#[async_trait]
pub trait IntakeBackend: Send + Sync {
    /// `GET /{kind}?sort=...`, anonymous.
    async fn fetch_lookups(
        &self,
        kind: LookupKind,
        sort: &str,
    ) -> Result<Vec<LookupEntity>, BackendError>;

    /// `POST /applications`, anonymous.
    async fn create_application(
        &self,
        details: &ApplicationDetails,
    ) -> Result<Application, BackendError>;

    /// `GET /applications` with paging, sorting and filters.
    async fn list_applications(
        &self,
        query: &ApplicationQuery,
        token: &BearerToken,
    ) -> Result<ApplicationPage, BackendError>;

    async fn fetch_application(
        &self,
        id: &ApplicationId,
        token: &BearerToken,
    ) -> Result<Application, BackendError>;

    /// `PUT /applications/{id}` with a status change and its reason.
    async fn update_application(
        &self,
        id: &ApplicationId,
        change: &StatusChangeRequest,
        token: &BearerToken,
    ) -> Result<Application, BackendError>;

    /// `POST /applications/select/{count}`; returns the applications actually selected.
    async fn select_applications(
        &self,
        count: u32,
        token: &BearerToken,
    ) -> Result<Vec<Application>, BackendError>;

    /// `POST /email-validations/access-tokens`, anonymous.
    async fn verify_email(&self, access_token: &str) -> Result<Application, BackendError>;
}
