use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::hateoas::CollectionEnvelope;
use super::{BackendError, BearerToken, IntakeBackend};
use crate::config::BackendConfig;
use crate::workflows::application::{Application, ApplicationDetails, ApplicationId};
use crate::workflows::lookups::{LookupEntity, LookupKind};
use crate::workflows::management::{ApplicationPage, ApplicationQuery, StatusChangeRequest};

const APPLICATIONS_KEY: &str = "applications";

/// `reqwest` implementation of the backend port.
#[derive(Debug, Clone)]
pub struct HttpIntakeBackend {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccessTokenRequest<'a> {
    access_token: &'a str,
}

impl HttpIntakeBackend {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, BackendError> {
        let response = request
            .send()
            .await
            .map_err(|err| BackendError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let raw = response.text().await.ok();
            warn!(status = status.as_u16(), "backend call failed");
            return Err(BackendError::from_response(status.as_u16(), raw));
        }

        response
            .json::<T>()
            .await
            .map_err(|err| BackendError::Decode(err.to_string()))
    }
}

#[async_trait]
impl IntakeBackend for HttpIntakeBackend {
    async fn fetch_lookups(
        &self,
        kind: LookupKind,
        sort: &str,
    ) -> Result<Vec<LookupEntity>, BackendError> {
        debug!(%kind, sort, "fetching lookup table");
        let request = self
            .client
            .get(self.url(kind.path()))
            .query(&[("sort", sort)]);
        let envelope: CollectionEnvelope<LookupEntity> = self.send(request).await?;
        Ok(envelope.into_items(kind.embedded_key()))
    }

    async fn create_application(
        &self,
        details: &ApplicationDetails,
    ) -> Result<Application, BackendError> {
        let request = self.client.post(self.url(APPLICATIONS_KEY)).json(details);
        self.send(request).await
    }

    async fn list_applications(
        &self,
        query: &ApplicationQuery,
        token: &BearerToken,
    ) -> Result<ApplicationPage, BackendError> {
        let request = self
            .client
            .get(self.url(APPLICATIONS_KEY))
            .query(&query.to_params())
            .bearer_auth(token.as_str());
        let envelope: CollectionEnvelope<Application> = self.send(request).await?;
        let page = envelope.page;
        Ok(ApplicationPage {
            applications: envelope.into_items(APPLICATIONS_KEY),
            page,
        })
    }

    async fn fetch_application(
        &self,
        id: &ApplicationId,
        token: &BearerToken,
    ) -> Result<Application, BackendError> {
        let request = self
            .client
            .get(self.url(&format!("{APPLICATIONS_KEY}/{id}")))
            .bearer_auth(token.as_str());
        self.send(request).await
    }

    async fn update_application(
        &self,
        id: &ApplicationId,
        change: &StatusChangeRequest,
        token: &BearerToken,
    ) -> Result<Application, BackendError> {
        let request = self
            .client
            .put(self.url(&format!("{APPLICATIONS_KEY}/{id}")))
            .json(change)
            .bearer_auth(token.as_str());
        self.send(request).await
    }

    async fn select_applications(
        &self,
        count: u32,
        token: &BearerToken,
    ) -> Result<Vec<Application>, BackendError> {
        let request = self
            .client
            .post(self.url(&format!("{APPLICATIONS_KEY}/select/{count}")))
            .bearer_auth(token.as_str());
        let envelope: CollectionEnvelope<Application> = self.send(request).await?;
        Ok(envelope.into_items(APPLICATIONS_KEY))
    }

    async fn verify_email(&self, access_token: &str) -> Result<Application, BackendError> {
        let request = self
            .client
            .post(self.url("email-validations/access-tokens"))
            .json(&AccessTokenRequest { access_token });
        self.send(request).await
    }
}
