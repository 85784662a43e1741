//! HTTP client for the accounts and CloudHub APIs.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use super::{RemoteDirectory, RemoteInventory};
use crate::config::{CrawlConfig, Credentials};
use crate::error::{Error, Result};
use crate::models::{Application, Organization};

const ORGANIZATIONS_PATH: &str = "/accounts/api/organizations";
const APPLICATIONS_PATH: &str = "/cloudhub/api/v2/applications";

/// Header selecting the environment for CloudHub requests.
pub const ENVIRONMENT_HEADER: &str = "x-anypnt-env-id";

/// HTTP client for the remote directory and inventory.
///
/// Cloning is cheap; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct AnypointClient {
    base_url: String,
    credentials: Credentials,
    client: Client,
}

impl AnypointClient {
    /// Create a client from a validated crawl configuration.
    pub fn from_config(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::transport(&config.base_url, e))?;
        Ok(Self::with_client(
            config.base_url.clone(),
            config.credentials.clone(),
            client,
        ))
    }

    /// Create with an explicit reqwest client.
    pub fn with_client(base_url: impl Into<String>, credentials: Credentials, client: Client) -> Self {
        Self {
            base_url: base_url.into(),
            credentials,
            client,
        }
    }

    /// Build a request carrying basic auth and JSON headers.
    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
    }

    /// Send a request, mapping transport failures.
    async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| Error::transport(url, e))
    }

    /// Decode a success response, or turn the status into an error.
    async fn handle_response<T: DeserializeOwned>(&self, url: &str, response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::RemoteStatus {
                target: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await.map_err(|e| Error::transport(url, e))?;
        serde_json::from_slice(&bytes).map_err(|source| Error::Decode {
            target: url.to_string(),
            source,
        })
    }

    /// Get one organization with its sub-organization ids and environments.
    pub async fn get_organization(&self, id: &str) -> Result<Organization> {
        let url = format!("{}{}/{}", self.base_url, ORGANIZATIONS_PATH, id);
        tracing::debug!("Resolving organization {}", id);
        let response = self.send(&url, self.request(Method::GET, &url)).await?;
        self.handle_response(&url, response).await
    }

    /// List applications deployed into an environment.
    pub async fn get_applications(&self, environment_id: &str) -> Result<Vec<Application>> {
        let url = format!("{}{}", self.base_url, APPLICATIONS_PATH);
        tracing::debug!("Listing applications in environment {}", environment_id);
        let request = self
            .request(Method::GET, &url)
            .header(ENVIRONMENT_HEADER, environment_id);
        let response = self.send(&url, request).await?;
        self.handle_response(&url, response).await
    }
}

#[async_trait]
impl RemoteDirectory for AnypointClient {
    async fn resolve(&self, id: &str) -> Result<Organization> {
        self.get_organization(id).await
    }
}

#[async_trait]
impl RemoteInventory for AnypointClient {
    async fn list(&self, environment_id: &str) -> Result<Vec<Application>> {
        self.get_applications(environment_id).await
    }
}
