//! New Relic REST API client
//!
//! Two deployment endpoints exist: the v2 JSON endpoint, which carries the
//! application ID in the path, and the legacy form-encoded `deployments.xml`
//! endpoint. Both answer `201 Created` when the deployment is recorded.

use async_trait::async_trait;
use newrelic_api::{Application, ApplicationList, DeploymentBody, DeploymentEnvelope, ErrorResponse};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

use crate::credentials::ResolvedCredential;
use crate::errors::NotifierError;
use crate::http::client::{ClientOptions, HttpClient};

/// Production API host
pub const DEFAULT_API_URL: &str = "https://api.newrelic.com";

pub const APPLICATIONS_ENDPOINT: &str = "/v2/applications.json";

pub const LEGACY_DEPLOYMENT_ENDPOINT: &str = "/deployments.xml";

/// Revisions must be shorter than this many characters
pub const MAX_REVISION_LEN: usize = 127;
/// Descriptions and changelogs must be shorter than this many characters
pub const MAX_TEXT_LEN: usize = 65535;
/// Users must be shorter than this many characters
pub const MAX_USER_LEN: usize = 31;

/// Path of the v2 deployment endpoint for `application_id`.
///
/// The ID is percent-encoded as a single path segment.
pub fn deployment_endpoint(application_id: &str) -> Result<String, NotifierError> {
    let mut url = Url::parse("http://localhost/")
        .map_err(|e| NotifierError::Internal(format!("Invalid base URL: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| NotifierError::Internal("Base URL cannot carry a path".to_string()))?
        .clear()
        .extend(["v2", "applications", application_id, "deployments.json"]);
    Ok(url.path().to_string())
}

/// Reject application IDs that cannot name a single application
pub fn validate_application_id(application_id: &str) -> Result<(), NotifierError> {
    // the url crate silently drops dot segments
    match application_id.trim() {
        "" => Err(NotifierError::ValidationError(
            "Application ID is required".to_string(),
        )),
        "." | ".." => Err(NotifierError::ValidationError(format!(
            "Invalid Application ID: {}",
            application_id
        ))),
        _ => Ok(()),
    }
}

/// Deployment endpoint flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiVersion {
    /// `POST /v2/applications/{id}/deployments.json` with a JSON body
    #[default]
    V2,
    /// `POST /deployments.xml` with `deployment[...]` form fields
    Legacy,
}

/// Client for the New Relic deployment API
#[async_trait]
pub trait NotificationClient: Send + Sync {
    /// Applications visible to `api_key`
    async fn list_applications(
        &self,
        api_key: &ResolvedCredential,
    ) -> Result<Vec<Application>, NotifierError>;

    /// Record a deployment. `Ok(true)` only when the API answers 201 Created;
    /// any other status is `Ok(false)`. Oversized fields fail with
    /// `ValidationError` before anything is sent.
    async fn send_notification(
        &self,
        api_key: &ResolvedCredential,
        application_id: &str,
        description: Option<&str>,
        revision: Option<&str>,
        changelog: Option<&str>,
        user: Option<&str>,
    ) -> Result<bool, NotifierError>;

    /// Base URL the client talks to, also used to scope credential lookups
    fn api_endpoint(&self) -> &str;
}

/// Reject fields the API would refuse
pub fn validate_fields(
    description: Option<&str>,
    revision: Option<&str>,
    changelog: Option<&str>,
    user: Option<&str>,
) -> Result<(), NotifierError> {
    let checks = [
        ("revision", revision, MAX_REVISION_LEN),
        ("changelog", changelog, MAX_TEXT_LEN),
        ("description", description, MAX_TEXT_LEN),
        ("user", user, MAX_USER_LEN),
    ];

    for (field, value, limit) in checks {
        if let Some(value) = value {
            if value.chars().count() >= limit {
                return Err(NotifierError::ValidationError(format!(
                    "The length of {} should be less than {} characters",
                    field, limit
                )));
            }
        }
    }

    Ok(())
}

/// `NotificationClient` backed by the New Relic REST API
pub struct NewRelicClient {
    http: HttpClient,
    api_version: ApiVersion,
}

impl NewRelicClient {
    pub fn new(options: &ClientOptions) -> Result<Self, NotifierError> {
        Ok(Self {
            http: HttpClient::new(options)?,
            api_version: options.api_version,
        })
    }

    /// Client for `endpoint` with otherwise default options
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, NotifierError> {
        Self::new(&ClientOptions {
            endpoint: endpoint.into(),
            ..Default::default()
        })
    }

    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }
}

#[async_trait]
impl NotificationClient for NewRelicClient {
    async fn list_applications(
        &self,
        api_key: &ResolvedCredential,
    ) -> Result<Vec<Application>, NotifierError> {
        let response = self.http.get(APPLICATIONS_ENDPOINT, api_key.expose()).await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.title)
                .unwrap_or(body);
            warn!("Listing applications failed: {} - {}", status, detail);
            return Err(NotifierError::RemoteError(format!("{}: {}", status, detail)));
        }

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Err(NotifierError::ProtocolError(
                "Response contains no content".to_string(),
            ));
        }

        let list: ApplicationList = serde_json::from_str(&body).map_err(|e| {
            NotifierError::ProtocolError(format!("Unexpected applications response: {}", e))
        })?;

        debug!("Found {} application(s)", list.applications.len());
        Ok(list.applications)
    }

    async fn send_notification(
        &self,
        api_key: &ResolvedCredential,
        application_id: &str,
        description: Option<&str>,
        revision: Option<&str>,
        changelog: Option<&str>,
        user: Option<&str>,
    ) -> Result<bool, NotifierError> {
        validate_application_id(application_id)?;
        validate_fields(description, revision, changelog, user)?;

        let deployment = DeploymentBody {
            revision: revision.map(str::to_string),
            changelog: changelog.map(str::to_string),
            description: description.map(str::to_string),
            user: user.map(str::to_string),
        };

        let status = match self.api_version {
            ApiVersion::V2 => {
                let path = deployment_endpoint(application_id)?;
                let envelope = DeploymentEnvelope { deployment };
                let payload = serde_json::to_string(&envelope)?;
                debug!("Deployment for {}: {}", application_id, payload);
                self.http
                    .post_json(&path, api_key.expose(), &envelope)
                    .await?
            }
            ApiVersion::Legacy => {
                let form = deployment.form_pairs(application_id);
                debug!("Deployment for {}: {:?}", application_id, form);
                self.http
                    .post_form(LEGACY_DEPLOYMENT_ENDPOINT, api_key.expose(), &form)
                    .await?
            }
        };

        if status != StatusCode::CREATED {
            warn!(
                "New Relic responded {} for application {}",
                status, application_id
            );
        }

        Ok(status == StatusCode::CREATED)
    }

    fn api_endpoint(&self) -> &str {
        self.http.base_url()
    }
}
