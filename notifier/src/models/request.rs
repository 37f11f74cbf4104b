//! Deployment notification requests

use serde::{Deserialize, Serialize};

use crate::template::Environment;
use crate::utils::fix_empty_and_trim;

/// One deployment notification to send for a build.
///
/// `api_key` names a credential in the credential store; it is never the
/// secret itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    api_key: String,
    application_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    changelog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl DeploymentRequest {
    /// Create a request with no description, revision, changelog or user
    pub fn new(api_key: impl Into<String>, application_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            application_id: application_id.into(),
            description: None,
            revision: None,
            changelog: None,
            user: None,
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn revision(&self) -> Option<&str> {
        self.revision.as_deref()
    }

    pub fn changelog(&self) -> Option<&str> {
        self.changelog.as_deref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn set_description(&mut self, description: Option<String>) {
        self.description = fix_empty_and_trim(description);
    }

    pub fn set_revision(&mut self, revision: Option<String>) {
        self.revision = fix_empty_and_trim(revision);
    }

    pub fn set_changelog(&mut self, changelog: Option<String>) {
        self.changelog = fix_empty_and_trim(changelog);
    }

    pub fn set_user(&mut self, user: Option<String>) {
        self.user = fix_empty_and_trim(user);
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.set_description(Some(description.into()));
        self
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.set_revision(Some(revision.into()));
        self
    }

    pub fn with_changelog(mut self, changelog: impl Into<String>) -> Self {
        self.set_changelog(Some(changelog.into()));
        self
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.set_user(Some(user.into()));
        self
    }

    /// Resolve placeholders in the free-text fields against `env`
    pub fn expand(&self, env: &Environment) -> ExpandedRequest {
        let expand = |field: &Option<String>| {
            fix_empty_and_trim(field.as_deref().map(|value| env.expand(value)))
        };

        ExpandedRequest {
            api_key: self.api_key.clone(),
            application_id: self.application_id.clone(),
            description: expand(&self.description),
            revision: expand(&self.revision),
            changelog: expand(&self.changelog),
            user: expand(&self.user),
        }
    }
}

/// A request with its placeholders resolved for one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedRequest {
    pub api_key: String,
    pub application_id: String,
    pub description: Option<String>,
    pub revision: Option<String>,
    pub changelog: Option<String>,
    pub user: Option<String>,
}
