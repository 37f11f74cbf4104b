//! API models

use serde::{Deserialize, Deserializer, Serialize};

/// An application registered with New Relic APM
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Application ID. The v2 API returns a number, older payloads a string.
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub name: String,
}

/// Response of `GET /v2/applications.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationList {
    #[serde(default)]
    pub applications: Vec<Application>,
}

/// Deployment fields shared by the JSON and form-encoded endpoints
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl DeploymentBody {
    /// Form pairs for the legacy `/deployments.xml` endpoint, which carries the
    /// application ID in the body rather than the path.
    pub fn form_pairs(&self, application_id: &str) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("deployment[application_id]", application_id.to_string())];
        let optional = [
            ("deployment[description]", &self.description),
            ("deployment[revision]", &self.revision),
            ("deployment[changelog]", &self.changelog),
            ("deployment[user]", &self.user),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                pairs.push((key, value.clone()));
            }
        }
        pairs
    }
}

/// Body of `POST /v2/applications/{id}/deployments.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentEnvelope {
    pub deployment: DeploymentBody,
}

/// Error body returned by the v2 API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub title: String,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number for application id, got {}",
            other
        ))),
    }
}
