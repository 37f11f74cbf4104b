//! File-backed credential store

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use tracing::{debug, warn};

use crate::credentials::{CredentialResolver, OwnerScope, ResolvedCredential};
use crate::errors::NotifierError;
use crate::filesys::file::File;

/// Where a credential is visible
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialScope {
    /// Every job
    Global,
    /// A single job, by name
    Job(String),
}

impl CredentialScope {
    fn applies_to(&self, owner: &OwnerScope) -> bool {
        match self {
            CredentialScope::Global => true,
            CredentialScope::Job(name) => owner.job_name() == Some(name.as_str()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialKind {
    UsernamePassword {
        username: String,
        #[serde(deserialize_with = "secret")]
        password: SecretString,
    },
    SecretText {
        #[serde(deserialize_with = "secret")]
        secret: SecretString,
    },
}

/// A credential entry as stored in `credentials.json`
#[derive(Debug, Deserialize)]
pub struct StoredCredential {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_scope")]
    pub scope: CredentialScope,
    /// Hostname the credential is registered for; `None` matches any host
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(flatten)]
    pub kind: CredentialKind,
}

fn default_scope() -> CredentialScope {
    CredentialScope::Global
}

fn secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl StoredCredential {
    /// A global username/password credential usable against any host
    pub fn username_password(
        id: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: None,
            scope: CredentialScope::Global,
            domain: None,
            kind: CredentialKind::UsernamePassword {
                username: username.into(),
                password: SecretString::from(password.into()),
            },
        }
    }

    pub fn with_scope(mut self, scope: CredentialScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    fn matches_host(&self, host: Option<&str>) -> bool {
        match (&self.domain, host) {
            (None, _) => true,
            (Some(domain), Some(host)) => domain.eq_ignore_ascii_case(host),
            (Some(_), None) => false,
        }
    }

    fn is_applicable(&self, owner: &OwnerScope, host: Option<&str>) -> bool {
        matches!(self.kind, CredentialKind::UsernamePassword { .. })
            && self.scope.applies_to(owner)
            && self.matches_host(host)
    }
}

#[derive(Debug, Default, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    credentials: Vec<StoredCredential>,
}

/// Credentials loaded from a JSON file
#[derive(Debug, Default)]
pub struct CredentialStore {
    credentials: Vec<StoredCredential>,
}

impl CredentialStore {
    pub fn new(credentials: Vec<StoredCredential>) -> Self {
        Self { credentials }
    }

    /// Load the store from `{"credentials": [...]}`
    pub async fn load(file: &File) -> Result<Self, NotifierError> {
        if !file.exists().await {
            warn!("Credentials file not found: {}", file.path().display());
            return Ok(Self::default());
        }

        let parsed: CredentialsFile = file.read_json().await.map_err(|e| {
            NotifierError::ConfigError(format!(
                "Unable to read credentials file {}: {}",
                file.path().display(),
                e
            ))
        })?;

        debug!("Loaded {} credential(s)", parsed.credentials.len());
        Ok(Self::new(parsed.credentials))
    }

    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// IDs of the credentials `owner` could pick for `endpoint`
    pub fn applicable_ids(&self, owner: &OwnerScope, endpoint: &str) -> Vec<&str> {
        let host = endpoint_host(endpoint);
        self.credentials
            .iter()
            .filter(|c| c.is_applicable(owner, host.as_deref()))
            .map(|c| c.id.as_str())
            .collect()
    }
}

#[async_trait]
impl CredentialResolver for CredentialStore {
    async fn resolve(
        &self,
        owner: &OwnerScope,
        credential_id: &str,
        endpoint: &str,
    ) -> Option<ResolvedCredential> {
        let host = endpoint_host(endpoint);

        let found = self
            .credentials
            .iter()
            .filter(|c| c.id == credential_id)
            .find(|c| c.is_applicable(owner, host.as_deref()));

        match found {
            Some(StoredCredential {
                kind: CredentialKind::UsernamePassword { password, .. },
                ..
            }) => {
                debug!("Resolved credential {} for {}", credential_id, owner);
                Some(ResolvedCredential::new(
                    credential_id,
                    SecretString::from(password.expose_secret().to_owned()),
                ))
            }
            _ => {
                debug!(
                    "No username/password credential {} available to {} for {}",
                    credential_id, owner, endpoint
                );
                None
            }
        }
    }
}

fn endpoint_host(endpoint: &str) -> Option<String> {
    url::Url::parse(endpoint)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
}
