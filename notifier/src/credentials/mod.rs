//! Credential resolution
//!
//! Requests reference credentials by ID. The secret is looked up at dispatch
//! time and lives only as long as the request that needs it.

pub mod store;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

pub use store::{CredentialKind, CredentialScope, CredentialStore, StoredCredential};

/// The job a build belongs to, which limits the credentials it may use
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerScope {
    job: Option<String>,
}

impl OwnerScope {
    /// A context that only sees global credentials
    pub fn global() -> Self {
        Self { job: None }
    }

    pub fn job(name: impl Into<String>) -> Self {
        Self {
            job: Some(name.into()),
        }
    }

    pub fn job_name(&self) -> Option<&str> {
        self.job.as_deref()
    }
}

impl std::fmt::Display for OwnerScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.job {
            Some(job) => write!(f, "job:{}", job),
            None => write!(f, "global"),
        }
    }
}

/// An API key obtained from the credential store
pub struct ResolvedCredential {
    id: String,
    secret: SecretString,
}

impl ResolvedCredential {
    pub fn new(id: impl Into<String>, secret: SecretString) -> Self {
        Self {
            id: id.into(),
            secret,
        }
    }

    /// Credential ID this key was resolved from
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The raw API key. Only for building request headers.
    pub fn expose(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl std::fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("id", &self.id)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Looks up API keys by credential ID
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    /// Find a username/password credential named `credential_id` that `owner`
    /// may use against `endpoint`. `None` when nothing applicable exists.
    async fn resolve(
        &self,
        owner: &OwnerScope,
        credential_id: &str,
        endpoint: &str,
    ) -> Option<ResolvedCredential>;
}
