//! Choices offered when configuring a notification

use newrelic_api::Application;
use tracing::warn;

use crate::credentials::{CredentialResolver, CredentialStore, OwnerScope};
use crate::errors::NotifierError;
use crate::http::newrelic::NotificationClient;

/// Credential IDs `owner` can select for the client's endpoint
pub fn credential_choices<'a>(
    store: &'a CredentialStore,
    owner: &OwnerScope,
    client: &dyn NotificationClient,
) -> Vec<&'a str> {
    store.applicable_ids(owner, client.api_endpoint())
}

/// Applications visible through `credential_id`.
///
/// An unknown credential yields no choices rather than an error.
pub async fn application_choices(
    client: &dyn NotificationClient,
    resolver: &dyn CredentialResolver,
    owner: &OwnerScope,
    credential_id: &str,
) -> Result<Vec<Application>, NotifierError> {
    match resolver
        .resolve(owner, credential_id, client.api_endpoint())
        .await
    {
        Some(credential) => client.list_applications(&credential).await,
        None => {
            warn!("No usable credential {} for {}", credential_id, owner);
            Ok(Vec::new())
        }
    }
}
