//! Deployment notification dispatcher

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, info_span, Instrument};

use crate::credentials::{CredentialResolver, OwnerScope};
use crate::dispatch::fsm::{DispatchEvent, DispatchFsm, DispatchState};
use crate::errors::NotifierError;
use crate::http::newrelic::NotificationClient;
use crate::models::{
    BuildResult, DeploymentRequest, DispatchOutcome, ExpandedRequest, FailureReason, RequestResult,
    RequestStatus,
};
use crate::template::Environment;

pub const MISSING_NOTIFICATIONS: &str = "Missing notifications!";
pub const NOTIFY_FAILED: &str = "Failed to notify New Relic";

/// Sends every configured deployment notification for one build
pub struct DeploymentDispatcher {
    client: Arc<dyn NotificationClient>,
    resolver: Arc<dyn CredentialResolver>,
}

impl DeploymentDispatcher {
    pub fn new(client: Arc<dyn NotificationClient>, resolver: Arc<dyn CredentialResolver>) -> Self {
        Self { client, resolver }
    }

    pub fn client(&self) -> &Arc<dyn NotificationClient> {
        &self.client
    }

    /// Notify New Relic about every request, in order.
    ///
    /// Per-request failures end up in the returned outcome. The only error is
    /// a missing or empty request list on a build that did not fail.
    pub async fn dispatch(
        &self,
        build: BuildResult,
        owner: &OwnerScope,
        requests: Option<&[DeploymentRequest]>,
        env: &Environment,
    ) -> Result<DispatchOutcome, NotifierError> {
        let id = uuid::Uuid::new_v4().to_string();
        let span = info_span!("dispatch", id = %id);

        self.run(id, build, owner, requests, env)
            .instrument(span)
            .await
    }

    /// Like [`DeploymentDispatcher::dispatch`], but any failed request fails
    /// the whole call with `NotifyFailed`.
    pub async fn perform(
        &self,
        build: BuildResult,
        owner: &OwnerScope,
        requests: Option<&[DeploymentRequest]>,
        env: &Environment,
    ) -> Result<DispatchOutcome, NotifierError> {
        self.dispatch(build, owner, requests, env)
            .await?
            .into_result()
    }

    async fn run(
        &self,
        id: String,
        build: BuildResult,
        owner: &OwnerScope,
        requests: Option<&[DeploymentRequest]>,
        env: &Environment,
    ) -> Result<DispatchOutcome, NotifierError> {
        let started_at = Utc::now();
        let mut fsm = DispatchFsm::new();
        let mut results = Vec::new();

        advance(&mut fsm, DispatchEvent::Begin)?;

        if build.is_unsuccessful() {
            advance(&mut fsm, DispatchEvent::BuildUnsuccessful)?;
            info!("Build unsuccessful. Skipping New Relic Deployment notification.");
            return Ok(DispatchOutcome {
                id,
                state: fsm.state(),
                results,
                started_at,
                finished_at: Utc::now(),
            });
        }

        let requests = match requests {
            Some(requests) if !requests.is_empty() => requests,
            _ => {
                advance(&mut fsm, DispatchEvent::NoRequests)?;
                error!("{}", MISSING_NOTIFICATIONS);
                return Err(NotifierError::ConfigError(MISSING_NOTIFICATIONS.to_string()));
            }
        };

        advance(&mut fsm, DispatchEvent::RequestsFound(requests.len()))?;
        debug!(
            "Sending {} deployment notification(s) to {}",
            requests.len(),
            self.client.api_endpoint()
        );

        for request in requests {
            let expanded = request.expand(env);

            let status = match self.notify_one(owner, &expanded).await {
                Ok(()) => {
                    advance(&mut fsm, DispatchEvent::RequestSucceeded)?;
                    RequestStatus::Succeeded
                }
                Err(reason) => {
                    advance(&mut fsm, DispatchEvent::RequestFailed)?;
                    RequestStatus::Failed { reason }
                }
            };

            results.push(RequestResult {
                application_id: expanded.application_id,
                api_key: expanded.api_key,
                status,
            });
        }

        advance(&mut fsm, DispatchEvent::Aggregate)?;
        let state = advance(&mut fsm, DispatchEvent::Finish)?;
        debug!(
            "Dispatch finished: {} succeeded, {} failed",
            fsm.succeeded(),
            fsm.failed()
        );

        Ok(DispatchOutcome {
            id,
            state,
            results,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Resolve the credential and send a single notification
    async fn notify_one(
        &self,
        owner: &OwnerScope,
        request: &ExpandedRequest,
    ) -> Result<(), FailureReason> {
        let application_id = request.application_id.as_str();

        let credential = match self
            .resolver
            .resolve(owner, &request.api_key, self.client.api_endpoint())
            .await
        {
            Some(credential) => credential,
            None => {
                let err = NotifierError::CredentialError(format!(
                    "Invalid credentials for Application ID: {}",
                    application_id
                ));
                error!("{}", err);
                return Err(failure_reason(err));
            }
        };

        let sent = self
            .client
            .send_notification(
                &credential,
                application_id,
                request.description.as_deref(),
                request.revision.as_deref(),
                request.changelog.as_deref(),
                request.user.as_deref(),
            )
            .await;

        match sent {
            Ok(true) => {
                info!("Notified New Relic. Application ID: {}", application_id);
                Ok(())
            }
            Ok(false) => {
                error!("Failed to notify New Relic. Application ID: {}", application_id);
                Err(FailureReason::Remote(
                    "deployment was not recorded (expected 201 Created)".to_string(),
                ))
            }
            Err(e) => {
                error!(
                    "Failed to notify New Relic. Application ID: {}: {}",
                    application_id, e
                );
                Err(failure_reason(e))
            }
        }
    }
}

impl DispatchOutcome {
    /// Escalate a failed dispatch into a build-level error
    pub fn into_result(self) -> Result<Self, NotifierError> {
        if self.overall_success() {
            Ok(self)
        } else {
            error!("{}", NOTIFY_FAILED);
            Err(NotifierError::NotifyFailed(NOTIFY_FAILED.to_string()))
        }
    }
}

fn advance(fsm: &mut DispatchFsm, event: DispatchEvent) -> Result<DispatchState, NotifierError> {
    fsm.process(event).map_err(NotifierError::Internal)
}

fn failure_reason(err: NotifierError) -> FailureReason {
    match err {
        NotifierError::CredentialError(_) => FailureReason::InvalidCredentials,
        NotifierError::ValidationError(msg) => FailureReason::Validation(msg),
        NotifierError::ProtocolError(msg) => FailureReason::Protocol(msg),
        NotifierError::RemoteError(msg) => FailureReason::Remote(msg),
        other => FailureReason::Remote(other.to_string()),
    }
}
