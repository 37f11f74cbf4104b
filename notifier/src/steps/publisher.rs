//! Post-build notifier with a list of notifications

use serde::{Deserialize, Serialize};

use crate::dispatch::DeploymentDispatcher;
use crate::errors::NotifierError;
use crate::filesys::file::File;
use crate::models::{DeploymentRequest, DispatchOutcome};
use crate::steps::BuildContext;

/// Sends every configured notification once the build has finished
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentNotifier {
    #[serde(default)]
    notifications: Option<Vec<DeploymentRequest>>,
}

impl DeploymentNotifier {
    pub const DISPLAY_NAME: &'static str = "New Relic Deployment Notifications";

    pub fn new(notifications: Option<Vec<DeploymentRequest>>) -> Self {
        Self { notifications }
    }

    /// Read the notification list from a JSON array of requests
    pub async fn from_file(file: &File) -> Result<Self, NotifierError> {
        if !file.exists().await {
            return Err(NotifierError::ConfigError(format!(
                "Notifications file not found: {}",
                file.path().display()
            )));
        }
        let notifications: Vec<DeploymentRequest> = file.read_json().await?;
        Ok(Self::new(Some(notifications)))
    }

    pub fn notifications(&self) -> Option<&[DeploymentRequest]> {
        self.notifications.as_deref()
    }

    /// Notify New Relic; fails the build on a missing list or any failed request
    pub async fn perform(
        &self,
        dispatcher: &DeploymentDispatcher,
        ctx: &BuildContext,
    ) -> Result<DispatchOutcome, NotifierError> {
        dispatcher
            .perform(ctx.result, &ctx.owner, self.notifications(), &ctx.env)
            .await
    }
}
