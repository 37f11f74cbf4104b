//! `notifyNewRelic` pipeline step

use serde::{Deserialize, Serialize};

use crate::dispatch::DeploymentDispatcher;
use crate::errors::NotifierError;
use crate::models::{DeploymentRequest, DispatchOutcome};
use crate::steps::BuildContext;
use crate::utils::fix_empty_and_trim;

/// Records one deployment from a pipeline script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyStep {
    api_key: String,
    application_id: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    revision: Option<String>,
    #[serde(default)]
    changelog: Option<String>,
    #[serde(default)]
    user: Option<String>,
}

impl NotifyStep {
    pub const FUNCTION_NAME: &'static str = "notifyNewRelic";
    pub const DISPLAY_NAME: &'static str = "Notifies a New Relic instance about deployment";

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

    /// The single request this step stands for
    pub fn requests(&self) -> Vec<DeploymentRequest> {
        let mut request = DeploymentRequest::new(&self.api_key, &self.application_id);
        request.set_description(self.description.clone());
        request.set_revision(self.revision.clone());
        request.set_changelog(self.changelog.clone());
        request.set_user(self.user.clone());
        vec![request]
    }

    /// Run the step; any failure fails the build
    pub async fn run(
        &self,
        dispatcher: &DeploymentDispatcher,
        ctx: &BuildContext,
    ) -> Result<DispatchOutcome, NotifierError> {
        let requests = self.requests();
        dispatcher
            .perform(ctx.result, &ctx.owner, Some(&requests), &ctx.env)
            .await
    }
}
