//! Build integration surfaces
//!
//! `NotifyStep` is the single-notification pipeline step, `DeploymentNotifier`
//! the post-build step holding a list of notifications. Both hand their
//! requests to a [`DeploymentDispatcher`](crate::dispatch::DeploymentDispatcher).

pub mod choices;
pub mod pipeline;
pub mod publisher;

pub use choices::{application_choices, credential_choices};
pub use pipeline::NotifyStep;
pub use publisher::DeploymentNotifier;

use crate::credentials::OwnerScope;
use crate::models::BuildResult;
use crate::template::Environment;

/// What the build host knows about the build being notified
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub result: BuildResult,
    pub owner: OwnerScope,
    pub env: Environment,
}

impl BuildContext {
    pub fn new(result: BuildResult, owner: OwnerScope, env: Environment) -> Self {
        Self { result, owner, env }
    }
}
