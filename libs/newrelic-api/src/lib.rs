//! New Relic REST API models
//!
//! Request and response bodies exchanged with `api.newrelic.com`.

pub mod models;

pub use models::{
    Application, ApplicationList, DeploymentBody, DeploymentEnvelope, ErrorDetail, ErrorResponse,
};
