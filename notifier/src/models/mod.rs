//! Notification models

pub mod outcome;
pub mod request;

pub use outcome::{BuildResult, DispatchOutcome, FailureReason, RequestResult, RequestStatus};
pub use request::{DeploymentRequest, ExpandedRequest};
