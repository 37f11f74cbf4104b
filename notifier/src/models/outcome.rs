//! Build results and dispatch outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dispatch::fsm::DispatchState;

/// Result of the build the notifications belong to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    #[default]
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildResult {
    /// Failed and aborted builds never produce a deployment
    pub fn is_unsuccessful(&self) -> bool {
        matches!(self, BuildResult::Failure | BuildResult::Aborted)
    }
}

impl std::str::FromStr for BuildResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "SUCCESS" => Ok(BuildResult::Success),
            "UNSTABLE" => Ok(BuildResult::Unstable),
            "FAILURE" | "FAILED" => Ok(BuildResult::Failure),
            "NOT_BUILT" => Ok(BuildResult::NotBuilt),
            "ABORTED" => Ok(BuildResult::Aborted),
            _ => Err(format!("Invalid build result: {}", s)),
        }
    }
}

/// Why a single notification did not go through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureReason {
    /// No username/password credential matched the request's credential ID
    InvalidCredentials,
    /// A field exceeded the API's documented limit
    Validation(String),
    /// Non-201 answer or transport failure
    Remote(String),
    /// Unparsable response
    Protocol(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::InvalidCredentials => write!(f, "invalid credentials"),
            FailureReason::Validation(msg) => write!(f, "validation failed: {}", msg),
            FailureReason::Remote(msg) => write!(f, "remote error: {}", msg),
            FailureReason::Protocol(msg) => write!(f, "protocol error: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RequestStatus {
    Succeeded,
    Failed { reason: FailureReason },
}

/// Outcome of one request within a dispatch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestResult {
    pub application_id: String,
    /// Credential ID, never the secret
    pub api_key: String,
    #[serde(flatten)]
    pub status: RequestStatus,
}

impl RequestResult {
    pub fn succeeded(&self) -> bool {
        matches!(self.status, RequestStatus::Succeeded)
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.status {
            RequestStatus::Succeeded => None,
            RequestStatus::Failed { reason } => Some(reason),
        }
    }
}

/// Everything a dispatch did, in request order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub id: String,
    pub state: DispatchState,
    pub results: Vec<RequestResult>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl DispatchOutcome {
    /// True when nothing needed doing or every request went through
    pub fn overall_success(&self) -> bool {
        match self.state {
            DispatchState::Skipped => true,
            DispatchState::Succeeded => self.results.iter().all(RequestResult::succeeded),
            _ => false,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.state == DispatchState::Skipped
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &RequestResult> {
        self.results.iter().filter(|r| r.succeeded())
    }

    pub fn failed(&self) -> impl Iterator<Item = &RequestResult> {
        self.results.iter().filter(|r| !r.succeeded())
    }
}
