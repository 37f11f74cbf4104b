//! Finite State Machine for a notification dispatch

use serde::{Deserialize, Serialize};

/// Dispatch state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchState {
    /// Nothing done yet
    Start,

    /// Inspecting the build result and request list
    PreconditionCheck,

    /// Build failed or was aborted, nothing to notify
    Skipped,

    /// No requests configured
    AbortedMissingRequests,

    /// Sending notifications one by one
    PerRequestLoop,

    /// Every request has a result
    Aggregated,

    /// Every notification went through
    Succeeded,

    /// At least one notification failed
    Failed,
}

impl DispatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DispatchState::Skipped
                | DispatchState::AbortedMissingRequests
                | DispatchState::Succeeded
                | DispatchState::Failed
        )
    }
}

/// Dispatch event
#[derive(Debug, Clone)]
pub enum DispatchEvent {
    /// Start checking preconditions
    Begin,

    /// Build result rules out a deployment
    BuildUnsuccessful,

    /// Request list is empty or absent
    NoRequests,

    /// This many requests will be processed
    RequestsFound(usize),

    /// A request was recorded by New Relic
    RequestSucceeded,

    /// A request failed
    RequestFailed,

    /// All requests have been processed
    Aggregate,

    /// Reduce the per-request results to a final state
    Finish,
}

/// Dispatch FSM
#[derive(Debug, Clone)]
pub struct DispatchFsm {
    state: DispatchState,
    expected: usize,
    succeeded: usize,
    failed: usize,
}

impl DispatchFsm {
    /// Create a new FSM in the start state
    pub fn new() -> Self {
        Self {
            state: DispatchState::Start,
            expected: 0,
            succeeded: 0,
            failed: 0,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn remaining(&self) -> usize {
        self.expected - self.succeeded - self.failed
    }

    /// Process an event and transition state
    pub fn process(&mut self, event: DispatchEvent) -> Result<DispatchState, String> {
        let new_state = match (self.state, &event) {
            (DispatchState::Start, DispatchEvent::Begin) => DispatchState::PreconditionCheck,

            (DispatchState::PreconditionCheck, DispatchEvent::BuildUnsuccessful) => {
                DispatchState::Skipped
            }
            (DispatchState::PreconditionCheck, DispatchEvent::NoRequests) => {
                DispatchState::AbortedMissingRequests
            }
            (DispatchState::PreconditionCheck, DispatchEvent::RequestsFound(0)) => {
                DispatchState::AbortedMissingRequests
            }
            (DispatchState::PreconditionCheck, DispatchEvent::RequestsFound(count)) => {
                self.expected = *count;
                DispatchState::PerRequestLoop
            }

            (DispatchState::PerRequestLoop, DispatchEvent::RequestSucceeded)
                if self.remaining() > 0 =>
            {
                self.succeeded += 1;
                DispatchState::PerRequestLoop
            }
            (DispatchState::PerRequestLoop, DispatchEvent::RequestFailed)
                if self.remaining() > 0 =>
            {
                self.failed += 1;
                DispatchState::PerRequestLoop
            }
            (DispatchState::PerRequestLoop, DispatchEvent::Aggregate) if self.remaining() == 0 => {
                DispatchState::Aggregated
            }

            (DispatchState::Aggregated, DispatchEvent::Finish) => {
                if self.failed == 0 {
                    DispatchState::Succeeded
                } else {
                    DispatchState::Failed
                }
            }

            // Invalid transitions
            (state, event) => {
                return Err(format!("Invalid transition: {:?} -> {:?}", state, event));
            }
        };

        self.state = new_state;
        Ok(new_state)
    }
}

impl Default for DispatchFsm {
    fn default() -> Self {
        Self::new()
    }
}
