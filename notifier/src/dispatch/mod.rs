//! Dispatch module

pub mod dispatcher;
pub mod fsm;

pub use dispatcher::{DeploymentDispatcher, MISSING_NOTIFICATIONS, NOTIFY_FAILED};
pub use fsm::{DispatchEvent, DispatchFsm, DispatchState};
