//! New Relic deployment notifier
//!
//! Reports build deployments to the New Relic APM REST API so releases can be
//! correlated with performance changes.

pub mod credentials;
pub mod dispatch;
pub mod errors;
pub mod filesys;
pub mod http;
pub mod logs;
pub mod models;
pub mod settings;
pub mod steps;
pub mod template;
pub mod utils;
