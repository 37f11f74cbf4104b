//! HTTP access to the New Relic API

pub mod client;
pub mod newrelic;

pub use client::{ClientOptions, HttpClient, ProxyOptions};
pub use newrelic::{ApiVersion, NewRelicClient, NotificationClient};
