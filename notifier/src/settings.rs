//! Settings file management

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::NotifierError;
use crate::filesys::file::File;
use crate::http::client::{ClientOptions, ProxyOptions};
use crate::http::newrelic::{ApiVersion, DEFAULT_API_URL};
use crate::logs::{LogLevel, LogOptions};

/// Notifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines instead of plain text
    #[serde(default)]
    pub json_logs: bool,

    /// Optional directory for a log file alongside the build log
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// New Relic API configuration
    #[serde(default)]
    pub api: ApiSettings,

    /// Outbound HTTP proxy
    #[serde(default)]
    pub proxy: Option<ProxyOptions>,

    /// Path of the credential store
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,

    /// Path of the notifications list used by the build-step mode
    #[serde(default = "default_notifications_file")]
    pub notifications_file: PathBuf,
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_notifications_file() -> PathBuf {
    PathBuf::from("notifications.json")
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            json_logs: false,
            log_dir: None,
            api: ApiSettings::default(),
            proxy: None,
            credentials_file: default_credentials_file(),
            notifications_file: default_notifications_file(),
        }
    }
}

impl Settings {
    /// Read settings, falling back to defaults when the file does not exist
    pub async fn load(file: &File) -> Result<Self, NotifierError> {
        file.read_json_or_default().await.map_err(|e| {
            NotifierError::ConfigError(format!(
                "Unable to read settings file {}: {}",
                file.path().display(),
                e
            ))
        })
    }

    pub fn log_options(&self) -> LogOptions {
        LogOptions {
            log_level: self.log_level,
            log_dir: self.log_dir.clone(),
            json_format: self.json_logs,
            ..Default::default()
        }
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            endpoint: self.api.endpoint.clone(),
            api_version: self.api.version,
            timeout: Duration::from_secs(self.api.timeout_secs),
            proxy: self.proxy.clone(),
        }
    }
}

/// New Relic API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiSettings {
    /// Base URL of the API
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Which deployment endpoint to use
    #[serde(default)]
    pub version: ApiVersion,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            version: ApiVersion::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}
