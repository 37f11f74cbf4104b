//! HTTP client implementation

use std::time::Duration;

use reqwest::{header, Client, Proxy, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::NotifierError;
use crate::http::newrelic::{ApiVersion, DEFAULT_API_URL};

/// Header carrying the New Relic REST API key
pub const API_KEY_HEADER: &str = "X-Api-Key";

/// Options for talking to one New Relic API endpoint
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL, e.g. `https://api.newrelic.com`
    pub endpoint: String,

    /// Deployment endpoint flavour
    pub api_version: ApiVersion,

    /// Per-request timeout
    pub timeout: Duration,

    /// Outbound proxy
    pub proxy: Option<ProxyOptions>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_API_URL.to_string(),
            api_version: ApiVersion::default(),
            timeout: Duration::from_secs(30),
            proxy: None,
        }
    }
}

/// HTTP proxy supplied by the build environment
#[derive(Clone, Serialize, Deserialize)]
pub struct ProxyOptions {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Hosts that bypass the proxy
    #[serde(default)]
    pub no_proxy: Vec<String>,
}

impl std::fmt::Debug for ProxyOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyOptions")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("no_proxy", &self.no_proxy)
            .finish()
    }
}

impl ProxyOptions {
    fn to_proxy(&self) -> Result<Proxy, NotifierError> {
        let url = format!("http://{}:{}", self.host, self.port);
        let mut proxy = Proxy::all(&url)
            .map_err(|e| NotifierError::ConfigError(format!("Invalid proxy {}: {}", url, e)))?;

        if let Some(username) = &self.username {
            proxy = proxy.basic_auth(username, self.password.as_deref().unwrap_or_default());
        }

        if !self.no_proxy.is_empty() {
            proxy = proxy.no_proxy(reqwest::NoProxy::from_string(&self.no_proxy.join(",")));
        }

        Ok(proxy)
    }
}

/// HTTP client bound to one API base URL
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    /// Create a new HTTP client
    pub fn new(options: &ClientOptions) -> Result<Self, NotifierError> {
        let mut builder = Client::builder().timeout(options.timeout);

        if let Some(proxy) = &options.proxy {
            debug!("Routing New Relic API calls through proxy {}:{}", proxy.host, proxy.port);
            builder = builder.proxy(proxy.to_proxy()?);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            base_url: options.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Make an authenticated GET request expecting JSON back
    pub async fn get(&self, path: &str, api_key: &str) -> Result<Response, NotifierError> {
        let url = self.url(path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header(API_KEY_HEADER, api_key)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        Ok(response)
    }

    /// POST a JSON body and return the response status
    pub async fn post_json<B: Serialize>(
        &self,
        path: &str,
        api_key: &str,
        body: &B,
    ) -> Result<StatusCode, NotifierError> {
        let url = self.url(path);
        debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .header(header::ACCEPT, "application/json")
            .json(body)
            .send()
            .await?;

        Ok(finish(response).await)
    }

    /// POST a form-encoded body and return the response status
    pub async fn post_form<B: Serialize + ?Sized>(
        &self,
        path: &str,
        api_key: &str,
        body: &B,
    ) -> Result<StatusCode, NotifierError> {
        let url = self.url(path);
        debug!("POST {} (form)", url);

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .form(body)
            .send()
            .await?;

        Ok(finish(response).await)
    }
}

/// Drain the body so the connection can be reused, keeping it for debugging
async fn finish(response: Response) -> StatusCode {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        debug!("Response {}: {}", status, body);
    }
    status
}
