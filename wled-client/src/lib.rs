//! Private HTTP/JSON transport for WLED device communication
//!
//! This crate provides a thin client for the WLED JSON API. It issues
//! `GET`/`POST` requests against `http://<address>/<path>` with a bounded
//! timeout and maps every failure onto [`TransportError`]. Retry policy is
//! deliberately absent; callers decide when to try again.
//!
//! The [`Transport`] trait takes the device address on every call, so an
//! address change is picked up by the very next request.

mod error;
pub mod types;

pub use error::{NetworkErrorKind, Result, TransportError};
pub use types::{DeviceDescriptor, DeviceInfo, LedInfo, Segment, SegmentPatch, StatePatch, WledState};

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Default timeout applied to every request
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Well-known WLED API paths
pub mod paths {
    /// Current state (GET) and partial state patches (POST)
    pub const STATE: &str = "/json/state";
    /// Full descriptor including effect and palette names
    pub const DESCRIPTOR: &str = "/json";
    /// Device identity
    pub const INFO: &str = "/json/info";
    /// Stored presets keyed by id
    pub const PRESETS: &str = "/presets.json";
}

/// Minimal request/response seam used by the rest of the SDK
///
/// `timeout` overrides the transport's default for a single call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `path` from the device and parse the body as JSON
    async fn get(&self, address: &str, path: &str, timeout: Option<Duration>) -> Result<Value>;

    /// Send `body` as JSON to `path` and parse the response body as JSON
    async fn post(
        &self,
        address: &str,
        path: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<Value>;
}

/// reqwest-backed [`Transport`]
///
/// Connection pooling is disabled so every call opens its own connection
/// context; nothing is kept alive between requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Create a transport with the default 5 second timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a transport with a custom default timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| TransportError::Protocol(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, timeout })
    }

    /// The default per-request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn read_json(&self, response: reqwest::Response) -> Result<Value> {
        let response = response
            .error_for_status()
            .map_err(TransportError::from_reqwest)?;

        let bytes = response
            .bytes()
            .await
            .map_err(TransportError::from_reqwest)?;

        serde_json::from_slice(&bytes)
            .map_err(|e| TransportError::Protocol(format!("invalid JSON body: {}", e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, address: &str, path: &str, timeout: Option<Duration>) -> Result<Value> {
        let url = build_url(address, path);
        tracing::trace!(%url, "GET");

        let response = self
            .http
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .timeout(timeout.unwrap_or(self.timeout))
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        self.read_json(response).await
    }

    async fn post(
        &self,
        address: &str,
        path: &str,
        body: &Value,
        timeout: Option<Duration>,
    ) -> Result<Value> {
        let url = build_url(address, path);
        tracing::trace!(%url, %body, "POST");

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(body)
            .timeout(timeout.unwrap_or(self.timeout))
            .send()
            .await
            .map_err(TransportError::from_reqwest)?;

        self.read_json(response).await
    }
}

/// Build the request URL for `path` on the device at `address`
///
/// `address` may be a bare host (`192.168.1.50`), a host with port, or
/// already carry an `http://` scheme. `path` may omit its leading slash.
pub fn build_url(address: &str, path: &str) -> String {
    let base = address.trim().trim_end_matches('/');
    let path = path.trim_start_matches('/');

    if base.starts_with("http://") || base.starts_with("https://") {
        format!("{}/{}", base, path)
    } else {
        format!("http://{}/{}", base, path)
    }
}
