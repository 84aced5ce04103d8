//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reqwest-based HTTP client implementation
///
/// Each `execute` call is a single attempt. Every status code, including
/// 429 and 5xx, is handed back to the caller, which owns the retry policy.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a new HTTP client with custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_max_idle_per_host(10)
            .user_agent(concat!("drive-replica/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self { client })
    }

    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
        }
    }

    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    async fn send_once(&self, request: HttpRequest) -> Result<HttpResponse> {
        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status().as_u16();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response
            .bytes()
            .await
            .map_err(|e| BridgeError::OperationFailed(format!("Failed to read body: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn classify_transport_error(e: reqwest::Error) -> BridgeError {
    if e.is_timeout() {
        BridgeError::OperationFailed("Request timed out".to_string())
    } else if e.is_connect() {
        BridgeError::OperationFailed(format!("Connection failed: {}", e))
    } else {
        BridgeError::OperationFailed(e.to_string())
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = ?request.method, url = %request.url, "Executing HTTP request");
        self.send_once(request).await
    }
}
