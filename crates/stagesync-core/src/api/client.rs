//! HTTP transport used to reach the document mirrors.
//!
//! `HttpTransport` is the seam the sync orchestrator talks to; `FetchClient`
//! is the reqwest-backed implementation. Every transport fault collapses into
//! `SyncError::Network` and nothing is retried here. Falling over to the next
//! mirror is the orchestrator's job.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use reqwest::header::{self, HeaderMap};
use reqwest::Client;
use tracing::debug;

use super::SyncError;

// ============================================================================
// Constants
// ============================================================================

/// Default HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = concat!("stagesync/", env!("CARGO_PKG_VERSION"));

/// Body of a response, read on demand.
pub enum ResponseBody {
    Remote(reqwest::Response),
    Buffered(String),
}

/// A transport response normalized to status, headers and a lazy body.
pub struct FetchResponse {
    pub status: u16,
    pub headers: HeaderMap,
    body: ResponseBody,
}

impl FetchResponse {
    /// Build a response whose body is already in memory
    pub fn buffered(status: u16, headers: HeaderMap, body: impl Into<String>) -> Self {
        Self {
            status,
            headers,
            body: ResponseBody::Buffered(body.into()),
        }
    }

    fn remote(response: reqwest::Response) -> Self {
        Self {
            status: response.status().as_u16(),
            headers: response.headers().clone(),
            body: ResponseBody::Remote(response),
        }
    }

    /// Read the whole body. A failure mid-stream is a network fault.
    pub async fn text(self) -> Result<String, SyncError> {
        match self.body {
            ResponseBody::Remote(response) => Ok(response.text().await?),
            ResponseBody::Buffered(body) => Ok(body),
        }
    }
}

/// Conditional GET capability.
pub trait HttpTransport: Send + Sync {
    fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
    ) -> impl Future<Output = Result<FetchResponse, SyncError>> + Send;
}

/// reqwest-backed transport.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct FetchClient {
    client: Client,
}

impl FetchClient {
    /// Create a client with the default request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .default_headers(default_headers)
            .build()?;

        Ok(Self { client })
    }
}

impl HttpTransport for FetchClient {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, &str)],
        headers: HeaderMap,
    ) -> Result<FetchResponse, SyncError> {
        let mut request = self.client.get(url).headers(headers);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        debug!(url = url, status = response.status().as_u16(), "GET completed");
        Ok(FetchResponse::remote(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_buffered_response_text() {
        let mut headers = HeaderMap::new();
        headers.insert(header::ETAG, header::HeaderValue::from_static("\"abc\""));
        let response = FetchResponse::buffered(200, headers, "{\"ok\":true}");

        assert_eq!(response.status, 200);
        assert_eq!(response.headers.get(header::ETAG).unwrap(), "\"abc\"");
        assert_eq!(response.text().await.unwrap(), "{\"ok\":true}");
    }

    #[test]
    fn test_fetch_client_builds() {
        assert!(FetchClient::with_timeout(Duration::from_secs(5)).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_network_error() {
        let client = FetchClient::with_timeout(Duration::from_secs(2)).unwrap();
        // Port 9 on localhost: discard service, normally closed
        let result = client
            .get("http://127.0.0.1:9/nothing", &[], HeaderMap::new())
            .await;
        assert!(matches!(result, Err(SyncError::Network(_))));
    }
}
