//! The HTTP hop, behind a trait so the connection pool is injected and
//! shared rather than owned by the signing path.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;

use crate::error::WxPayError;

/// A response whose body has been read to the end.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Sends one request and drains the full response body.
///
/// Implementations must be usable from many tasks at once. Failures (I/O,
/// timeout, cancelled connection) are [`WxPayError::Transport`]; nothing is
/// retried here.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: reqwest::Request,
    ) -> impl std::future::Future<Output = Result<RawResponse, WxPayError>> + Send;
}

impl Transport for reqwest::Client {
    async fn send(&self, request: reqwest::Request) -> Result<RawResponse, WxPayError> {
        let response = self
            .execute(request)
            .await
            .map_err(|e| WxPayError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| WxPayError::Transport(format!("failed to read response body: {e}")))?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Build the default pooled HTTP client: fixed timeout, no redirects.
pub fn default_http_client(timeout: std::time::Duration) -> Result<reqwest::Client, WxPayError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .map_err(|e| WxPayError::Transport(format!("failed to build HTTP client: {e}")))
}
