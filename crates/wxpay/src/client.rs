//! Signed request construction and the verified request/response lifecycle.
//!
//! build -> sign -> dispatch -> receive -> verify -> decode. Any failing step
//! ends the call; nothing partial is returned.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::canonical::request_message;
use crate::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS, MEDIA_TYPE, USER_AGENT as UA};
use crate::credentials::Credentials;
use crate::error::WxPayError;
use crate::request::{canonical_path, SignedRequest};
use crate::response::{error_message, VerifiedResponse};
use crate::signer::generate_nonce;
use crate::transport::{default_http_client, Transport};

/// What endpoint wrappers need from a client: build signed requests and run
/// them through verification.
pub trait ApiClient: Send + Sync {
    /// Resolve `path` against the base URL, JSON-encode `body` and sign.
    fn new_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<SignedRequest, WxPayError>;

    /// Send, drain, verify. Non-2xx responses that verify become [`WxPayError::Api`].
    fn execute(
        &self,
        request: SignedRequest,
    ) -> impl std::future::Future<Output = Result<VerifiedResponse, WxPayError>> + Send;

    fn request_without_body(&self, method: Method, path: &str) -> Result<SignedRequest, WxPayError> {
        self.new_request::<()>(method, path, None)
    }

    /// Execute and decode the verified body as JSON (empty body gives `T::default()`).
    fn execute_json<T: DeserializeOwned + Default>(
        &self,
        request: SignedRequest,
    ) -> impl std::future::Future<Output = Result<T, WxPayError>> + Send {
        async move { self.execute(request).await?.json() }
    }

    /// Execute and copy the verified body into a raw byte sink.
    fn execute_into<W: std::io::Write + Send + ?Sized>(
        &self,
        request: SignedRequest,
        sink: &mut W,
    ) -> impl std::future::Future<Output = Result<u64, WxPayError>> + Send {
        async move { self.execute(request).await?.copy_to(sink) }
    }
}

/// Client for the v3 API. Immutable after construction; share it by
/// reference or `Arc` across tasks.
#[derive(Debug, Clone)]
pub struct WxPayClient<T = reqwest::Client> {
    credentials: Credentials,
    base_url: Url,
    transport: T,
}

impl WxPayClient<reqwest::Client> {
    /// Client against the production base URL with a default HTTP pool.
    pub fn new(credentials: Credentials) -> Result<Self, WxPayError> {
        let http = default_http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?;
        Self::with_transport(credentials, http)
    }
}

impl<T: Transport> WxPayClient<T> {
    pub fn with_transport(credentials: Credentials, transport: T) -> Result<Self, WxPayError> {
        Ok(Self {
            credentials,
            base_url: parse_base_url(DEFAULT_BASE_URL)?,
            transport,
        })
    }

    /// Replace the base URL. It must end with `/`.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, WxPayError> {
        self.base_url = parse_base_url(base_url)?;
        Ok(self)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: Transport> ApiClient for WxPayClient<T> {
    fn new_request<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<SignedRequest, WxPayError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| WxPayError::InvalidUrl(format!("{path}: {e}")))?;
        if url.origin() != self.base_url.origin() || !url.path().starts_with(self.base_url.path()) {
            return Err(WxPayError::InvalidUrl(format!(
                "{path:?} resolves to {url}, outside the base URL {}",
                self.base_url
            )));
        }

        let body = match body {
            Some(b) => serde_json::to_string(b)
                .map_err(|e| WxPayError::Serialization(e.to_string()))?,
            None => String::new(),
        };

        let canonical_path = canonical_path(&url);
        let timestamp = unix_timestamp()?;
        let nonce = generate_nonce();

        let message = request_message(method.as_str(), &canonical_path, timestamp, &nonce, &body);
        let signature = self.credentials.signer().sign(&message)?;
        let authorization = self.credentials.authorization(timestamp, &nonce, &signature);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(USER_AGENT, HeaderValue::from_static(UA));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&authorization)
                .map_err(|e| WxPayError::Signing(format!("authorization header: {e}")))?,
        );

        tracing::debug!(
            method = %method,
            path = %canonical_path,
            nonce = %nonce,
            timestamp,
            "signed request"
        );

        Ok(SignedRequest {
            method,
            url,
            canonical_path,
            timestamp,
            nonce,
            body: body.into_bytes(),
            headers,
        })
    }

    async fn execute(&self, request: SignedRequest) -> Result<VerifiedResponse, WxPayError> {
        let method = request.method.clone();
        let path = request.canonical_path.clone();

        let raw = self.transport.send(request.into_request()).await?;
        tracing::debug!(
            method = %method,
            path = %path,
            status = raw.status.as_u16(),
            body_len = raw.body.len(),
            "response received"
        );

        if let Err(e) = self.credentials.verifier().verify(&raw.headers, &raw.body) {
            tracing::warn!(method = %method, path = %path, error = %e, "response verification failed");
            return Err(e);
        }

        if !raw.status.is_success() {
            let message = error_message(raw.status, &raw.body);
            tracing::warn!(
                method = %method,
                path = %path,
                status = raw.status.as_u16(),
                code = %message.code,
                "api error"
            );
            return Err(WxPayError::Api {
                status: raw.status.as_u16(),
                code: message.code,
                message: message.message,
            });
        }

        Ok(VerifiedResponse::new(raw.status, raw.headers, raw.body))
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, WxPayError> {
    let url =
        Url::parse(base_url).map_err(|e| WxPayError::InvalidUrl(format!("{base_url}: {e}")))?;
    if url.cannot_be_a_base() || !url.path().ends_with('/') {
        return Err(WxPayError::InvalidUrl(format!(
            "base URL must have a trailing slash, but {base_url:?} does not"
        )));
    }
    Ok(url)
}

fn unix_timestamp() -> Result<i64, WxPayError> {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| WxPayError::Signing(format!("system time error: {e}")))?
        .as_secs();
    i64::try_from(secs).map_err(|e| WxPayError::Signing(format!("system time error: {e}")))
}
