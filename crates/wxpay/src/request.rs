use reqwest::header::{HeaderMap, AUTHORIZATION};
use reqwest::Method;
use url::Url;

/// An outbound request that has been signed and is ready to send.
///
/// Timestamp and nonce are baked into the signature: re-sending after a
/// failure needs a fresh `SignedRequest`, not a copy of this one.
#[derive(Debug)]
pub struct SignedRequest {
    pub(crate) method: Method,
    pub(crate) url: Url,
    pub(crate) canonical_path: String,
    pub(crate) timestamp: i64,
    pub(crate) nonce: String,
    pub(crate) body: Vec<u8>,
    pub(crate) headers: HeaderMap,
}

impl SignedRequest {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Absolute path plus query string, as covered by the signature.
    pub fn canonical_path(&self) -> &str {
        &self.canonical_path
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Exact JSON bytes sent, empty for bodyless requests.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn authorization(&self) -> Option<&str> {
        self.headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
    }

    pub fn into_request(self) -> reqwest::Request {
        let mut request = reqwest::Request::new(self.method, self.url);
        *request.headers_mut() = self.headers;
        if !self.body.is_empty() {
            *request.body_mut() = Some(reqwest::Body::from(self.body));
        }
        request
    }
}

/// Absolute URL path with the query string appended when present.
pub(crate) fn canonical_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}
