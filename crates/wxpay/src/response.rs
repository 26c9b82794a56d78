use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::WxPayError;

/// Error body the platform returns on non-2xx responses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<serde_json::Value>,
}

/// A response whose signature has been checked against the platform key.
///
/// Only the client's verification step constructs this, so holding one
/// means the body is authentic.
#[derive(Debug, Clone)]
pub struct VerifiedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl VerifiedResponse {
    pub(crate) fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }

    /// Decode the first JSON value in the body. An empty (or all-whitespace)
    /// body or a literal `null` yields `T::default()`; anything after the
    /// first value is ignored.
    pub fn json<T: DeserializeOwned + Default>(&self) -> Result<T, WxPayError> {
        let mut values = serde_json::Deserializer::from_slice(&self.body).into_iter::<Option<T>>();
        match values.next() {
            None => Ok(T::default()),
            Some(value) => Ok(value.map_err(WxPayError::Decode)?.unwrap_or_default()),
        }
    }

    /// Copy the raw body into a byte sink, returning the number of bytes written.
    pub fn copy_to<W: std::io::Write + ?Sized>(&self, sink: &mut W) -> Result<u64, WxPayError> {
        sink.write_all(&self.body)?;
        Ok(self.body.len() as u64)
    }
}

/// Pull `{code, message}` out of an error body, falling back to the status reason.
pub(crate) fn error_message(status: StatusCode, body: &[u8]) -> ErrorMessage {
    let mut parsed = serde_json::from_slice::<ErrorMessage>(body).unwrap_or_default();
    if parsed.message.is_empty() {
        parsed.message = status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_string();
    }
    parsed
}
