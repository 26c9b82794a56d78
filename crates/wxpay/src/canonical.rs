//! Canonical messages covered by request and response signatures.
//!
//! The two layouts are distinct: a request message carries the method and
//! path, a response (or notification) message does not.
//!
//! ```text
//! request:  METHOD\nPATH\nTIMESTAMP\nNONCE\nBODY\n
//! response: TIMESTAMP\nNONCE\nBODY\n
//! ```

/// Build the message a request signature covers.
///
/// `path` is the absolute URL path including any query string. `body` is the
/// exact JSON text sent, or `""` when the request has no body.
pub fn request_message(method: &str, path: &str, timestamp: i64, nonce: &str, body: &str) -> String {
    format!("{method}\n{path}\n{timestamp}\n{nonce}\n{body}\n")
}

/// Build the message a response or notification signature covers.
///
/// The body is kept as raw bytes so the digest sees exactly what was received.
pub fn response_message(timestamp: &str, nonce: &str, body: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(timestamp.len() + nonce.len() + body.len() + 3);
    message.extend_from_slice(timestamp.as_bytes());
    message.push(b'\n');
    message.extend_from_slice(nonce.as_bytes());
    message.push(b'\n');
    message.extend_from_slice(body);
    message.push(b'\n');
    message
}
