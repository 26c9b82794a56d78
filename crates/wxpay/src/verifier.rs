//! Response and notification signature verification against the platform
//! public key.
//!
//! Verification needs the complete body: callers drain the response before
//! calling in, and must not decode or trust the body when this fails.

use base64::Engine;
use reqwest::header::HeaderMap;
use rsa::pkcs8::DecodePublicKey;
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest, Sha256};

use crate::canonical::response_message;
use crate::constants::{HEADER_NONCE, HEADER_SIGNATURE, HEADER_TIMESTAMP};
use crate::error::WxPayError;

/// Signature headers pulled from a response or notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeaders<'a> {
    pub timestamp: &'a str,
    pub nonce: &'a str,
    pub signature: &'a str,
}

impl<'a> SignatureHeaders<'a> {
    /// Extract the three signature headers; an absent, empty or non-ASCII
    /// value is reported as [`WxPayError::SignatureMissing`].
    pub fn from_headers(headers: &'a HeaderMap) -> Result<Self, WxPayError> {
        Ok(Self {
            timestamp: required(headers, HEADER_TIMESTAMP)?,
            nonce: required(headers, HEADER_NONCE)?,
            signature: required(headers, HEADER_SIGNATURE)?,
        })
    }
}

fn required<'a>(headers: &'a HeaderMap, name: &'static str) -> Result<&'a str, WxPayError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(WxPayError::SignatureMissing(name))
}

/// Holds the platform's public key and checks response signatures.
#[derive(Clone)]
pub struct Verifier {
    key: RsaPublicKey,
}

impl Verifier {
    pub fn new(key: RsaPublicKey) -> Self {
        Self { key }
    }

    /// Parse a PEM-encoded X.509 SubjectPublicKeyInfo RSA key (`-----BEGIN PUBLIC KEY-----`).
    pub fn from_spki_pem(pem: &str) -> Result<Self, WxPayError> {
        let key = RsaPublicKey::from_public_key_pem(pem.trim())
            .map_err(|e| WxPayError::KeyParse(format!("public key: {e}")))?;
        Ok(Self { key })
    }

    /// Verify a response given its headers and fully-read body.
    pub fn verify(&self, headers: &HeaderMap, body: &[u8]) -> Result<(), WxPayError> {
        let parts = SignatureHeaders::from_headers(headers)?;
        self.verify_parts(&parts, body)
    }

    /// Verify already-extracted signature headers against `body`.
    pub fn verify_parts(&self, parts: &SignatureHeaders<'_>, body: &[u8]) -> Result<(), WxPayError> {
        let signature = base64::engine::general_purpose::STANDARD
            .decode(parts.signature)
            .map_err(|e| WxPayError::SignatureDecode(e.to_string()))?;

        let message = response_message(parts.timestamp, parts.nonce, body);
        let digest = Sha256::digest(&message);

        self.key
            .verify(Pkcs1v15Sign::new::<Sha256>(), &digest, &signature)
            .map_err(|_| WxPayError::SignatureInvalid)
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier").finish_non_exhaustive()
    }
}
