//! Platform-pushed callback notifications.
//!
//! A notification is signed like an API response (same headers, same
//! message layout) and carries an AES-GCM encrypted `resource`. The
//! signature is checked before the body is parsed.

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::aead;
use crate::constants::RESOURCE_ALGORITHM;
use crate::error::WxPayError;
use crate::verifier::Verifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub create_time: String,
    pub event_type: String,
    pub resource_type: String,
    #[serde(default)]
    pub summary: String,
    pub resource: EncryptedResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedResource {
    pub algorithm: String,
    /// Base64 ciphertext with the GCM tag appended.
    pub ciphertext: String,
    #[serde(default)]
    pub associated_data: String,
    pub nonce: String,
    #[serde(default)]
    pub original_type: String,
}

/// Verifies and decrypts incoming notifications with the platform key and
/// the merchant's APIv3 key.
#[derive(Clone)]
pub struct NotificationHandler {
    verifier: Verifier,
    api_v3_key: Vec<u8>,
}

impl NotificationHandler {
    pub fn new(verifier: Verifier, api_v3_key: impl Into<Vec<u8>>) -> Self {
        Self {
            verifier,
            api_v3_key: api_v3_key.into(),
        }
    }

    /// Verify the signature headers against the raw body, then decode it.
    pub fn parse(&self, headers: &HeaderMap, body: &[u8]) -> Result<Notification, WxPayError> {
        if let Err(e) = self.verifier.verify(headers, body) {
            tracing::warn!(error = %e, "notification verification failed");
            return Err(e);
        }
        let notification: Notification = serde_json::from_slice(body).map_err(WxPayError::Decode)?;
        tracing::debug!(id = %notification.id, event_type = %notification.event_type, "notification verified");
        Ok(notification)
    }

    /// Decrypt a resource to its plaintext JSON.
    pub fn decrypt_resource(&self, resource: &EncryptedResource) -> Result<String, WxPayError> {
        if resource.algorithm != RESOURCE_ALGORITHM {
            return Err(WxPayError::Decryption(format!(
                "unsupported algorithm {:?}",
                resource.algorithm
            )));
        }
        aead::decrypt_base64(
            &resource.ciphertext,
            &self.api_v3_key,
            resource.nonce.as_bytes(),
            resource.associated_data.as_bytes(),
        )
    }

    /// Decrypt a resource and decode the plaintext as `T`.
    pub fn decrypt_resource_json<T: DeserializeOwned>(
        &self,
        resource: &EncryptedResource,
    ) -> Result<T, WxPayError> {
        let plaintext = self.decrypt_resource(resource)?;
        serde_json::from_str(&plaintext).map_err(WxPayError::Decode)
    }
}

impl std::fmt::Debug for NotificationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationHandler")
            .field("api_v3_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::response_message;
    use crate::constants::{HEADER_NONCE, HEADER_SIGNATURE, HEADER_TIMESTAMP};
    use crate::signer::Signer;
    use aes_gcm::aead::{Aead, KeyInit, Payload};
    use aes_gcm::Aes256Gcm;
    use base64::Engine;
    use reqwest::header::HeaderValue;

    const PLATFORM_KEY: &str = include_str!("../tests/fixtures/platform_key.pem");
    const PLATFORM_PUB: &str = include_str!("../tests/fixtures/platform_pub.pem");
    const API_V3_KEY: &[u8] = b"Rxd6Ldd3Vb9HYvSxz7QeN2kMm4wUjP5c";

    #[derive(Debug, Deserialize)]
    struct CouponUse {
        coupon_id: String,
        stock_id: String,
    }

    fn resource(plaintext: &str, algorithm: &str) -> EncryptedResource {
        let nonce = "fdasflkja484";
        let aad = "coupon";
        let ct = Aes256Gcm::new_from_slice(API_V3_KEY)
            .unwrap()
            .encrypt(
                aes_gcm::Nonce::from_slice(nonce.as_bytes()),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad: aad.as_bytes(),
                },
            )
            .unwrap();
        EncryptedResource {
            algorithm: algorithm.to_string(),
            ciphertext: base64::engine::general_purpose::STANDARD.encode(ct),
            associated_data: aad.to_string(),
            nonce: nonce.to_string(),
            original_type: "coupon".to_string(),
        }
    }

    fn notification_body() -> Vec<u8> {
        let notification = Notification {
            id: "EV-2018022511223320873".into(),
            create_time: "2015-05-20T13:29:35+08:00".into(),
            event_type: "COUPON.USE".into(),
            resource_type: "encrypt-resource".into(),
            summary: "coupon used".into(),
            resource: resource(r#"{"coupon_id":"C1","stock_id":"S1"}"#, RESOURCE_ALGORITHM),
        };
        serde_json::to_vec(&notification).unwrap()
    }

    fn signed(body: &[u8]) -> HeaderMap {
        let message = response_message("1700000000", "notifynonce", body);
        let signature = Signer::from_pkcs8_pem(PLATFORM_KEY)
            .unwrap()
            .sign(std::str::from_utf8(&message).unwrap())
            .unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(HEADER_TIMESTAMP, HeaderValue::from_static("1700000000"));
        headers.insert(HEADER_NONCE, HeaderValue::from_static("notifynonce"));
        headers.insert(HEADER_SIGNATURE, HeaderValue::from_str(&signature).unwrap());
        headers
    }

    fn handler() -> NotificationHandler {
        NotificationHandler::new(Verifier::from_spki_pem(PLATFORM_PUB).unwrap(), API_V3_KEY)
    }

    #[test]
    fn parses_and_decrypts_signed_notification() {
        let body = notification_body();
        let handler = handler();
        let notification = handler.parse(&signed(&body), &body).unwrap();
        assert_eq!(notification.event_type, "COUPON.USE");

        let used: CouponUse = handler.decrypt_resource_json(&notification.resource).unwrap();
        assert_eq!(used.coupon_id, "C1");
        assert_eq!(used.stock_id, "S1");
    }

    #[test]
    fn forged_notification_is_rejected_before_parsing() {
        let body = notification_body();
        let headers = signed(&body);
        let forged = br#"{"not":"a notification"}"#;
        let err = handler().parse(&headers, forged).unwrap_err();
        assert!(matches!(err, WxPayError::SignatureInvalid));
    }

    #[test]
    fn unsigned_notification_is_rejected() {
        let body = notification_body();
        let err = handler().parse(&HeaderMap::new(), &body).unwrap_err();
        assert!(matches!(err, WxPayError::SignatureMissing(_)));
    }

    #[test]
    fn unknown_algorithm_is_rejected() {
        let res = resource("{}", "AEAD_SM4_GCM");
        let err = handler().decrypt_resource(&res).unwrap_err();
        assert!(matches!(err, WxPayError::Decryption(_)));
    }

    #[test]
    fn wrong_api_key_fails_decryption() {
        let res = resource("{}", RESOURCE_ALGORITHM);
        let handler = NotificationHandler::new(
            Verifier::from_spki_pem(PLATFORM_PUB).unwrap(),
            b"00000000000000000000000000000000".to_vec(),
        );
        assert!(matches!(
            handler.decrypt_resource(&res),
            Err(WxPayError::Decryption(_))
        ));
    }
}
