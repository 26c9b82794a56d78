//! AES-GCM decryption of encrypted fields the platform pushes inside
//! payloads (notification resources, certificate downloads).
//!
//! Stateless and unrelated to request signing. The key is the merchant's
//! APIv3 key; ciphertext carries the 16-byte tag appended.

use aes_gcm::aead::consts::U12;
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::aes::Aes192;
use aes_gcm::{Aes128Gcm, Aes256Gcm, AesGcm};
use base64::Engine;

use crate::error::WxPayError;

type Aes192Gcm = AesGcm<Aes192, U12>;

/// Standard GCM nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Decrypt and authenticate `ciphertext` (already base64-decoded).
///
/// The key selects AES-128/192/256 by length (16/24/32 bytes). Any other key
/// or nonce length, a failed tag check, or non-UTF-8 plaintext is a
/// [`WxPayError::Decryption`].
pub fn decrypt(
    ciphertext: &[u8],
    key: &[u8],
    nonce: &[u8],
    associated_data: &[u8],
) -> Result<String, WxPayError> {
    if nonce.len() != NONCE_LEN {
        return Err(WxPayError::Decryption(format!(
            "nonce must be {NONCE_LEN} bytes, got {}",
            nonce.len()
        )));
    }

    let plaintext = match key.len() {
        16 => open::<Aes128Gcm>(key, nonce, ciphertext, associated_data)?,
        24 => open::<Aes192Gcm>(key, nonce, ciphertext, associated_data)?,
        32 => open::<Aes256Gcm>(key, nonce, ciphertext, associated_data)?,
        n => {
            return Err(WxPayError::Decryption(format!(
                "key must be 16, 24 or 32 bytes, got {n}"
            )))
        }
    };

    String::from_utf8(plaintext)
        .map_err(|e| WxPayError::Decryption(format!("plaintext is not UTF-8: {e}")))
}

/// Base64-decode `ciphertext` then [`decrypt`] it.
pub fn decrypt_base64(
    ciphertext: &str,
    key: &[u8],
    nonce: &[u8],
    associated_data: &[u8],
) -> Result<String, WxPayError> {
    let raw = base64::engine::general_purpose::STANDARD
        .decode(ciphertext)
        .map_err(|e| WxPayError::Decryption(format!("ciphertext is not base64: {e}")))?;
    decrypt(&raw, key, nonce, associated_data)
}

fn open<C: Aead + KeyInit>(
    key: &[u8],
    nonce: &[u8],
    msg: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, WxPayError> {
    let cipher =
        C::new_from_slice(key).map_err(|e| WxPayError::Decryption(format!("invalid key: {e}")))?;
    cipher
        .decrypt(aes_gcm::aead::Nonce::<C>::from_slice(nonce), Payload { msg, aad })
        .map_err(|_| WxPayError::Decryption("authentication tag mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_gcm::aead::generic_array::GenericArray;

    const KEY: &[u8; 32] = b"0123456789abcdef0123456789abcdef";
    const NONCE: &[u8; 12] = b"a1b2c3d4e5f6";
    const AAD: &[u8] = b"certificate";

    fn seal_256(plaintext: &str, key: &[u8], nonce: &[u8], aad: &[u8]) -> Vec<u8> {
        Aes256Gcm::new_from_slice(key)
            .unwrap()
            .encrypt(
                GenericArray::from_slice(nonce),
                Payload {
                    msg: plaintext.as_bytes(),
                    aad,
                },
            )
            .unwrap()
    }

    #[test]
    fn decrypts_what_was_sealed() {
        let ct = seal_256(r#"{"sp_mchid":"1900000109"}"#, KEY, NONCE, AAD);
        let pt = decrypt(&ct, KEY, NONCE, AAD).unwrap();
        assert_eq!(pt, r#"{"sp_mchid":"1900000109"}"#);
    }

    #[test]
    fn decrypts_aes_128() {
        let key = b"0123456789abcdef";
        let ct = Aes128Gcm::new_from_slice(key)
            .unwrap()
            .encrypt(GenericArray::from_slice(NONCE), &b"short key"[..])
            .unwrap();
        assert_eq!(decrypt(&ct, key, NONCE, b"").unwrap(), "short key");
    }

    #[test]
    fn decrypts_aes_192() {
        let key = b"0123456789abcdef01234567";
        let ct = Aes192Gcm::new_from_slice(key)
            .unwrap()
            .encrypt(
                GenericArray::from_slice(NONCE),
                Payload {
                    msg: b"medium key",
                    aad: AAD,
                },
            )
            .unwrap();
        assert_eq!(decrypt(&ct, key, NONCE, AAD).unwrap(), "medium key");
    }

    #[test]
    fn wrong_key_fails() {
        let ct = seal_256("secret", KEY, NONCE, AAD);
        let err = decrypt(&ct, b"fedcba9876543210fedcba9876543210", NONCE, AAD).unwrap_err();
        assert!(matches!(err, WxPayError::Decryption(_)));
    }

    #[test]
    fn wrong_nonce_fails() {
        let ct = seal_256("secret", KEY, NONCE, AAD);
        let err = decrypt(&ct, KEY, b"000000000000", AAD).unwrap_err();
        assert!(matches!(err, WxPayError::Decryption(_)));
    }

    #[test]
    fn wrong_associated_data_fails() {
        let ct = seal_256("secret", KEY, NONCE, AAD);
        let err = decrypt(&ct, KEY, NONCE, b"transaction").unwrap_err();
        assert!(matches!(err, WxPayError::Decryption(_)));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let mut ct = seal_256("secret", KEY, NONCE, AAD);
        ct[0] ^= 0xff;
        assert!(decrypt(&ct, KEY, NONCE, AAD).is_err());
    }

    #[test]
    fn invalid_key_length_fails() {
        let ct = seal_256("secret", KEY, NONCE, AAD);
        let err = decrypt(&ct, b"too-short", NONCE, AAD).unwrap_err();
        assert!(err.to_string().contains("16, 24 or 32"));
    }

    #[test]
    fn invalid_nonce_length_fails() {
        let ct = seal_256("secret", KEY, NONCE, AAD);
        assert!(decrypt(&ct, KEY, b"short", AAD).is_err());
    }

    #[test]
    fn base64_entry_point() {
        let ct = seal_256("hello", KEY, NONCE, AAD);
        let b64 = base64::engine::general_purpose::STANDARD.encode(ct);
        assert_eq!(decrypt_base64(&b64, KEY, NONCE, AAD).unwrap(), "hello");
        assert!(decrypt_base64("%%%", KEY, NONCE, AAD).is_err());
    }
}
