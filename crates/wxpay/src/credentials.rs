use crate::constants::AUTH_SCHEME;
use crate::error::WxPayError;
use crate::signer::{Authorization, Signer};
use crate::verifier::Verifier;

/// Merchant identity: id, key serial, signing key and the platform's
/// verification key. Parsed once, never mutated; safe to share across
/// concurrent requests.
#[derive(Clone)]
pub struct Credentials {
    mchid: u64,
    serial_no: String,
    signer: Signer,
    verifier: Verifier,
}

impl Credentials {
    /// Parse a PKCS#8 private key PEM and an SPKI public key PEM.
    ///
    /// Either key failing to parse is a [`WxPayError::KeyParse`].
    pub fn new(
        mchid: u64,
        serial_no: impl Into<String>,
        private_key_pem: &str,
        public_key_pem: &str,
    ) -> Result<Self, WxPayError> {
        Ok(Self::from_parts(
            mchid,
            serial_no,
            Signer::from_pkcs8_pem(private_key_pem)?,
            Verifier::from_spki_pem(public_key_pem)?,
        ))
    }

    pub fn from_parts(
        mchid: u64,
        serial_no: impl Into<String>,
        signer: Signer,
        verifier: Verifier,
    ) -> Self {
        Self {
            mchid,
            serial_no: serial_no.into(),
            signer,
            verifier,
        }
    }

    pub fn mchid(&self) -> u64 {
        self.mchid
    }

    pub fn serial_no(&self) -> &str {
        &self.serial_no
    }

    pub fn signer(&self) -> &Signer {
        &self.signer
    }

    pub fn verifier(&self) -> &Verifier {
        &self.verifier
    }

    /// `Authorization` header value for one signed request.
    pub fn authorization(&self, timestamp: i64, nonce: &str, signature: &str) -> String {
        Authorization {
            scheme: AUTH_SCHEME,
            mchid: self.mchid,
            nonce,
            signature,
            timestamp,
            serial_no: &self.serial_no,
        }
        .to_string()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("mchid", &self.mchid)
            .field("serial_no", &self.serial_no)
            .field("signer", &self.signer)
            .finish_non_exhaustive()
    }
}
