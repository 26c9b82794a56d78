use std::env;
use std::time::Duration;

use crate::client::WxPayClient;
use crate::constants::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::credentials::Credentials;
use crate::error::WxPayError;
use crate::notify::NotificationHandler;
use crate::transport::default_http_client;
use crate::verifier::Verifier;

#[derive(Clone)]
pub struct ClientConfig {
    /// Merchant id
    pub mchid: u64,
    /// Serial number of the merchant API certificate
    pub serial_no: String,
    /// PKCS#8 PEM private key
    pub private_key_pem: String,
    /// SPKI PEM platform public key
    pub platform_public_key_pem: String,
    /// Base URL, must end with `/`
    pub base_url: String,
    /// HTTP timeout
    pub timeout: Duration,
    /// APIv3 key for decrypting notification resources (None = notifications disabled)
    pub api_v3_key: Option<Vec<u8>>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("mchid", &self.mchid)
            .field("serial_no", &self.serial_no)
            .field("private_key_pem", &"[REDACTED]")
            .field("platform_public_key_pem", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("api_v3_key", &self.api_v3_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load from an arbitrary variable source (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|s| !s.trim().is_empty());

        // Required: merchant id
        let mchid_str = var("WXPAY_MCHID").ok_or(ConfigError::MissingRequired("WXPAY_MCHID"))?;
        let mchid = mchid_str
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue("WXPAY_MCHID", mchid_str.clone()))?;

        // Required: certificate serial
        let serial_no = var("WXPAY_SERIAL_NO")
            .ok_or(ConfigError::MissingRequired("WXPAY_SERIAL_NO"))?
            .trim()
            .to_string();

        // Required: key material, inline or from a file
        let private_key_pem = pem_from(&var, "WXPAY_PRIVATE_KEY", "WXPAY_PRIVATE_KEY_PATH")?;
        let platform_public_key_pem = pem_from(
            &var,
            "WXPAY_PLATFORM_PUBLIC_KEY",
            "WXPAY_PLATFORM_PUBLIC_KEY_PATH",
        )?;

        // Optional: base URL
        let base_url = var("WXPAY_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !base_url.ends_with('/') {
            return Err(ConfigError::InvalidValue("WXPAY_BASE_URL", base_url));
        }

        // Optional: timeout
        let timeout = match var("WXPAY_TIMEOUT_SECS") {
            Some(s) => s
                .trim()
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::InvalidValue("WXPAY_TIMEOUT_SECS", s.clone()))?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        // Optional: APIv3 key
        let api_v3_key = var("WXPAY_API_V3_KEY").map(|s| s.into_bytes());
        if let Some(ref key) = api_v3_key {
            if key.len() != 32 {
                return Err(ConfigError::InvalidValue(
                    "WXPAY_API_V3_KEY",
                    format!("expected 32 bytes, got {}", key.len()),
                ));
            }
        } else {
            tracing::warn!("WXPAY_API_V3_KEY not set, notification resources cannot be decrypted");
        }

        Ok(Self {
            mchid,
            serial_no,
            private_key_pem,
            platform_public_key_pem,
            base_url,
            timeout,
            api_v3_key,
        })
    }

    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        Ok(Credentials::new(
            self.mchid,
            self.serial_no.clone(),
            &self.private_key_pem,
            &self.platform_public_key_pem,
        )?)
    }

    /// Parse keys and build a client with a pooled HTTP transport.
    pub fn build_client(&self) -> Result<WxPayClient, ConfigError> {
        let http = default_http_client(self.timeout)?;
        let client = WxPayClient::with_transport(self.credentials()?, http)?
            .with_base_url(&self.base_url)?;
        Ok(client)
    }

    /// Notification handler, if an APIv3 key is configured.
    pub fn notification_handler(&self) -> Result<Option<NotificationHandler>, ConfigError> {
        let Some(key) = self.api_v3_key.clone() else {
            return Ok(None);
        };
        let verifier = Verifier::from_spki_pem(&self.platform_public_key_pem)?;
        Ok(Some(NotificationHandler::new(verifier, key)))
    }
}

fn pem_from<F>(var: &F, inline: &'static str, path: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(pem) = var(inline) {
        // Allow single-line env values with literal "\n"
        return Ok(pem.replace("\\n", "\n"));
    }
    match var(path) {
        Some(p) => std::fs::read_to_string(&p).map_err(|e| ConfigError::Io(p, e)),
        None => Err(ConfigError::MissingRequired(inline)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingRequired(&'static str),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("failed to read {0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error(transparent)]
    Client(#[from] WxPayError),
}
