//! Signed HTTP client for the WeChat Pay v3 API.
//!
//! Every outbound request carries an `Authorization` header holding an
//! RSA-SHA256 signature over a canonical string. Every response is checked
//! against the platform public key before its body is decoded.
//!
//! # Flow
//!
//! - **Build** ([`ApiClient::new_request`]): resolve path, encode JSON, sign
//! - **Execute** ([`ApiClient::execute`]): send, drain, verify, map status
//! - **Decode** ([`VerifiedResponse::json`] / [`VerifiedResponse::copy_to`])
//!
//! Encrypted fields (certificates, notification resources) are opened with
//! [`aead::decrypt`] under the merchant's APIv3 key.
//!
//! # Quick example
//!
//! ```no_run
//! use wxpay::{ApiClient, Credentials, WxPayClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), wxpay::WxPayError> {
//! let private_pem = std::fs::read_to_string("apiclient_key.pem").unwrap();
//! let platform_pem = std::fs::read_to_string("platform_pub.pem").unwrap();
//!
//! let credentials = Credentials::new(1900000109, "5157F09EFDC096DE15EBE81A47057A72", &private_pem, &platform_pem)?;
//! let client = WxPayClient::new(credentials)?;
//!
//! let request = client.request_without_body(reqwest::Method::GET, "certificates")?;
//! let certs: serde_json::Value = client.execute_json(request).await?;
//! println!("{certs}");
//! # Ok(())
//! # }
//! ```

// Wire format and crypto
pub mod aead;
pub mod canonical;
pub mod constants;
pub mod signer;
pub mod verifier;

// Client
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod query;
pub mod request;
pub mod response;
pub mod transport;

// Callbacks
pub mod notify;

pub use client::{ApiClient, WxPayClient};
pub use config::{ClientConfig, ConfigError};
pub use credentials::Credentials;
pub use error::{ErrorStage, WxPayError};
pub use notify::{EncryptedResource, Notification, NotificationHandler};
pub use query::{with_optional_query, with_query, QueryOptions};
pub use request::SignedRequest;
pub use response::{ErrorMessage, VerifiedResponse};
pub use signer::Signer;
pub use transport::{RawResponse, Transport};
pub use verifier::{SignatureHeaders, Verifier};

// Re-exported so callers can name methods and headers without a direct reqwest dependency
pub use reqwest::{header, Method, StatusCode};
