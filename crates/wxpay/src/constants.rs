/// Production base URL of the v3 API. Request paths are resolved against it.
pub const DEFAULT_BASE_URL: &str = "https://api.mch.weixin.qq.com/v3/";

/// Sent as `User-Agent` on every request.
pub const USER_AGENT: &str = concat!("wxpay-rs/", env!("CARGO_PKG_VERSION"));

/// `Content-Type` and `Accept` for every request.
pub const MEDIA_TYPE: &str = "application/json";

/// Scheme name at the front of the `Authorization` header.
pub const AUTH_SCHEME: &str = "WECHATPAY2-SHA256-RSA2048";

// Header names are lowercase so they are valid `HeaderName::from_static` input;
// HTTP matches them case-insensitively (`Wechatpay-Timestamp` on the wire).

/// Response/notification header carrying the signing timestamp.
pub const HEADER_TIMESTAMP: &str = "wechatpay-timestamp";

/// Response/notification header carrying the signing nonce.
pub const HEADER_NONCE: &str = "wechatpay-nonce";

/// Response/notification header carrying the base64 signature.
pub const HEADER_SIGNATURE: &str = "wechatpay-signature";

/// Response/notification header naming the platform key serial.
pub const HEADER_SERIAL: &str = "wechatpay-serial";

/// Length of the request nonce in hex characters (the platform caps `nonce_str` at 32).
pub const NONCE_LEN: usize = 32;

/// Default HTTP timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Encryption algorithm the platform uses for notification resources.
pub const RESOURCE_ALGORITHM: &str = "AEAD_AES_256_GCM";
