use thiserror::Error;

/// Errors returned by wxpay operations.
#[derive(Debug, Error)]
pub enum WxPayError {
    #[error("key parse error: {0}")]
    KeyParse(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("response signature missing: {0} header absent or empty")]
    SignatureMissing(&'static str),

    #[error("response signature is not valid base64: {0}")]
    SignatureDecode(String),

    #[error("response signature invalid")]
    SignatureInvalid,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("response sink error: {0}")]
    Sink(#[from] std::io::Error),

    #[error("api error: status {status}, code {code:?}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("decryption error: {0}")]
    Decryption(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Lifecycle step at which a [`WxPayError`] was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    Build,
    Sign,
    Transport,
    Verify,
    Api,
    Decode,
    Decrypt,
}

impl WxPayError {
    pub fn stage(&self) -> ErrorStage {
        match self {
            WxPayError::InvalidUrl(_) | WxPayError::Serialization(_) => ErrorStage::Build,
            WxPayError::KeyParse(_) | WxPayError::Signing(_) => ErrorStage::Sign,
            WxPayError::Transport(_) => ErrorStage::Transport,
            WxPayError::SignatureMissing(_)
            | WxPayError::SignatureDecode(_)
            | WxPayError::SignatureInvalid => ErrorStage::Verify,
            WxPayError::Api { .. } => ErrorStage::Api,
            WxPayError::Decode(_) | WxPayError::Sink(_) => ErrorStage::Decode,
            WxPayError::Decryption(_) => ErrorStage::Decrypt,
        }
    }

    /// True when the response could not be authenticated and must not be trusted.
    pub fn is_authentication_failure(&self) -> bool {
        self.stage() == ErrorStage::Verify
    }

    /// True when re-issuing the request (with a fresh nonce and timestamp) may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            WxPayError::Transport(_) => true,
            WxPayError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
