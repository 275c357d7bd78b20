use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EsewaApiError {
    #[error("Could not initialise the eSewa client. {0}")]
    Initialization(String),
    #[error("The eSewa gateway configuration is incomplete. {0}")]
    Configuration(String),
    #[error("Could not reach the eSewa gateway. {0}")]
    TransportError(String),
    #[error("eSewa status query returned HTTP {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not interpret the eSewa response body. {0}")]
    JsonError(String),
}

/// Failures while decoding the redirect callback payload. The callback arrives from an untrusted party, so every
/// variant here is expected adversarial traffic and must be recovered locally, never surfaced as a server error.
#[derive(Debug, Clone, Error)]
pub enum CallbackDecodeError {
    #[error("Callback data is not valid base64. {0}")]
    InvalidBase64(String),
    #[error("Callback data is not valid UTF-8. {0}")]
    InvalidUtf8(String),
    #[error("Callback data is not a valid eSewa result payload. {0}")]
    InvalidPayload(String),
}
