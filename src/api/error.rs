use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Rate limit exceeded: {0}")]
    RateLimitError(String),

    #[error("Invalid API response: {0}")]
    ParseError(String),

    #[error("RPC error: {code} - {message}")]
    RpcError { code: i64, message: String },

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::ParseError(err.to_string())
    }
}

impl From<aes_gcm::Error> for ApiError {
    fn from(err: aes_gcm::Error) -> Self {
        ApiError::EncryptionError(err.to_string())
    }
}
