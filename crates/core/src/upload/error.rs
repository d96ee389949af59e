//! Error types for provider uploads.

use thiserror::Error;

/// Errors returned by a provider API.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Connection, timeout or TLS failure.
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success status without a usable body.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The provider answered with an `errors` field.
    #[error("Upload rejected: {0}")]
    Rejected(String),

    /// The response could not be understood.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// HTTP client could not be built (bad proxy URL and similar).
    #[error("Client configuration error: {0}")]
    Client(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProviderError {
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Whether another submission attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Rejected(_) => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::MalformedResponse(_) | Self::Client(_) | Self::Io(_) => false,
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Self::Client(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
