use thiserror::Error;

use crate::codes;
use crate::detail::ErrorDetail;

/// Error enum shared by the catalog crates
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Non-2xx response from the catalog backend
    #[error("{message}")]
    Server { status: u16, message: String },

    /// The request never produced a response
    #[error("Network error: {0}")]
    Network(String),

    /// Resource absent when (re-)fetched; carries the backend's message
    #[error("{0}")]
    NotFound(String),

    /// Input rejected before it reached the backend
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation the selected backend cannot perform
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Build an error from a non-2xx response body.
    ///
    /// The backend answers failures with `{"detail": "..."}`; a string detail is
    /// kept verbatim, anything else falls back to `fallback`.
    pub fn from_response(status: u16, body: &[u8], fallback: impl Into<String>) -> Self {
        let message = ErrorDetail::parse(body)
            .and_then(ErrorDetail::into_message)
            .unwrap_or_else(|| fallback.into());

        if status == 404 {
            Self::NotFound(message)
        } else {
            Self::Server { status, message }
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// HTTP status carried by the error, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Server { status, .. } => Some(*status),
            CatalogError::NotFound(_) => Some(404),
            _ => None,
        }
    }

    /// Stable code used in logs
    pub fn code(&self) -> &'static str {
        match self {
            CatalogError::Server { .. } => codes::backend::SERVER_ERROR,
            CatalogError::Network(_) => codes::backend::UNREACHABLE,
            CatalogError::NotFound(_) => codes::backend::NOT_FOUND,
            CatalogError::Validation(_) => codes::validation::INVALID_INPUT,
            CatalogError::Unsupported(_) => codes::backend::UNSUPPORTED,
            CatalogError::Config(_) => codes::config::INVALID,
            CatalogError::Serialization(_) => codes::validation::INVALID_FORMAT,
            CatalogError::Io(_) => codes::config::IO,
        }
    }

    /// Message shown to the operator in the banner.
    ///
    /// Backend details are surfaced verbatim; transport and decoding failures
    /// are replaced by the operation's own message.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            CatalogError::Server { message, .. } => message.clone(),
            CatalogError::Validation(message) | CatalogError::NotFound(message) => message.clone(),
            _ => fallback.to_string(),
        }
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::Network(err.to_string())
    }
}

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;
