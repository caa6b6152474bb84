//! Error types for image generation and editing.

/// Errors that can occur while generating or editing an image.
#[derive(Debug, thiserror::Error)]
pub enum StudioError {
    /// API key missing or invalid.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code of the failed response.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response contained no usable image data.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Failed to read or decode an image file.
    #[error("failed to read image: {0}")]
    Read(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Fallback shown when a failure carries no message of its own.
pub const GENERIC_ERROR_MESSAGE: &str = "An unknown error occurred.";

impl StudioError {
    /// Returns the message to surface to the user, verbatim where the
    /// failure carries one and [`GENERIC_ERROR_MESSAGE`] otherwise.
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Auth(m)
            | Self::RateLimited(m)
            | Self::ContentBlocked(m)
            | Self::InvalidRequest(m)
            | Self::UnexpectedResponse(m)
            | Self::Read(m) => m.clone(),
            Self::Api { message, .. } => message.clone(),
            Self::Network(e) => e.to_string(),
            Self::Io(e) => e.to_string(),
            Self::Json(e) => e.to_string(),
        };

        if message.trim().is_empty() {
            GENERIC_ERROR_MESSAGE.to_string()
        } else {
            message
        }
    }
}

/// Result type alias for image generation operations.
pub type Result<T> = std::result::Result<T, StudioError>;
