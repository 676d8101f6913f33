//! Error types for the API client

use thiserror::Error;

/// Errors that can occur while selecting or using a control-plane API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// The configured endpoint is not a valid URL
    #[error("Invalid API endpoint {endpoint}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The endpoint uses a scheme other than http or https
    #[error("API endpoint must be http or https, got scheme {0}")]
    UnsupportedScheme(String),

    /// A client set could not be constructed
    #[error("Could not create API client: {0}")]
    Construction(String),

    /// Network or HTTP communication error
    #[error("Network/HTTP error: {0}")]
    Network(String),

    /// The server answered with a non-success status
    #[error("Request to {url} failed: HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be decoded
    #[error("Could not decode response: {0}")]
    Decode(String),
}

/// Convenience type alias for Results using ApiError.
pub type Result<T> = std::result::Result<T, ApiError>;
