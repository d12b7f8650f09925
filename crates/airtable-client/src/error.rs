//! Error type for Airtable API calls.

/// Failure of a single API call.
///
/// Every variant is transient from the reader's point of view: the caller
/// decides whether to retry. The client itself never retries.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The bearer token cannot be used as a header value
    #[error("API token contains characters that are not valid in an HTTP header")]
    InvalidToken,

    /// Base URL or path segments do not form a valid URL
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connection, timeout or other transport-level failure
    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("Request to {url} returned HTTP {status}: {body}")]
    Status { url: String, status: u16, body: String },

    /// The response body was not the expected JSON
    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}
