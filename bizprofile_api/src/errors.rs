//! Error types for the API client.

/// Errors that can occur when talking to the CRM proxy.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unreadable body).
    #[error("Request failed")]
    RequestFailed,
    /// The proxy returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The proxy answered 2xx but flagged the call as unsuccessful.
    #[error("Proxy reported failure: {0}")]
    Unsuccessful(String),
    /// The response body could not be decoded.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// The base URL plus path did not form a valid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}
