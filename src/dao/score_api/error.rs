//! Error types of the HTTP score client.

use reqwest::StatusCode;
use thiserror::Error;

/// Convenient result alias returning [`ScoreApiError`] failures.
pub type ScoreApiResult<T> = Result<T, ScoreApiError>;

/// Failures that can occur while talking to the score service.
#[derive(Debug, Error)]
pub enum ScoreApiError {
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[error("failed to build score API client")]
    ClientBuilder {
        /// Underlying failure.
        #[source]
        source: reqwest::Error,
    },
    /// The request could not be sent or the connection dropped.
    #[error("failed to send score request to `{url}`")]
    RequestSend {
        /// Endpoint the request was sent to.
        url: String,
        /// Underlying failure.
        #[source]
        source: reqwest::Error,
    },
    /// The service answered with a non-success status code.
    #[error("unexpected score API response status {status} for `{url}`")]
    RequestStatus {
        /// Endpoint the request was sent to.
        url: String,
        /// Status returned by the service.
        status: StatusCode,
    },
    /// Response payload could not be parsed into the expected JSON.
    #[error("failed to decode score API response from `{url}`")]
    DecodeResponse {
        /// Endpoint the response came from.
        url: String,
        /// Underlying failure.
        #[source]
        source: reqwest::Error,
    },
}
