//! Error types for the Research API client.

use thiserror::Error;

/// Errors produced while talking to the Research API.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// HTTP 429 or a quota error code in the response envelope. Carries the
    /// server's `Retry-After` hint when one was sent.
    #[error("rate limited by the API, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The access token was rejected or lacks the research scope. Fatal for
    /// the whole run, since every later request would fail the same way.
    #[error("authentication rejected (status {status}): {message}")]
    Auth { status: u16, message: String },

    /// The requested account does not exist or is not visible to the API.
    #[error("account '{username}' not found")]
    NotFound { username: String },

    /// HTTP 5xx; transient on the server side.
    #[error("server error {status} from {url}")]
    ServerError { status: u16, url: String },

    /// Network-level failure: connect error, timeout, broken transfer.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The envelope carried an error code this client does not map to a
    /// more specific variant.
    #[error("API error '{code}': {message}")]
    Api { code: String, message: String },

    /// The response body did not match the expected shape.
    #[error("failed to deserialize {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Any other HTTP status the client does not handle.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// Pagination ran past the configured page bound without terminating.
    #[error("pagination for '{username}' exceeded {max_pages} pages")]
    PaginationLimit { username: String, max_pages: usize },
}
