use thiserror::Error;

/// Every way a single address lookup can fail. The client never retries;
/// callers decide what a failure means for the row.
#[derive(Debug, Error)]
pub enum GeocodeFailure {
    #[error("address could not be resolved: {0}")]
    NotFound(String),
    #[error("geocoding quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("rate limited by provider: {0}")]
    RateLimited(String),
    #[error("API key rejected: {0}")]
    InvalidKey(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected provider response: {0}")]
    UnexpectedResponse(String),
}
