use thiserror::Error;

/// Failures of a single provider call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// Transport failure or an unexpected HTTP status.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// The provider answered 404, e.g. no city matches the query.
    #[error("not found: {0}")]
    NotFound(String),

    /// The payload was malformed or missing fields the dashboard needs.
    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("geolocation is not supported")]
    Unsupported,

    #[error("geolocation denied: {0}")]
    Denied(String),
}
