use crate::source::SourceFeature;

/// Failure raised while constructing a unit value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitError {
    #[error("cannot construct a unit value from NaN")]
    NotANumber,

    #[error("unknown unit id '{0}'")]
    UnknownUnit(String),
}

/// Per-request / per-feature failure taxonomy for weather sources.
///
/// `Clone` so an instance can be stored in a wrapper's `failed_features`
/// map while the original is logged or re-raised. Transport errors are
/// stringified at the boundary for the same reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Required API key missing or empty after default-key fallback.
    /// Surfaced before any request is sent.
    #[error("API key is missing or empty for this source")]
    ApiKeyMissing,

    /// The source rejected or cannot resolve the given coordinates.
    #[error("location is outside this source's coverage area")]
    InvalidLocation,

    /// Payload parsed but lacks the minimum required series. Raised so the
    /// caller keeps previously cached data instead of overwriting it.
    #[error("source returned invalid or incomplete data")]
    InvalidOrIncompleteData,

    #[error("network error: {0}")]
    Network(String),

    #[error("failed to parse source response: {0}")]
    Parsing(String),

    /// Requesting a feature the source does not support at this location
    /// is a caller error, not a silent no-op.
    #[error("feature {0} is not supported by this source at this location")]
    UnsupportedFeature(SourceFeature),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parsing(err.to_string())
    }
}
